//! # Hints — Batch Runs Across Ranges of N
//!
//! One proved pair (N, t) covers more than one N: t(·) is non-decreasing
//! (multiplying one more factor N+1 > t into a valid decomposition keeps it
//! valid), so t(N′) ≥ t ≥ ⌈aN′/b⌉ holds for every N′ in [N, ⌊b·t/a⌋]. A
//! batch run therefore only searches at the start of each covered stretch
//! and records the pairs it used — the *hint file*:
//!
//! ```text
//! N:t
//! ```
//!
//! one record per line, N strictly increasing. A later run consumes the
//! file instead of searching: it checks the chain (ratio satisfied at each
//! record, next record starting at or before ⌊b·t/a⌋ + 1, the requested
//! range covered) and then re-proves every record with the engine. Any
//! gap, regression, or under-coverage rejects the whole file — a usable
//! prefix is deliberately not salvaged.

use crate::engine::{build_tables, tfac, Config};
use crate::search::{self, SearchOutcome};
use anyhow::{bail, ensure, Context, Result};
use rayon::prelude::*;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use tracing::info;

/// One hint-file record: t(N) ≥ t has been proved.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Hint {
    pub n: u64,
    pub t: u64,
}

/// Parse the `N:t` line grammar.
pub fn parse(text: &str) -> Result<Vec<Hint>> {
    let mut hints = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (n, t) = line
            .split_once(':')
            .with_context(|| format!("hint line {}: expected N:t, got {:?}", idx + 1, line))?;
        let n: u64 = n
            .trim()
            .parse()
            .with_context(|| format!("hint line {}: bad N", idx + 1))?;
        let t: u64 = t
            .trim()
            .parse()
            .with_context(|| format!("hint line {}: bad t", idx + 1))?;
        hints.push(Hint { n, t });
    }
    Ok(hints)
}

pub fn read_hints(path: &Path) -> Result<Vec<Hint>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading hint file {}", path.display()))?;
    parse(&text)
}

pub fn write_hints(path: &Path, hints: &[Hint]) -> Result<()> {
    let mut out = String::new();
    for h in hints {
        writeln!(out, "{}:{}", h.n, h.t).expect("string write cannot fail");
    }
    fs::write(path, out).with_context(|| format!("writing hint file {}", path.display()))?;
    Ok(())
}

/// Check the whole chain against the range [lo, hi] and ratio a/b. Every
/// violation is fatal: the batch refuses partial credit.
pub fn validate_chain(hints: &[Hint], lo: u64, hi: u64, a: u64, b: u64) -> Result<()> {
    ensure!(!hints.is_empty(), "hint file is empty");
    ensure!(
        hints[0].n <= lo,
        "first hint starts at N = {} but the range starts at {}",
        hints[0].n,
        lo
    );
    let mut prev: Option<Hint> = None;
    for h in hints {
        ensure!(
            b * h.t >= a * h.n,
            "hint {}:{} does not reach the ratio {}/{}",
            h.n,
            h.t,
            a,
            b
        );
        if let Some(p) = prev {
            ensure!(
                h.n > p.n,
                "hint N values must be strictly increasing ({} after {})",
                h.n,
                p.n
            );
            let max_v = b * p.t / a;
            ensure!(
                h.n <= max_v + 1,
                "gap in the proved range: hint {}:{} leaves ({}, {}) uncovered",
                h.n,
                h.t,
                max_v,
                h.n
            );
        }
        prev = Some(*h);
    }
    let last = hints.last().unwrap();
    let reach = b * last.t / a;
    ensure!(
        reach >= hi,
        "hints cover N up to {} but the range ends at {}",
        reach,
        hi
    );
    Ok(())
}

/// Search every stretch of [lo, hi] and return the covering hint chain.
/// Each proved (N, t) lets the batch skip ahead to ⌊b·t/a⌋ + 1.
pub fn batch_produce(
    lo: u64,
    hi: u64,
    a: u64,
    b: u64,
    cfg: &Config,
    exhaustive: bool,
    threads: usize,
) -> Result<Vec<Hint>> {
    search::validate_ratio(a, b)?;
    ensure!(lo <= hi, "empty batch range [{}, {}]", lo, hi);
    let tables = build_tables(hi, 2 * hi / 5, cfg.variant)?;
    let mut hints = Vec::new();
    let mut n = lo;
    while n <= hi {
        let out: SearchOutcome = search::largest_t(&tables, n, a, b, cfg, exhaustive, threads)?;
        ensure!(
            b * out.t >= a * n,
            "ratio {}/{} is not provable at N = {} (best t = {})",
            a,
            b,
            n,
            out.t
        );
        info!(n, t = out.t, covers = b * out.t / a, "batch stretch proved");
        hints.push(Hint { n, t: out.t });
        n = b * out.t / a + 1;
    }
    Ok(hints)
}

/// Re-prove a hint chain over [lo, hi]: validate the chain shape, then run
/// the engine on every record. Records are independent, so they verify in
/// parallel.
pub fn batch_consume(
    hints: &[Hint],
    lo: u64,
    hi: u64,
    a: u64,
    b: u64,
    cfg: &Config,
) -> Result<()> {
    search::validate_ratio(a, b)?;
    validate_chain(hints, lo, hi, a, b)?;
    let n_top = hints.last().unwrap().n;
    let t_top = hints.iter().map(|h| h.t).max().unwrap();
    let tables = build_tables(n_top, t_top, cfg.variant)?;
    let run_cfg = Config {
        record: false,
        ..*cfg
    };
    hints.par_iter().try_for_each(|h| {
        let out = tfac(&tables, h.n, h.t, &run_cfg)?;
        if !out.proved() {
            bail!(
                "hint {}:{} failed verification (deficit {})",
                h.n,
                h.t,
                -out.surplus()
            );
        }
        Ok(())
    })?;
    info!(records = hints.len(), lo, hi, "hint chain verified");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Variant;

    #[test]
    fn parse_accepts_the_line_grammar() {
        let hints = parse("100:34\n200:67\n\n300:101\n").unwrap();
        assert_eq!(
            hints,
            vec![
                Hint { n: 100, t: 34 },
                Hint { n: 200, t: 67 },
                Hint { n: 300, t: 101 }
            ]
        );
    }

    #[test]
    fn parse_rejects_malformed_lines() {
        assert!(parse("100 34").is_err());
        assert!(parse("100:abc").is_err());
        assert!(parse(":12").is_err());
    }

    #[test]
    fn hint_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bounds.hints");
        let hints = vec![Hint { n: 100, t: 34 }, Hint { n: 103, t: 35 }];
        write_hints(&path, &hints).unwrap();
        assert_eq!(read_hints(&path).unwrap(), hints);
    }

    #[test]
    fn chain_validation_catches_every_defect() {
        let a = 1;
        let b = 3;
        // Well-formed: 100:34 covers up to 102, next starts at 103.
        let good = vec![Hint { n: 100, t: 34 }, Hint { n: 103, t: 35 }];
        assert!(validate_chain(&good, 100, 105, a, b).is_ok());

        // Gap: second record starts past ⌊b·t/a⌋ + 1 = 103.
        let gap = vec![Hint { n: 100, t: 34 }, Hint { n: 104, t: 35 }];
        assert!(validate_chain(&gap, 100, 105, a, b).is_err());

        // Regression in N.
        let reg = vec![Hint { n: 100, t: 34 }, Hint { n: 100, t: 35 }];
        assert!(validate_chain(&reg, 100, 102, a, b).is_err());

        // Ratio not reached: 3·33 < 100.
        let weak = vec![Hint { n: 100, t: 33 }];
        assert!(validate_chain(&weak, 100, 100, a, b).is_err());

        // Under-coverage of the requested range.
        assert!(validate_chain(&good, 100, 200, a, b).is_err());

        // Range starting before the first record.
        assert!(validate_chain(&good, 90, 105, a, b).is_err());
    }

    #[test]
    fn produced_chain_validates_and_consumes() {
        let cfg = Config {
            variant: Variant::Fast,
            ..Config::default()
        };
        // The 1/3 ratio only becomes provable at large N; 1/4 holds
        // throughout this range and keeps the batch moving.
        let (lo, hi) = (200u64, 2000u64);
        let hints = batch_produce(lo, hi, 1, 4, &cfg, false, 1).unwrap();
        assert!(!hints.is_empty());
        assert!(
            hints.windows(2).all(|w| w[0].n < w[1].n),
            "produced chain must be strictly increasing"
        );
        validate_chain(&hints, lo, hi, 1, 4).expect("produced chain must validate");
        batch_consume(&hints, lo, hi, 1, 4, &cfg).expect("produced chain must re-verify");
    }
}
