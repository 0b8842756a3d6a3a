//! # CLI — Run Functions Behind the Command Line
//!
//! Argument interpretation and dispatch: single-(N, t) proofs, single-N
//! searches, and range batches that produce or consume hint files. Results
//! print to stdout (plain or `--json`); progress and diagnostics go to the
//! tracing subscriber on stderr.

use anyhow::{Context, Result};
use egs::engine::{self, Config, DomainError, Variant};
use egs::{hints, search, verify};
use std::fs::File;
use std::io::BufWriter;

use crate::Cli;

enum NSpec {
    Single(u64),
    Range(u64, u64),
}

fn parse_n(text: &str) -> Result<NSpec> {
    if let Some((lo, hi)) = text.split_once("..") {
        let lo: u64 = lo
            .trim()
            .parse()
            .map_err(|_| DomainError::err(format!("range start {:?} is not a number", lo)))?;
        let hi: u64 = hi
            .trim()
            .parse()
            .map_err(|_| DomainError::err(format!("range end {:?} is not a number", hi)))?;
        if lo > hi {
            return Err(DomainError::err(format!("empty range {}..{}", lo, hi)));
        }
        Ok(NSpec::Range(lo, hi))
    } else {
        let n: u64 = text
            .trim()
            .parse()
            .map_err(|_| DomainError::err(format!("N {:?} is not a number", text)))?;
        Ok(NSpec::Single(n))
    }
}

fn parse_ratio(text: &str) -> Result<(u64, u64)> {
    let (a, b) = text
        .split_once('/')
        .ok_or_else(|| DomainError::err(format!("ratio {:?} is not of the form A/B", text)))?;
    let a: u64 = a
        .trim()
        .parse()
        .map_err(|_| DomainError::err(format!("ratio numerator {:?} is not a number", a)))?;
    let b: u64 = b
        .trim()
        .parse()
        .map_err(|_| DomainError::err(format!("ratio denominator {:?} is not a number", b)))?;
    search::validate_ratio(a, b)?;
    Ok((a, b))
}

pub fn run(cli: &Cli) -> Result<()> {
    engine::validate_cutoff(cli.cutoff)?;
    let (a, b) = parse_ratio(&cli.ratio)?;
    let variant = if cli.fast {
        Variant::Fast
    } else {
        Variant::Standard
    };
    let cfg = Config {
        variant,
        cutoff: cli.cutoff,
        record: cli.verify || cli.dump.is_some(),
    };

    match parse_n(&cli.n)? {
        NSpec::Single(n) => run_single(cli, n, a, b, &cfg),
        NSpec::Range(lo, hi) => run_range(cli, lo, hi, a, b, &cfg),
    }
}

fn run_single(cli: &Cli, n: u64, a: u64, b: u64, cfg: &Config) -> Result<()> {
    if let Some(t) = cli.t {
        let tables = engine::build_tables(n, t, cfg.variant)?;
        let out = engine::tfac(&tables, n, t, cfg)?;
        if out.proved() {
            println!("t({}) >= {} proved: {} factors (surplus {})", n, t, out.count, out.surplus());
        } else {
            println!(
                "failed to prove t({}) >= {}: {} factors (deficit {})",
                n,
                t,
                out.count,
                -out.surplus()
            );
        }
        if let Some(log) = &out.log {
            if cli.verify {
                let replayed = verify::verify(&tables, log).context("log verification failed")?;
                println!("verification passed: {} factors replayed", replayed);
            }
            if let Some(path) = &cli.dump {
                let file = File::create(path)
                    .with_context(|| format!("creating dump file {}", path.display()))?;
                log.write_dump(BufWriter::new(file))
                    .with_context(|| format!("writing dump file {}", path.display()))?;
                println!("dump written to {}", path.display());
            }
        }
        if cli.json {
            println!(
                "{}",
                serde_json::json!({
                    "n": n, "t": t, "count": out.count,
                    "surplus": out.surplus(), "proved": out.proved(),
                })
            );
        }
        Ok(())
    } else {
        if cli.verify || cli.dump.is_some() {
            return Err(DomainError::err(
                "--verify and --dump need an explicit t".into(),
            ));
        }
        let tables = engine::build_tables(n, 2 * n / 5, cfg.variant)?;
        let out = search::largest_t(&tables, n, a, b, cfg, cli.exhaustive, cli.threads)?;
        println!(
            "t({}) >= {} is the largest proved bound ({} factors, surplus {})",
            n,
            out.t,
            out.count,
            out.surplus()
        );
        if cli.json {
            println!("{}", serde_json::to_string(&out).expect("search outcome serializes"));
        }
        Ok(())
    }
}

fn run_range(cli: &Cli, lo: u64, hi: u64, a: u64, b: u64, cfg: &Config) -> Result<()> {
    if cli.t.is_some() {
        return Err(DomainError::err(
            "an explicit t only applies to a single N, not a range".into(),
        ));
    }
    if cli.verify || cli.dump.is_some() {
        return Err(DomainError::err(
            "--verify and --dump apply to single runs, not ranges".into(),
        ));
    }

    if let Some(path) = &cli.hints {
        let chain = hints::read_hints(path)?;
        hints::batch_consume(&chain, lo, hi, a, b, cfg)?;
        println!(
            "hint file {} verified: {} records cover N in [{}, {}]",
            path.display(),
            chain.len(),
            lo,
            hi
        );
        return Ok(());
    }

    let chain = hints::batch_produce(lo, hi, a, b, cfg, cli.exhaustive, cli.threads)?;
    println!(
        "range [{}, {}] proved at ratio {}/{} with {} records",
        lo, hi, a, b,
        chain.len()
    );
    if cli.json {
        for h in &chain {
            println!("{}", serde_json::json!({ "n": h.n, "t": h.t }));
        }
    }
    if let Some(path) = &cli.create_hints {
        hints::write_hints(path, &chain)?;
        println!("hint file written to {}", path.display());
    }
    Ok(())
}
