//! # Search — Largest Provable Target for One N
//!
//! Drives the engine toward the largest t it can prove for a given N:
//!
//! 1. **Anchor**: start at t = ⌈aN/b⌉ and, should the engine fall short,
//!    step t downward (the heuristic below, clamped) until a bound is
//!    proved. Rarely more than one step.
//! 2. **Bisection** over [t_min, t_max), t_max starting at ⌊2N/5⌋ + 1. The
//!    next probe extrapolates from the last run: t·exp((count − N)·ln t/N),
//!    clamped strictly inside the bracket — the count deficit is roughly
//!    linear in ln t, so this converges in a handful of probes.
//! 3. Optional **exhaustive sweep**: the feasibility variant (an upper
//!    bound on any continuation) brackets the largest t that could possibly
//!    work; every t in the remaining window is then tried for real, split
//!    across worker threads by residue class. One mutex guards the best
//!    proved (t, count); a worker skips values at or below it. The result
//!    is the maximum over all successes and does not depend on the worker
//!    count.
//!
//! Tables are shared read-only across workers; each run owns its exponent
//! vector, so the only synchronization anywhere is the best-known bound.

use crate::ceil_div;
use crate::engine::{tfac, Config, DomainError, Variant};
use crate::tables::Tables;
use anyhow::{bail, Result};
use serde::Serialize;
use std::sync::Mutex;
use tracing::{debug, info};

/// Largest proved target for one N, with the engine's count at that target.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct SearchOutcome {
    pub n: u64,
    pub t: u64,
    pub count: u64,
}

impl SearchOutcome {
    #[inline]
    pub fn surplus(&self) -> i64 {
        self.count as i64 - self.n as i64
    }
}

/// Reject a target ratio a/b outside [1/4, 2/5].
pub fn validate_ratio(a: u64, b: u64) -> Result<()> {
    if a < 1 || b < 1 {
        return Err(DomainError::err("ratio terms must be positive".into()));
    }
    if !(b <= 4 * a && 5 * a <= 2 * b) {
        return Err(DomainError::err(format!(
            "ratio {}/{} is outside [1/4, 2/5]",
            a, b
        )));
    }
    Ok(())
}

/// Extrapolate the next probe from the last (t, count) pair.
fn next_probe(t: u64, count: u64, n: u64) -> u64 {
    let tf = t as f64;
    let scaled = ((count as f64 - n as f64) * tf.ln() / n as f64).exp();
    (tf * scaled) as u64
}

/// Find the largest t the engine proves for N, starting from the ratio
/// anchor ⌈aN/b⌉. `threads = 0` uses one worker per logical core for the
/// exhaustive sweep.
pub fn largest_t(
    tables: &Tables,
    n: u64,
    a: u64,
    b: u64,
    cfg: &Config,
    exhaustive: bool,
    threads: usize,
) -> Result<SearchOutcome> {
    validate_ratio(a, b)?;
    let probe_cfg = Config { record: false, ..*cfg };
    let floor_t = n / 4 + 1;

    let mut t = ceil_div(a * n, b).max(floor_t);
    let mut count = tfac(tables, n, t, &probe_cfg)?.count;
    while count < n {
        if t == floor_t {
            bail!("no target above N/4 is provable for N = {}", n);
        }
        t = next_probe(t, count, n).clamp(floor_t, t - 1);
        count = tfac(tables, n, t, &probe_cfg)?.count;
    }

    let mut t_min = t;
    let mut c_min = count;
    let mut t_max = 2 * n / 5 + 1;
    let (mut lt, mut lc) = (t_min, c_min);
    while t_max - t_min > 1 {
        let guess = next_probe(lt, lc, n).clamp(t_min + 1, t_max - 1);
        let c = tfac(tables, n, guess, &probe_cfg)?.count;
        debug!(n, t = guess, count = c, "bisection probe");
        lt = guess;
        lc = c;
        if c >= n {
            t_min = guess;
            c_min = c;
        } else {
            t_max = guess;
        }
    }

    if exhaustive {
        // Feasibility brackets everything any continuation could reach.
        let feas_cfg = Config {
            variant: Variant::Feasible,
            record: false,
            ..*cfg
        };
        let mut lo = t_min;
        let mut hi = 2 * n / 5 + 1;
        while hi - lo > 1 {
            let mid = lo + (hi - lo) / 2;
            if tfac(tables, n, mid, &feas_cfg)?.count >= n {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        let t_feas = lo;

        if t_feas > t_min {
            let best = Mutex::new((t_min, c_min));
            let workers = if threads == 0 {
                rayon::current_num_threads().max(1) as u64
            } else {
                threads as u64
            };
            std::thread::scope(|scope| {
                for w in 0..workers {
                    let best = &best;
                    let probe_cfg = &probe_cfg;
                    scope.spawn(move || {
                        let mut t = t_min + 1 + w;
                        while t <= t_feas {
                            let skip = t <= best.lock().unwrap().0;
                            if !skip {
                                let c = tfac(tables, n, t, probe_cfg)
                                    .expect("engine run failed during exhaustive sweep")
                                    .count;
                                if c >= n {
                                    let mut b = best.lock().unwrap();
                                    if t > b.0 {
                                        *b = (t, c);
                                        info!(n, t, "exhaustive sweep improved the bound");
                                    }
                                }
                            }
                            t += workers;
                        }
                    });
                }
            });
            (t_min, c_min) = best.into_inner().unwrap();
        }
    }

    info!(n, t = t_min, count = c_min, "largest provable target");
    Ok(SearchOutcome {
        n,
        t: t_min,
        count: c_min,
    })
}
