//! # Verify — Independent Replay of a Factorization Log
//!
//! A successful engine run is a mathematical claim: a multiset of `count`
//! integers, each ≥ t, whose product divides N!. The verifier re-derives
//! that claim from the descriptor log alone — fresh exponent vector, its
//! own prime counting, no access to engine state:
//!
//! - every descriptor's cofactor record must be well-formed (strictly
//!   descending indices, positive exponents) and multiply back to its m;
//! - the claimed number of primes in (p, q] must match an independent
//!   π(q) − π(p);
//! - large-prime descriptors (q at or above the run's threshold s) must
//!   carry the exact valuation ⌊N/p′⌋ (+ ⌊N/p′²⌋ below √N) and the minimal
//!   viable cofactor, checked at the interval's conservative end p + 1;
//! - every factor must be ≥ t, again judged at p + 1;
//! - replaying all charges against the fresh exponent vector must never
//!   drive any entry negative, and the descriptor total must equal the
//!   header count.
//!
//! Any violation is reported as an error naming the offending descriptor.

use crate::engine::{legendre, small_prime_bound};
use crate::factors::FactorLog;
use crate::sieve::{self, PrimePi};
use crate::tables::Tables;
use anyhow::{bail, ensure, Result};

/// Replay `log` and check every claim it makes. Returns the reconstructed
/// factor count on success.
pub fn verify(tables: &Tables, log: &FactorLog) -> Result<u64> {
    let (n, t) = (log.n, log.t);
    let s = small_prime_bound(t);
    let sqrt_n = sieve::isqrt(n);
    let imax = tables.pi_small(s - 1) as usize;

    let mut e = vec![0i64; imax + 1];
    for (i, entry) in e.iter_mut().enumerate().skip(1) {
        *entry = legendre(n, tables.prime(i as u32)) as i64;
    }

    let mut pix = PrimePi::new();
    let mut pi = |x: u64| -> u64 {
        if x <= tables.p_max() {
            tables.pi_small(x)
        } else {
            pix.eval(x)
        }
    };

    let mut total: u64 = 0;
    for (k, d) in log.descriptors.iter().enumerate() {
        ensure!(d.c >= 1 && d.reps >= 1, "descriptor {}: empty batch", k);
        ensure!(d.p < d.q, "descriptor {}: interval ({}, {}] is empty", k, d.p, d.q);

        // Record shape and value.
        let mut prev_pi = u32::MAX;
        for pp in &d.f {
            ensure!(
                pp.pi() != 0 && (pp.pi() as usize) <= imax,
                "descriptor {}: prime index {} out of range",
                k,
                pp.pi()
            );
            ensure!(
                pp.pi() < prev_pi,
                "descriptor {}: record not strictly descending",
                k
            );
            ensure!(pp.e() >= 1, "descriptor {}: zero exponent", k);
            prev_pi = pp.pi();
        }
        let value = tables.record_value(&d.f);
        ensure!(
            value == d.m,
            "descriptor {}: record multiplies to {} but claims m = {}",
            k,
            value,
            d.m
        );

        // Interval population.
        let c = pi(d.q) - pi(d.p);
        ensure!(
            c == d.c,
            "descriptor {}: interval ({}, {}] holds {} primes, not {}",
            k,
            d.p,
            d.q,
            c,
            d.c
        );

        // Factor magnitude at the conservative end of the interval.
        let lo = d.p + 1;
        ensure!(
            d.m * lo >= t,
            "descriptor {}: factor {}·{} falls below t = {}",
            k,
            d.m,
            lo,
            t
        );

        if d.q >= s {
            // Large-prime batch: full valuation with the minimal cofactor.
            let expect = if d.q <= sqrt_n {
                n / lo + n / (lo * lo)
            } else {
                ensure!(
                    n / lo == n / d.q,
                    "descriptor {}: valuation varies across ({}, {}]",
                    k,
                    d.p,
                    d.q
                );
                n / lo
            };
            ensure!(
                d.reps == expect,
                "descriptor {}: claims {} repetitions, valuation gives {}",
                k,
                d.reps,
                expect
            );
        } else {
            // Small-prime factor: the prime itself is tracked, so charge it.
            ensure!(
                d.c == 1,
                "descriptor {}: small-prime batch must cover one prime",
                k
            );
            let qi = tables.pi_small(d.q) as usize;
            ensure!(qi >= 1 && qi <= imax, "descriptor {}: prime {} untracked", k, d.q);
            e[qi] -= (d.reps * d.c) as i64;
            if e[qi] < 0 {
                bail!(
                    "descriptor {}: prime {} overdrawn during replay",
                    k,
                    d.q
                );
            }
        }

        // Cofactor charges.
        let batch = d.reps * d.c;
        for pp in &d.f {
            let idx = pp.pi() as usize;
            e[idx] -= (batch * pp.e()) as i64;
            if e[idx] < 0 {
                bail!(
                    "descriptor {}: prime {} overdrawn during replay",
                    k,
                    tables.prime(pp.pi())
                );
            }
        }

        total += batch;
    }

    ensure!(
        total == log.count,
        "descriptors sum to {} factors but the log claims {}",
        total,
        log.count
    );
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{build_tables, tfac, Config, Variant};
    use crate::factors::Descriptor;
    use crate::tables::Pp;

    fn logged(n: u64, t: u64, variant: Variant) -> (Tables, FactorLog) {
        let tables = build_tables(n, t, variant).unwrap();
        let cfg = Config {
            variant,
            record: true,
            ..Config::default()
        };
        let out = tfac(&tables, n, t, &cfg).unwrap();
        (tables, out.log.unwrap())
    }

    #[test]
    fn engine_output_replays_cleanly_standard() {
        for (n, t) in [(100u64, 28u64), (1000, 300), (5000, 1400), (20_000, 5500)] {
            let (tables, log) = logged(n, t, Variant::Standard);
            let total = verify(&tables, &log).expect("verification failed");
            assert_eq!(total, log.count);
        }
    }

    #[test]
    fn engine_output_replays_cleanly_fast() {
        for (n, t) in [(100u64, 28u64), (1000, 300), (5000, 1400), (20_000, 5500)] {
            let (tables, log) = logged(n, t, Variant::Fast);
            let total = verify(&tables, &log).expect("verification failed");
            assert_eq!(total, log.count);
        }
    }

    #[test]
    fn tampered_count_is_rejected() {
        let (tables, mut log) = logged(1000, 300, Variant::Fast);
        log.count += 1;
        assert!(verify(&tables, &log).is_err());
    }

    #[test]
    fn tampered_interval_is_rejected() {
        let (tables, mut log) = logged(1000, 300, Variant::Fast);
        // Claim one more prime than the interval holds somewhere.
        let d = log.descriptors.last_mut().unwrap();
        d.c += 1;
        assert!(verify(&tables, &log).is_err());
    }

    #[test]
    fn undersized_factor_is_rejected() {
        let (tables, mut log) = logged(1000, 300, Variant::Fast);
        log.descriptors.push(Descriptor {
            reps: 1,
            m: 1,
            f: vec![],
            p: 100,
            q: 101,
            c: 1,
        });
        let err = verify(&tables, &log).unwrap_err().to_string();
        assert!(err.contains("below t"), "unexpected error: {}", err);
    }

    #[test]
    fn malformed_record_is_rejected() {
        let (tables, mut log) = logged(1000, 300, Variant::Fast);
        // Ascending indices violate the descending invariant.
        log.descriptors[0] = Descriptor {
            reps: 1,
            m: 6,
            f: vec![Pp::new(1, 1), Pp::new(2, 1)],
            p: 400,
            q: 401,
            c: 1,
        };
        assert!(verify(&tables, &log).is_err());
    }

    #[test]
    fn overdraw_is_rejected() {
        let (tables, mut log) = logged(1000, 300, Variant::Fast);
        // Duplicate the whole log: charging everything twice must overdraw.
        let copy = log.descriptors.clone();
        log.descriptors.extend(copy);
        log.count *= 2;
        let err = verify(&tables, &log).unwrap_err().to_string();
        assert!(err.contains("overdrawn"), "unexpected error: {}", err);
    }
}
