//! # Engine — Greedy Factor Allocation for N!
//!
//! Given N and a target t with N/4 < t < N/2, the engine allocates as many
//! factors of N! as it can, each ≥ t, and reports the total. A count ≥ N
//! proves t(N) ≥ t, where t(N) is the Erdős–Guy–Selfridge threshold: the
//! largest t such that N! splits into N factors all ≥ t.
//!
//! ## Algorithm
//!
//! The run owns an exponent vector E with E[i] = v_{p_i}(N!) for every prime
//! below s, the least integer with s(s−1) ≥ t. Factors are built as m·p:
//! one prime p ≥ s and a smooth cofactor m < s drawn from E.
//!
//! 1. **Large-prime phase** (here): every prime p in [s, N] is used in
//!    v_p(N!) = ⌊N/p⌋ + ⌊N/p²⌋ factors with the minimal cofactor ⌈t/p⌉.
//!    Three regimes keep this cheap: primes up to √N are enumerated one by
//!    one (the valuation changes every step); beyond √N primes are still
//!    enumerated but batched over runs of constant (m, ⌊N/p⌋); once the
//!    cofactor drops to the configured cutoff, iteration flips to cofactor
//!    values and prime *counting* — two π evaluations per breakpoint replace
//!    enumeration entirely. Primes in [t, N] need no cofactor and reduce to
//!    six π evaluations.
//! 2. **Small-prime phase** (`standard` / `fast` modules): whatever E still
//!    holds is assembled into further factors ≥ t.
//!
//! The cutoff exponent μ only moves work between enumeration and counting;
//! the allocated factors, and therefore the reported count, are identical
//! for any μ in [0.2, 0.3].
//!
//! ## Feasibility mode
//!
//! Skips the small-prime phase and instead over-approximates anything a
//! continuation could build: ⌊Σ E[i]·log p_i / log(t−1)⌋ more factors,
//! computed in high precision with epsilons biased so the result is a true
//! upper bound. Used by the search driver to prune.
//!
//! ## References
//!
//! - Erdős, Guy & Selfridge, "Another property of 239 and some related
//!   questions", Congressus Numerantium (1971).
//! - Guy & Selfridge, "Factoring factorial n", American Mathematical
//!   Monthly 105 (1998), 766–767.
//! - Tao, "Decomposing a factorial into large factors", arXiv:2503.20170.
//! - OEIS [A034258](https://oeis.org/A034258), [A034259](https://oeis.org/A034259).

use crate::factors::{Descriptor, FactorLog};
use crate::sieve::{self, PrimeIter, PrimePi};
use crate::tables::{Pp, Tables};
use crate::{ceil_div, fast, standard};
use anyhow::{bail, ensure, Result};
use tracing::debug;

/// Cutoff exponent μ: accepted range and default. The default is tuned to
/// balance prime enumeration against prime counting.
pub const CUTOFF_MIN: f64 = 0.2;
pub const CUTOFF_MAX: f64 = 0.3;
pub const CUTOFF_DEFAULT: f64 = 0.225;

/// Hard cap on the smooth-cofactor table. The standard greedy needs
/// cofactors up to ⌈t/2⌉ and refuses to run past this; the fast greedy
/// clamps its (much smaller) table and compensates in its composite pass.
pub const MAX_COFACTOR_TABLE: u64 = 1 << 24;

/// Largest supported N (exclusive).
pub const MAX_N: u64 = 1 << 48;

/// Which algorithm closes out the run after the large-prime phase.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Variant {
    /// Walks prime indices downward with one ascending cofactor pointer.
    Standard,
    /// Adds p² factors, cofactor rescans, and a composite assembly pass;
    /// the only variant that scales to N near 2^48.
    Fast,
    /// No small-prime phase; returns count plus a proven upper bound on any
    /// continuation. For search pruning only.
    Feasible,
}

/// Per-run engine configuration.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    pub variant: Variant,
    /// Cutoff exponent μ ∈ [0.2, 0.3]; performance knob only.
    pub cutoff: f64,
    /// Record a replayable factorization log.
    pub record: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            variant: Variant::Standard,
            cutoff: CUTOFF_DEFAULT,
            record: false,
        }
    }
}

/// Result of one engine run. `count ≥ n` proves t(N) ≥ t.
#[derive(Debug)]
pub struct Outcome {
    pub n: u64,
    pub t: u64,
    pub count: u64,
    pub log: Option<FactorLog>,
}

impl Outcome {
    #[inline]
    pub fn proved(&self) -> bool {
        self.count >= self.n
    }

    /// count − N: positive margin or negative deficit.
    #[inline]
    pub fn surplus(&self) -> i64 {
        self.count as i64 - self.n as i64
    }
}

/// Input outside the supported envelope: N range, t bounds, target ratio,
/// or cutoff exponent. Kept as a distinct type so the CLI can map these to
/// the argument-error exit code (2) instead of the runtime-error code (1).
#[derive(Debug)]
pub struct DomainError(pub String);

impl std::fmt::Display for DomainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for DomainError {}

impl DomainError {
    /// Wrap a message as an `anyhow::Error` carrying the domain marker.
    pub fn err(msg: String) -> anyhow::Error {
        anyhow::Error::new(DomainError(msg))
    }
}

/// Reject (N, t) outside the supported envelope.
pub fn validate_domain(n: u64, t: u64) -> Result<()> {
    if n < 14 {
        return Err(DomainError::err(format!(
            "N = {} is below the minimum supported value 14",
            n
        )));
    }
    if n >= MAX_N {
        return Err(DomainError::err(format!(
            "N = {} is out of range (N must be < 2^48)",
            n
        )));
    }
    if !(4 * t > n && 2 * t < n) {
        return Err(DomainError::err(format!(
            "t = {} must lie strictly between N/4 and N/2 for N = {}",
            t, n
        )));
    }
    Ok(())
}

/// Reject a cutoff exponent outside [0.2, 0.3].
pub fn validate_cutoff(mu: f64) -> Result<()> {
    if !(CUTOFF_MIN..=CUTOFF_MAX).contains(&mu) {
        return Err(DomainError::err(format!(
            "cutoff exponent {} is outside [{}, {}]",
            mu, CUTOFF_MIN, CUTOFF_MAX
        )));
    }
    Ok(())
}

/// The least s with s(s−1) ≥ t. Primes ≥ s take cofactors < s, so only
/// primes below s need exponent tracking.
pub fn small_prime_bound(t: u64) -> u64 {
    let mut s = sieve::isqrt(t).max(2);
    while s * (s - 1) < t {
        s += 1;
    }
    s
}

/// v_p(N!) by Legendre's formula.
pub fn legendre(n: u64, p: u64) -> u64 {
    let mut e = 0;
    let mut q = n;
    loop {
        q /= p;
        if q == 0 {
            return e;
        }
        e += q;
    }
}

/// Table coverage a run needs: (primes up to, cofactors up to). The
/// standard variant errors out when its cofactor table would exceed the
/// supported maximum.
pub fn table_requirements(n: u64, t: u64, variant: Variant) -> Result<(u64, u64)> {
    let s = small_prime_bound(t);
    let p_need = s.max(sieve::isqrt(2 * n / 5) + 1);
    let m_need = match variant {
        Variant::Standard => {
            let need = ceil_div(t, 2) + 64;
            if need > MAX_COFACTOR_TABLE {
                bail!(
                    "N = {}, t = {} needs a cofactor table of {} entries, beyond the \
                     standard engine's limit of {}; use the fast variant",
                    n,
                    t,
                    need,
                    MAX_COFACTOR_TABLE
                );
            }
            need
        }
        Variant::Fast => {
            let by_exp = 2 * (t as f64).powf(0.625).ceil() as u64;
            by_exp.max(s + 1).min(MAX_COFACTOR_TABLE)
        }
        Variant::Feasible => s + 1,
    };
    Ok((p_need, m_need))
}

/// Cofactor-space cutoff between the enumeration and counting regimes:
/// min(⌊t^μ⌋, cofactor at p = √N), at least 2. Affects cost, never counts.
fn cofactor_cutoff(n: u64, t: u64, mu: f64) -> u64 {
    let by_mu = (t as f64).powf(mu) as u64;
    let at_sqrt = (t - 1) / sieve::isqrt(n);
    by_mu.min(at_sqrt).max(2)
}

/// State of one engine invocation. Owned by a single thread; only the
/// tables behind `tables` are shared.
pub(crate) struct Run<'a> {
    pub(crate) tables: &'a Tables,
    pub(crate) n: u64,
    pub(crate) t: u64,
    /// Least s with s(s−1) ≥ t.
    pub(crate) s: u64,
    /// π(s−1): number of tracked prime indices.
    pub(crate) imax: u32,
    /// e[i] = remaining multiplicity of p_i in the unallocated part of N!.
    /// Signed: the large-prime phase subtracts blindly and asserts ≥ 0 at
    /// phase end.
    pub(crate) e: Vec<i64>,
    pub(crate) count: u64,
    cutoff: f64,
    pix: PrimePi,
    pub(crate) log: Option<FactorLog>,
}

impl<'a> Run<'a> {
    pub(crate) fn new(tables: &'a Tables, n: u64, t: u64, cfg: &Config) -> Run<'a> {
        let s = small_prime_bound(t);
        let imax = tables.pi_small(s - 1) as u32;
        let mut e = vec![0i64; imax as usize + 1];
        for i in 1..=imax {
            e[i as usize] = legendre(n, tables.prime(i)) as i64;
        }
        Run {
            tables,
            n,
            t,
            s,
            imax,
            e,
            count: 0,
            cutoff: cfg.cutoff,
            pix: PrimePi::new(),
            log: cfg.record.then(|| FactorLog::new(n, t)),
        }
    }

    /// Exact π(x): table lookup below P_max, memoized partial sieve above.
    pub(crate) fn prime_count(&mut self, x: u64) -> u64 {
        if x <= self.tables.p_max() {
            self.tables.pi_small(x)
        } else {
            self.pix.eval(x)
        }
    }

    /// How many copies of the number with factorization `rec` fit in the
    /// residual, capped at `cap`. Pure; mutates nothing.
    pub(crate) fn fcnt(&self, cap: u64, rec: &[Pp]) -> u64 {
        let mut c = cap;
        for pp in rec {
            if c == 0 {
                break;
            }
            c = c.min(self.e[pp.pi() as usize] as u64 / pp.e());
        }
        c
    }

    /// [`Run::fcnt`] with an extra factor p_i merged in. p_i may coincide
    /// with the top prime of `rec`; the divisor for that prime is then one
    /// larger than its exponent.
    pub(crate) fn fcnti(&self, i: u32, rec: &[Pp]) -> u64 {
        let mut c = self.e[i as usize] as u64;
        for pp in rec {
            if c == 0 {
                break;
            }
            let div = if pp.pi() == i { pp.e() + 1 } else { pp.e() };
            c = c.min(self.e[pp.pi() as usize] as u64 / div);
        }
        c
    }

    /// Allocate `reps` factors m·p′ for each of the `c` primes in (p, q]:
    /// charge E with the cofactors and record a descriptor. Factor validity
    /// (m·p′ ≥ t) is the caller's contract; the verifier re-checks it.
    pub(crate) fn take_interval(&mut self, m: u64, reps: u64, c: u64, p: u64, q: u64) {
        let tables = self.tables;
        let total = reps * c;
        let rec = if m > 1 {
            let rec = tables.record(m).expect("cofactor missing from smooth table");
            for pp in rec {
                self.e[pp.pi() as usize] -= (total * pp.e()) as i64;
            }
            rec
        } else {
            &[]
        };
        self.count += total;
        if let Some(log) = &mut self.log {
            log.push(Descriptor {
                reps,
                m,
                f: rec.to_vec(),
                p,
                q,
                c,
            });
        }
    }

    /// Allocate `copies` factors p_i·m in the small-prime phase. `rec` is
    /// m's record; p_i may occur in it (standard greedy), in which case the
    /// combined charge to E[i] is copies·(e+1) as [`Run::fcnti`] budgeted.
    pub(crate) fn take_with_prime(&mut self, i: u32, m: u64, rec: &[Pp], copies: u64) {
        debug_assert!(copies > 0);
        let p = self.tables.prime(i);
        debug_assert!(p * m >= self.t, "factor {}·{} below target", p, m);
        self.e[i as usize] -= copies as i64;
        for pp in rec {
            self.e[pp.pi() as usize] -= (copies * pp.e()) as i64;
        }
        debug_assert!(self.e[i as usize] >= 0);
        self.count += copies;
        if let Some(log) = &mut self.log {
            log.push(Descriptor {
                reps: copies,
                m,
                f: rec.to_vec(),
                p: p - 1,
                q: p,
                c: 1,
            });
        }
    }

    /// Allocate `copies` factors p_i²·m2, consuming two of E[i] per copy.
    /// Logged with cofactor p_i·m2 so every descriptor keeps the m·q shape.
    pub(crate) fn take_with_prime_squared(&mut self, i: u32, m2: u64, rec2: &[Pp], copies: u64) {
        debug_assert!(copies > 0);
        let p = self.tables.prime(i);
        debug_assert!(p * p * m2 >= self.t, "factor {}²·{} below target", p, m2);
        self.e[i as usize] -= 2 * copies as i64;
        for pp in rec2 {
            self.e[pp.pi() as usize] -= (copies * pp.e()) as i64;
        }
        debug_assert!(self.e[i as usize] >= 0);
        self.count += copies;
        if let Some(log) = &mut self.log {
            let mut f = vec![Pp::new(i, 1)];
            f.extend_from_slice(rec2);
            log.push(Descriptor {
                reps: copies,
                m: p * m2,
                f,
                p: p - 1,
                q: p,
                c: 1,
            });
        }
    }

    /// Large-prime phase: consume every prime in [s, N] with its minimal
    /// cofactor. See the module docs for the regime split.
    pub(crate) fn large_phase(&mut self) {
        let (n, t) = (self.n, self.t);
        let sqrt_n = sieve::isqrt(n);
        let mut p_done = self.s - 1; // primes ≤ p_done are E-tracked

        // Enumerate [s, √N]: v_p changes at every prime.
        if self.s <= sqrt_n {
            for p in PrimeIter::new(self.s, sqrt_n) {
                let reps = n / p + n / (p * p);
                let m = ceil_div(t, p);
                self.take_interval(m, reps, 1, p - 1, p);
            }
            p_done = sqrt_n;
        }

        // Enumerate (√N, (t−1)/m_mid], batching each stretch of constant
        // (m, ⌊N/p⌋). Stretch ends come from the breakpoint arithmetic, not
        // from the primes observed, so every emitted interval carries its
        // (m, reps) pair at both endpoints.
        let m_mid = cofactor_cutoff(n, t, self.cutoff);
        let r2_end = (t - 1) / m_mid;
        if r2_end > p_done {
            let mut iter = PrimeIter::new(p_done + 1, r2_end);
            let mut cur = iter.next();
            let mut prev = p_done;
            while prev < r2_end {
                let lo = prev + 1;
                let m = ceil_div(t, lo);
                let reps = n / lo;
                let limit = ((t - 1) / (m - 1)).min(n / reps).min(r2_end);
                let mut c = 0u64;
                while let Some(p) = cur {
                    if p > limit {
                        break;
                    }
                    c += 1;
                    cur = iter.next();
                }
                if c > 0 {
                    self.take_interval(m, reps, c, prev, limit);
                }
                prev = limit;
            }
            p_done = r2_end;
        }

        // Count by cofactor value down to 2: primes with ⌈t/p⌉ = m fill
        // (⌈t/m⌉, ⌊(t−1)/(m−1)⌋], split at valuation breakpoints ⌊N/reps⌋.
        let m_start = ceil_div(t, p_done + 1);
        for m in (2..=m_start).rev() {
            let p_lo = ceil_div(t, m).max(p_done + 1);
            let p_hi = (t - 1) / (m - 1);
            if p_hi < p_lo {
                continue;
            }
            let mut prev = p_lo - 1;
            while prev < p_hi {
                let reps = n / (prev + 1);
                let hi = (n / reps).min(p_hi);
                let c = self.prime_count(hi) - self.prime_count(prev);
                if c > 0 {
                    self.take_interval(m, reps, c, prev, hi);
                }
                prev = hi;
            }
            p_done = p_done.max(p_hi);
        }

        // Tail [t, N]: cofactor 1, valuation fixed per block.
        let pi_t1 = self.prime_count(t - 1);
        if 3 * t <= n {
            let hi3 = n / 3;
            let c3 = self.prime_count(hi3) - pi_t1;
            if c3 > 0 {
                self.take_interval(1, 3, c3, t - 1, hi3);
            }
            let c2 = self.prime_count(n / 2) - self.prime_count(hi3);
            if c2 > 0 {
                self.take_interval(1, 2, c2, hi3, n / 2);
            }
        } else {
            let c2 = self.prime_count(n / 2) - pi_t1;
            if c2 > 0 {
                self.take_interval(1, 2, c2, t - 1, n / 2);
            }
        }
        let c1 = self.prime_count(n) - self.prime_count(n / 2);
        if c1 > 0 {
            self.take_interval(1, 1, c1, n / 2, n);
        }

        // Minimal cofactors must always have been affordable; a negative
        // entry here is a programming error, not a provable-bound failure.
        for i in 1..=self.imax as usize {
            assert!(
                self.e[i] >= 0,
                "exponent of prime {} driven negative ({}) by the large-prime phase",
                self.tables.prime(i as u32),
                self.e[i]
            );
        }
        debug!(count = self.count, "large-prime phase complete");
    }

    /// Upper bound on what any continuation of this run could still build:
    /// ⌊Σ E[i]·log p_i / log(t−1)⌋, with epsilons biased upward (numerator
    /// logs over-estimated, denominator log under-estimated) so the floor
    /// is a true upper bound.
    pub(crate) fn feasibility_tail(&self) -> u64 {
        use rug::Float;
        const PREC: u32 = 96;
        let eps = Float::with_val(PREC, 1e-12);
        let mut acc = Float::new(PREC);
        for i in 1..=self.imax {
            let e = self.e[i as usize];
            if e > 0 {
                let lp = (Float::with_val(PREC, self.tables.prime(i)) + &eps).ln();
                acc += lp * (e as u64);
            }
        }
        if acc.is_zero() {
            return 0;
        }
        let den = (Float::with_val(PREC, self.t - 1) - &eps).ln();
        let bound = (acc / den).floor();
        bound
            .to_integer()
            .and_then(|z| z.to_u64())
            .expect("feasibility bound out of range")
    }

    /// Sum of remaining prime multiplicities at indices 1..=i.
    pub(crate) fn residual_weight(&self, i: u32) -> u64 {
        self.e[1..=i as usize].iter().map(|&x| x as u64).sum()
    }

    /// Product of the entire residual at indices 1..=i, saturated at `cap`.
    pub(crate) fn residual_product(&self, i: u32, cap: u64) -> u64 {
        let mut acc: u128 = 1;
        for j in 1..=i {
            let p = self.tables.prime(j) as u128;
            for _ in 0..self.e[j as usize] {
                acc *= p;
                if acc >= cap as u128 {
                    return cap;
                }
            }
        }
        acc as u64
    }
}

/// Run the engine once: count factors of N! that are ≥ t. The result
/// proves t(N) ≥ t exactly when `count ≥ N`; a smaller count is a normal
/// outcome, not an error.
pub fn tfac(tables: &Tables, n: u64, t: u64, cfg: &Config) -> Result<Outcome> {
    validate_domain(n, t)?;
    validate_cutoff(cfg.cutoff)?;
    let (p_need, m_need) = table_requirements(n, t, cfg.variant)?;
    ensure!(
        tables.p_max() >= p_need && tables.m_max() >= m_need,
        "tables cover primes ≤ {} and cofactors ≤ {}, but N = {}, t = {} needs {} and {}",
        tables.p_max(),
        tables.m_max(),
        n,
        t,
        p_need,
        m_need
    );

    // A feasibility count is partly hypothetical; there is no log to replay.
    let cfg = &Config {
        record: cfg.record && cfg.variant != Variant::Feasible,
        ..*cfg
    };
    let mut run = Run::new(tables, n, t, cfg);
    run.large_phase();
    match cfg.variant {
        Variant::Feasible => {
            let tail = run.feasibility_tail();
            run.count += tail;
        }
        Variant::Standard => {
            let ms = tables.smooth_cofactors(m_need, run.s);
            standard::small_phase(&mut run, &ms);
        }
        Variant::Fast => {
            let ms = tables.smooth_cofactors(m_need, run.s);
            fast::small_phase(&mut run, &ms, m_need);
        }
    }

    let count = run.count;
    let mut log = run.log;
    if let Some(log) = &mut log {
        log.count = count;
    }
    debug!(n, t, count, "engine run complete");
    Ok(Outcome { n, t, count, log })
}

/// Build tables adequate for every t up to `t_hi` at the given N (the
/// largest N of a batch) and variant.
pub fn build_tables(n: u64, t_hi: u64, variant: Variant) -> Result<Tables> {
    let (p_need, m_need) = table_requirements(n, t_hi, variant)?;
    Ok(Tables::build(p_need, m_need))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_envelope_is_enforced() {
        assert!(validate_domain(13, 5).is_err());
        assert!(validate_domain(100, 25).is_err()); // t = N/4 not allowed
        assert!(validate_domain(100, 50).is_err()); // t = N/2 not allowed
        assert!(validate_domain(100, 26).is_ok());
        assert!(validate_domain(100, 49).is_ok());
        assert!(validate_domain(1 << 48, (1 << 48) / 3).is_err());
    }

    #[test]
    fn cutoff_range_is_enforced() {
        assert!(validate_cutoff(0.19).is_err());
        assert!(validate_cutoff(0.2).is_ok());
        assert!(validate_cutoff(0.225).is_ok());
        assert!(validate_cutoff(0.3).is_ok());
        assert!(validate_cutoff(0.31).is_err());
    }

    #[test]
    fn envelope_violations_carry_the_domain_marker() {
        // The CLI distinguishes argument errors (exit 2) from runtime
        // errors (exit 1) by this marker.
        for err in [
            validate_domain(13, 5).unwrap_err(),
            validate_domain(100, 25).unwrap_err(),
            validate_cutoff(0.5).unwrap_err(),
        ] {
            assert!(
                err.downcast_ref::<DomainError>().is_some(),
                "expected a domain error, got: {}",
                err
            );
        }
        // Resource exhaustion is a runtime condition, not a domain one.
        let err = table_requirements(1 << 40, (1 << 40) / 3, Variant::Standard).unwrap_err();
        assert!(err.downcast_ref::<DomainError>().is_none());
    }

    #[test]
    fn small_prime_bound_is_minimal() {
        for t in 4..5000u64 {
            let s = small_prime_bound(t);
            assert!(s * (s - 1) >= t, "s({}) = {} too small", t, s);
            assert!((s - 1) * (s - 2) < t, "s({}) = {} not minimal", t, s);
        }
    }

    #[test]
    fn legendre_known_valuations() {
        assert_eq!(legendre(10, 2), 8); // v_2(10!) = 5+2+1
        assert_eq!(legendre(10, 3), 4);
        assert_eq!(legendre(10, 5), 2);
        assert_eq!(legendre(10, 7), 1);
        assert_eq!(legendre(100, 5), 24);
        assert_eq!(legendre(100, 97), 1);
        assert_eq!(legendre(100, 101), 0);
    }

    #[test]
    fn standard_requirements_overflow_to_fast() {
        let err = table_requirements(1 << 40, (1 << 40) / 3, Variant::Standard)
            .expect_err("huge standard run must be refused");
        assert!(err.to_string().contains("fast variant"));
        assert!(table_requirements(1 << 40, (1 << 40) / 3, Variant::Fast).is_ok());
    }

    fn run_once(n: u64, t: u64, variant: Variant) -> Outcome {
        let tables = build_tables(n, t, variant).unwrap();
        let cfg = Config {
            variant,
            record: true,
            ..Config::default()
        };
        tfac(&tables, n, t, &cfg).unwrap()
    }

    #[test]
    fn large_phase_leaves_nonnegative_exponents() {
        for (n, t) in [(100u64, 30u64), (1000, 300), (5000, 1500), (14, 4)] {
            let tables = build_tables(n, t, Variant::Fast).unwrap();
            let cfg = Config {
                variant: Variant::Fast,
                ..Config::default()
            };
            let mut run = Run::new(&tables, n, t, &cfg);
            run.large_phase();
            for i in 1..=run.imax as usize {
                assert!(run.e[i] >= 0);
            }
        }
    }

    #[test]
    fn large_phase_count_matches_descriptor_sum() {
        let tables = build_tables(2000, 600, Variant::Fast).unwrap();
        let cfg = Config {
            variant: Variant::Fast,
            record: true,
            ..Config::default()
        };
        let mut run = Run::new(&tables, 2000, 600, &cfg);
        run.large_phase();
        let log = run.log.as_ref().unwrap();
        let total: u64 = log.descriptors.iter().map(|d| d.factors()).sum();
        assert_eq!(total, run.count);
    }

    #[test]
    fn proves_small_known_bound() {
        // t(14) ≥ 4: 14 factors of 14! each ≥ 4 exist.
        let out = run_once(14, 4, Variant::Standard);
        assert!(out.proved(), "t(14) ≥ 4 should be provable, count = {}", out.count);
        let out = run_once(14, 4, Variant::Fast);
        assert!(out.proved(), "fast variant should also prove t(14) ≥ 4");
    }

    #[test]
    fn count_is_monotone_in_t() {
        let n = 3000u64;
        for variant in [Variant::Standard, Variant::Fast] {
            let tables = build_tables(n, 2 * n / 5, variant).unwrap();
            let cfg = Config {
                variant,
                ..Config::default()
            };
            let mut prev = u64::MAX;
            for t in (n / 4 + 1..=2 * n / 5).step_by(37) {
                let count = tfac(&tables, n, t, &cfg).unwrap().count;
                assert!(
                    count <= prev,
                    "count should not increase with t ({:?}, t = {})",
                    variant,
                    t
                );
                prev = count;
            }
        }
    }

    #[test]
    fn cutoff_choice_never_changes_the_count() {
        let (n, t) = (4000u64, 1300u64);
        for variant in [Variant::Standard, Variant::Fast] {
            let tables = build_tables(n, t, variant).unwrap();
            let mut counts = Vec::new();
            for mu in [0.2, 0.225, 0.25, 0.3] {
                let cfg = Config {
                    variant,
                    cutoff: mu,
                    record: false,
                };
                counts.push(tfac(&tables, n, t, &cfg).unwrap().count);
            }
            assert!(
                counts.windows(2).all(|w| w[0] == w[1]),
                "{:?}: counts varied with cutoff: {:?}",
                variant,
                counts
            );
        }
    }

    #[test]
    fn runs_are_deterministic() {
        let (n, t) = (2500u64, 800u64);
        let tables = build_tables(n, t, Variant::Fast).unwrap();
        let cfg = Config {
            variant: Variant::Fast,
            record: true,
            ..Config::default()
        };
        let a = tfac(&tables, n, t, &cfg).unwrap();
        let b = tfac(&tables, n, t, &cfg).unwrap();
        assert_eq!(a.count, b.count);
        assert_eq!(
            a.log.as_ref().unwrap().descriptors,
            b.log.as_ref().unwrap().descriptors
        );
    }

    #[test]
    fn feasibility_dominates_both_variants() {
        let n = 2000u64;
        let t_hi = 2 * n / 5;
        let tables = build_tables(n, t_hi, Variant::Standard).unwrap();
        for t in (n / 4 + 1..=t_hi).step_by(53) {
            let feas = tfac(&tables, n, t, &Config { variant: Variant::Feasible, ..Config::default() })
                .unwrap()
                .count;
            for variant in [Variant::Standard, Variant::Fast] {
                let real = tfac(&tables, n, t, &Config { variant, ..Config::default() })
                    .unwrap()
                    .count;
                assert!(
                    feas >= real,
                    "feasibility count {} below {:?} count {} at t = {}",
                    feas,
                    variant,
                    real,
                    t
                );
            }
        }
    }

    #[test]
    fn surplus_reports_signed_margin() {
        let out = run_once(14, 4, Variant::Fast);
        assert_eq!(out.surplus(), out.count as i64 - 14);
        assert!(out.surplus() >= 0);
    }
}
