//! # egs — Erdős–Guy–Selfridge Factorial Lower Bounds
//!
//! Computes rigorous lower bounds on t(N), the largest integer such that N!
//! can be written as a product of at least N integer factors, each ≥ t(N).
//! For a given pair (N, t) with N/4 < t < N/2 the engine constructs an
//! explicit multiset of factors of N!, all ≥ t; reporting `count ≥ N`
//! proves t(N) ≥ t. A search driver finds the largest provable t for one
//! N, optionally sweeping every candidate in parallel, and a batch layer
//! chains searches across ranges of N through a hint file.
//!
//! ## Module Organization
//!
//! **Core pipeline** (tables → engine → verification):
//! - [`sieve`] — wheel-30 prime sieve, segmented enumeration, exact π(x)
//! - [`tables`] — prime index tables and the smooth-factorization arena
//! - [`engine`] — exponent vector, large-prime phase, feasibility bound,
//!   the `tfac` entry point
//! - `standard` / `fast` — the two small-prime allocation strategies
//! - [`factors`] — factor descriptors, the replayable log, dump output
//! - [`verify`] — independent replay of a log against a fresh state
//!
//! **Drivers**:
//! - [`search`] — anchor, heuristic bisection, exhaustive parallel sweep
//! - [`hints`] — hint-file grammar and batch runs across N ranges
//!
//! ## Design Philosophy
//!
//! Everything precomputed is immutable after setup: the prime tables and
//! the factorization arena are built once and shared read-only by every
//! engine invocation and every worker thread. Each run owns its exponent
//! vector outright, so the exhaustive sweep's single mutex (the best-known
//! bound) is the only synchronization in the crate. Runs are deterministic:
//! identical inputs give identical counts and identical descriptor logs.
//!
//! ## References
//!
//! - Erdős, Guy & Selfridge, "Another property of 239 and some related
//!   questions", Congressus Numerantium (1971).
//! - Guy & Selfridge, "Factoring factorial n", American Mathematical
//!   Monthly 105 (1998), 766–767.
//! - Tao, "Decomposing a factorial into large factors", arXiv:2503.20170.
//! - OEIS [A034258](https://oeis.org/A034258), [A034259](https://oeis.org/A034259).

pub mod engine;
pub mod factors;
mod fast;
pub mod hints;
pub mod search;
pub mod sieve;
mod standard;
pub mod tables;
pub mod verify;

pub use engine::{tfac, Config, Outcome, Variant};

/// Ceiling division for the positive operands used throughout: ⌈a/b⌉.
#[inline]
pub fn ceil_div(a: u64, b: u64) -> u64 {
    debug_assert!(b > 0);
    (a + b - 1) / b
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ceil_div_rounds_up() {
        assert_eq!(ceil_div(10, 5), 2);
        assert_eq!(ceil_div(11, 5), 3);
        assert_eq!(ceil_div(1, 1), 1);
        assert_eq!(ceil_div(0, 7), 0);
        assert_eq!(ceil_div(u64::MAX / 2, 1), u64::MAX / 2);
    }
}
