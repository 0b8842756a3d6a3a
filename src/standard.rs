//! # Standard — Baseline Greedy Small-Prime Phase
//!
//! Closes out an engine run by pairing every still-available small prime
//! p_i (below the large-prime threshold s) with the smallest smooth
//! cofactor m that makes p_i·m ≥ t. Prime indices are walked downward
//! while one cofactor pointer moves upward — the required m only grows as
//! p shrinks, so the pointer never backs up.
//!
//! For each prime index i:
//!
//! 1. Advance the cofactor pointer past any m with p_i·m < t or with a
//!    prime factor above p_i (the factor must stay p_i-smooth so its whole
//!    charge is covered by the exponent vector).
//! 2. Budget copies with `fcnti` — the cofactor may itself contain p_i,
//!    in which case one extra power per copy is charged.
//! 3. Charge E and record; stay on i while it has multiplicity left.
//! 4. When nothing fits and fewer than 40 prime powers remain in total,
//!    multiply the residual out: if even the full product is below t, no
//!    further factor is possible and the phase ends.
//!
//! The cofactor table for this variant must reach ⌈t/2⌉ (the smallest
//! prime may need a cofactor that large), which is what limits the
//! standard engine's range; the fast variant trades this for a composite
//! assembly pass.

use crate::engine::Run;
use tracing::debug;

/// Residual size (counted with multiplicity) below which the terminal
/// product check runs.
const RESIDUAL_CHECK: u64 = 40;

pub(crate) fn small_phase(run: &mut Run, ms: &[u64]) {
    let tables = run.tables;
    let t = run.t;
    let mut i = run.imax;
    let mut j = 0usize;

    while i >= 1 {
        if run.e[i as usize] == 0 {
            i -= 1;
            continue;
        }
        let p = tables.prime(i);
        while j < ms.len() {
            let m = ms[j];
            if p * m < t || tables.prime(tables.top_prime_index(m)) > p {
                j += 1;
            } else {
                break;
            }
        }
        if j >= ms.len() {
            debug!(prime = p, "cofactor candidates exhausted; residual remains");
            break;
        }
        let m = ms[j];
        let rec = tables.record(m).expect("candidate cofactor lost its record");
        let copies = run.fcnti(i, rec);
        if copies > 0 {
            run.take_with_prime(i, m, rec, copies);
        } else {
            if run.residual_weight(i) < RESIDUAL_CHECK && run.residual_product(i, t) < t {
                break;
            }
            j += 1; // this cofactor cannot be charged; try the next
        }
    }
    debug!(count = run.count, "standard small-prime phase complete");
}
