//! # Fast — Scalable Greedy Small-Prime Phase
//!
//! The standard greedy needs smooth cofactors up to ⌈t/2⌉, which stops
//! scaling long before N = 2^48. This variant keeps the cofactor table at
//! O(t^{5/8}) and closes the gap with two passes:
//!
//! **Pass A** — primes p above ⌈t/M_max⌉, descending. Cofactors are required
//! to be strictly (p−1)-smooth, so the prime and its cofactor never share a
//! factor and the two charges to the exponent vector decouple. Per prime:
//!
//! 1. the minimal cofactor, kept only if it clears the prime's multiplicity
//!    outright;
//! 2. otherwise p² with cofactor ⌈t/p²⌉, consuming multiplicity in pairs,
//!    then the minimal cofactor again for what remains;
//! 3. then rescans over larger cofactors — first for p, then for p² —
//!    preferring full clearance and bounding every candidate factor by
//!    5⌈t/4⌉ (beyond that the factor wastes more than a fresh build would).
//!
//! **Pass B** — whatever survives (mostly primes below t^{3/8}) is combined
//! into composite factors: multiply available primes, largest first, while
//! the product stays under 5⌈t/4⌉; fill any remaining gap to t with a
//! smooth cofactor smaller than the factor's least prime; emit with the
//! full multiplicity that still fits. Usage is tracked against a local
//! ledger and only charged to the exponent vector when a factor is emitted,
//! so an abandoned partial build leaves the residual a true divisor of the
//! remaining part of N!.

use crate::engine::Run;
use crate::factors::Descriptor;
use crate::tables::Pp;
use crate::ceil_div;
use tracing::debug;

pub(crate) fn small_phase(run: &mut Run, ms: &[u64], m_cap: u64) {
    let good = 5 * ceil_div(run.t, 4);
    pass_single_primes(run, ms, m_cap, good);
    pass_composites(run, good);
    debug!(count = run.count, "fast small-prime phase complete");
}

/// Pass A: one prime (or its square) per factor, strictly smaller-smooth
/// cofactors.
fn pass_single_primes(run: &mut Run, ms: &[u64], m_cap: u64, good: u64) {
    let tables = run.tables;
    let t = run.t;
    let p_floor = ceil_div(t, m_cap.max(1));

    let mut j = 0usize;
    let mut i = run.imax;
    while i >= 1 {
        let p = tables.prime(i);
        if p <= p_floor {
            break; // no tabled cofactor reaches t from here; pass B takes over
        }
        if run.e[i as usize] == 0 {
            i -= 1;
            continue;
        }

        while j < ms.len()
            && (p * ms[j] < t || tables.prime(tables.top_prime_index(ms[j])) >= p)
        {
            j += 1;
        }
        let minimal = if j < ms.len() { Some(ms[j]) } else { None };

        // Minimal cofactor, kept only on full clearance.
        if let Some(m) = minimal {
            let rec = tables.record(m).expect("candidate cofactor lost its record");
            let avail = run.e[i as usize] as u64;
            let copies = run.fcnt(avail, rec);
            if copies == avail {
                run.take_with_prime(i, m, rec, copies);
                i -= 1;
                continue;
            }
        }

        // Pair consumption via p².
        let m2_min = ceil_div(t, p * p);
        if run.e[i as usize] >= 2 {
            if let Some(m2) = smallest_smooth(run, m2_min, m_cap, p) {
                let rec2 = tables.record(m2).expect("cofactor record vanished");
                let pairs = run.e[i as usize] as u64 / 2;
                let copies = run.fcnt(pairs, rec2);
                if copies > 0 {
                    run.take_with_prime_squared(i, m2, rec2, copies);
                }
            }
        }

        // Minimal cofactor again for the remainder.
        if run.e[i as usize] > 0 {
            if let Some(m) = minimal {
                let rec = tables.record(m).expect("cofactor record vanished");
                let copies = run.fcnt(run.e[i as usize] as u64, rec);
                if copies > 0 {
                    run.take_with_prime(i, m, rec, copies);
                }
            }
        }

        // Rescan larger cofactors for p, preferring full clearance.
        if run.e[i as usize] > 0 && j + 1 < ms.len() {
            let need = run.e[i as usize] as u64;
            let mut best: Option<(u64, u64)> = None;
            for &m in &ms[j + 1..] {
                if p * m > good {
                    break;
                }
                let rec = tables.record(m).expect("cofactor record vanished");
                if !rec.is_empty() && tables.prime(rec[0].pi()) >= p {
                    continue;
                }
                let copies = run.fcnt(need, rec);
                if copies == need {
                    best = Some((m, copies));
                    break;
                }
                if copies > best.map_or(0, |(_, c)| c) {
                    best = Some((m, copies));
                }
            }
            if let Some((m, copies)) = best {
                let rec = tables.record(m).expect("cofactor record vanished");
                run.take_with_prime(i, m, rec, copies);
            }
        }

        // Rescan larger cofactors for p².
        if run.e[i as usize] >= 2 {
            let m2_hi = (good / (p * p)).min(m_cap);
            let need = run.e[i as usize] as u64 / 2;
            let mut best: Option<(u64, u64)> = None;
            for m2 in m2_min + 1..=m2_hi {
                let Some(rec2) = tables.record(m2) else { continue };
                if !rec2.is_empty() && tables.prime(rec2[0].pi()) >= p {
                    continue;
                }
                let copies = run.fcnt(need, rec2);
                if copies == need {
                    best = Some((m2, copies));
                    break;
                }
                if copies > best.map_or(0, |(_, c)| c) {
                    best = Some((m2, copies));
                }
            }
            if let Some((m2, copies)) = best {
                let rec2 = tables.record(m2).expect("cofactor record vanished");
                run.take_with_prime_squared(i, m2, rec2, copies);
            }
        }

        i -= 1; // leftover multiplicity flows to pass B
    }
}

/// Smallest smooth value in [from, cap] whose largest prime factor is
/// below p.
fn smallest_smooth(run: &Run, from: u64, cap: u64, p: u64) -> Option<u64> {
    let tables = run.tables;
    for m in from..=cap {
        let Some(rec) = tables.record(m) else { continue };
        if !rec.is_empty() && tables.prime(rec[0].pi()) >= p {
            continue;
        }
        return Some(m);
    }
    None
}

/// Local usage of index i in a partial build. Indices enter descending, so
/// only the most recent entry can match.
fn avail(run: &Run, parts: &[(u32, u64)], i: u32) -> u64 {
    let used = match parts.last() {
        Some(&(idx, e)) if idx == i => e,
        _ => 0,
    };
    run.e[i as usize] as u64 - used
}

fn mul_in(parts: &mut Vec<(u32, u64)>, q: &mut u128, i: u32, p: u64) {
    *q *= p as u128;
    if let Some(last) = parts.last_mut() {
        if last.0 == i {
            last.1 += 1;
            return;
        }
    }
    parts.push((i, 1));
}

/// Pass B: combine the residual primes into composite factors in [t, ~5t/4].
fn pass_composites(run: &mut Run, good: u64) {
    let tables = run.tables;
    let t = run.t;
    let mut top = run.imax;

    loop {
        while top >= 1 && run.e[top as usize] == 0 {
            top -= 1;
        }
        if top == 0 {
            return;
        }

        // One factor: multiply available primes downward while the product
        // stays below the good bound. E is not touched until emission, so
        // an abandoned build leaves the residual exactly as it was.
        let mut parts: Vec<(u32, u64)> = Vec::new();
        let mut q: u128 = 1;
        let mut i = top;
        let mut cof: Option<u64> = None;

        loop {
            while i >= 1 && avail(run, &parts, i) == 0 {
                i -= 1;
            }
            if i == 0 {
                break;
            }
            let p = tables.prime(i);
            if q * p as u128 >= good as u128 {
                break;
            }
            mul_in(&mut parts, &mut q, i, p);
        }

        // Complete the factor to reach t.
        while q < t as u128 {
            if parts.is_empty() {
                return; // nothing available at all
            }
            let p_min = tables.prime(parts.last().unwrap().0);
            let need = ceil_div(t, q as u64);
            if need < p_min {
                if let Some(m) = gap_cofactor(run, need, p_min) {
                    let rec = tables.record(m).expect("gap cofactor record vanished");
                    debug_assert!(run.fcnt(1, rec) == 1);
                    cof = Some(m);
                    q *= m as u128;
                    break;
                }
            }
            // No smooth filler below the factor's least prime: grow the
            // factor with the next smaller available prime and retry.
            while i >= 1 && avail(run, &parts, i) == 0 {
                i -= 1;
            }
            if i == 0 {
                return; // cannot be completed; residual stays untouched
            }
            let p = tables.prime(i);
            mul_in(&mut parts, &mut q, i, p);
        }
        if parts.is_empty() {
            return;
        }
        debug_assert!(q >= t as u128);

        // One copy now; then as many identical copies as still fit, capped
        // by the top prime's remaining multiplicity.
        let (top_i, top_e) = parts[0];
        charge(run, &parts, cof, 1);
        let mut extra = run.e[top_i as usize] as u64 / top_e;
        for &(idx, e) in &parts[1..] {
            extra = extra.min(run.e[idx as usize] as u64 / e);
        }
        if let Some(m) = cof {
            for pp in tables.record(m).expect("gap cofactor record vanished") {
                extra = extra.min(run.e[pp.pi() as usize] as u64 / pp.e());
            }
        }
        if extra > 0 {
            charge(run, &parts, cof, extra);
        }
        run.count += 1 + extra;

        if run.log.is_some() {
            let p_top = tables.prime(top_i);
            let mut f: Vec<Pp> = Vec::new();
            if top_e > 1 {
                f.push(Pp::new(top_i, (top_e - 1) as u8));
            }
            for &(idx, e) in &parts[1..] {
                f.push(Pp::new(idx, e as u8));
            }
            if let Some(m) = cof {
                f.extend_from_slice(tables.record(m).expect("gap cofactor record vanished"));
            }
            let m_desc = (q / p_top as u128) as u64;
            run.log.as_mut().unwrap().push(Descriptor {
                reps: 1 + extra,
                m: m_desc,
                f,
                p: p_top - 1,
                q: p_top,
                c: 1,
            });
        }
    }
}

/// Smallest smooth value in [need, below) with every prime power still
/// available. Values below `below` are automatically (below−1)-smooth.
fn gap_cofactor(run: &Run, need: u64, below: u64) -> Option<u64> {
    let tables = run.tables;
    for m in need..below {
        let Some(rec) = tables.record(m) else { continue };
        if run.fcnt(1, rec) == 1 {
            return Some(m);
        }
    }
    None
}

fn charge(run: &mut Run, parts: &[(u32, u64)], cof: Option<u64>, times: u64) {
    let tables = run.tables;
    for &(idx, e) in parts {
        run.e[idx as usize] -= (e * times) as i64;
        debug_assert!(run.e[idx as usize] >= 0);
    }
    if let Some(m) = cof {
        for pp in tables.record(m).expect("gap cofactor record vanished") {
            run.e[pp.pi() as usize] -= (pp.e() * times) as i64;
            debug_assert!(run.e[pp.pi() as usize] >= 0);
        }
    }
}
