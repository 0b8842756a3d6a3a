//! # Tables — Prime Indexing and the Smooth-Factorization Arena
//!
//! Read-only lookup structures built once per process and shared by every
//! engine invocation (and every worker thread) without synchronization:
//!
//! 1. **Prime tables**: `P[i]` = the i-th prime (index 0 holds the sentinel
//!    value 1) and `PI[x]` = π(x) for all x ≤ P_max.
//! 2. **Smooth-factorization arena**: for every P_max-smooth m ≤ M_max, a
//!    packed prime-power factorization. Records are concatenated into one
//!    contiguous arena of [`Pp`] values and addressed by offset through
//!    `M[m]`; `M[m] = 0` marks m as not smooth (offset 0 is reserved).
//!
//! ## Record format
//!
//! A record is a zero-terminated run of [`Pp`] values in strictly descending
//! prime-index order. Each `Pp` packs a 24-bit prime index and an 8-bit
//! exponent into one `u32`; index 0 terminates. The record for m = 1 is the
//! empty product (immediately the terminator). Powers of two ride in a
//! trailing block with prime index 1 (`P[1] = 2`), appended when the even
//! half of the arena is filled in.
//!
//! ## Build
//!
//! A largest-prime-factor sieve first leaves `M[q]` holding the index of the
//! largest prime ≤ P_max dividing q. Odd m are then scanned downward,
//! peeling the largest prime factor repeatedly; a peel that reaches 1 yields
//! a record, anything else zeroes `M[m]`. Even m copy the record of their
//! odd part and append the power of two. The arena grows geometrically
//! during the build and is shrunk to exact size afterwards.

use crate::sieve;

/// Packed prime-power: prime index in the low 24 bits, exponent in the high
/// 8 bits. `Pp::TERM` (index 0) terminates a record.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[repr(transparent)]
pub struct Pp(u32);

impl Pp {
    pub const TERM: Pp = Pp(0);

    #[inline]
    pub fn new(pi: u32, e: u8) -> Self {
        debug_assert!(pi < 1 << 24, "prime index {} exceeds 24 bits", pi);
        Pp(pi | (e as u32) << 24)
    }

    /// Prime index (0 for the terminator).
    #[inline]
    pub fn pi(self) -> u32 {
        self.0 & 0x00FF_FFFF
    }

    /// Exponent.
    #[inline]
    pub fn e(self) -> u64 {
        (self.0 >> 24) as u64
    }

    #[inline]
    pub fn is_term(self) -> bool {
        self.pi() == 0
    }
}

/// Immutable prime and smooth-factorization tables. Built once, then shared
/// read-only across all engine runs and worker threads.
pub struct Tables {
    p_max: u64,
    m_max: u64,
    /// `primes[0] = 1` (sentinel); `primes[i]` = i-th prime for i ≥ 1.
    primes: Vec<u64>,
    /// `pi[x]` = π(x) for 0 ≤ x ≤ p_max.
    pi: Vec<u32>,
    /// Concatenated zero-terminated records; offset 0 reserved.
    arena: Vec<Pp>,
    /// `offsets[m]` = arena offset of m's record, 0 if m is not smooth.
    offsets: Vec<u32>,
}

impl Tables {
    /// Build tables covering primes up to `p_max` and smooth cofactors up to
    /// `m_max`.
    pub fn build(p_max: u64, m_max: u64) -> Tables {
        let raw = sieve::generate_primes(p_max.max(2));
        let mut primes = Vec::with_capacity(raw.len() + 1);
        primes.push(1u64);
        primes.extend_from_slice(&raw);

        let p_max = p_max.max(2);
        let mut pi = vec![0u32; (p_max + 1) as usize];
        for (n, &p) in raw.iter().enumerate() {
            pi[p as usize] = (n + 1) as u32;
        }
        for x in 2..=p_max as usize {
            if pi[x] == 0 {
                pi[x] = pi[x - 1];
            }
        }

        let mut offsets = vec![0u32; (m_max + 1) as usize];

        // Largest-prime-factor sieve: after this, offsets[q] transiently
        // holds the index of the largest prime ≤ p_max dividing q.
        for (n, &p) in raw.iter().enumerate() {
            if p > m_max {
                break;
            }
            let mut q = p;
            while q <= m_max {
                offsets[q as usize] = (n + 1) as u32;
                q += p;
            }
        }

        let mut arena: Vec<Pp> = Vec::with_capacity(4 * m_max as usize + 8);
        arena.push(Pp::TERM); // offset 0 reserved

        // m = 1: the empty product.
        if m_max >= 1 {
            offsets[1] = arena.len() as u32;
            arena.push(Pp::TERM);
        }

        // Odd m, descending: peel the largest prime factor. Entries below
        // the current m still hold raw prime indices, so lookups during the
        // peel are well-defined.
        let mut rec: Vec<Pp> = Vec::with_capacity(16);
        let mut v = if m_max % 2 == 0 { m_max.max(1) - 1 } else { m_max };
        while v >= 3 {
            rec.clear();
            let mut q = v;
            let smooth = loop {
                if q == 1 {
                    break true;
                }
                let n = offsets[q as usize];
                if n == 0 {
                    break false; // no prime factor ≤ p_max remains
                }
                let p = primes[n as usize];
                let mut e = 0u8;
                while q % p == 0 {
                    q /= p;
                    e += 1;
                }
                if e == 0 {
                    break false; // residue's largest factor exceeds p_max
                }
                rec.push(Pp::new(n, e));
            };
            if smooth {
                offsets[v as usize] = append(&mut arena, &rec);
            } else {
                offsets[v as usize] = 0;
            }
            v -= 2;
        }

        // Even m: copy the odd part's record and append the power of two
        // (prime index 1) ahead of the terminator.
        let mut v = 2u64;
        while v <= m_max {
            let e2 = v.trailing_zeros() as u8;
            let odd = v >> e2;
            let odd_off = offsets[odd as usize];
            if odd_off != 0 {
                rec.clear();
                let mut k = odd_off as usize;
                while !arena[k].is_term() {
                    rec.push(arena[k]);
                    k += 1;
                }
                rec.push(Pp::new(1, e2));
                offsets[v as usize] = append(&mut arena, &rec);
            } else {
                offsets[v as usize] = 0;
            }
            v += 2;
        }

        arena.shrink_to_fit();
        Tables {
            p_max,
            m_max,
            primes,
            pi,
            arena,
            offsets,
        }
    }

    #[inline]
    pub fn p_max(&self) -> u64 {
        self.p_max
    }

    #[inline]
    pub fn m_max(&self) -> u64 {
        self.m_max
    }

    /// The i-th prime; `prime(0) = 1` is the sentinel.
    #[inline]
    pub fn prime(&self, i: u32) -> u64 {
        self.primes[i as usize]
    }

    /// Number of prime indices available, i.e. π(p_max).
    #[inline]
    pub fn index_count(&self) -> u32 {
        (self.primes.len() - 1) as u32
    }

    /// π(x) by table lookup; requires x ≤ p_max.
    #[inline]
    pub fn pi_small(&self, x: u64) -> u64 {
        self.pi[x as usize] as u64
    }

    /// The factorization record of v (terminator excluded), or None when v
    /// is out of range or not P_max-smooth.
    pub fn record(&self, v: u64) -> Option<&[Pp]> {
        if v == 0 || v > self.m_max {
            return None;
        }
        let off = self.offsets[v as usize];
        if off == 0 {
            return None;
        }
        let start = off as usize;
        let mut end = start;
        while !self.arena[end].is_term() {
            end += 1;
        }
        Some(&self.arena[start..end])
    }

    /// Index of the largest prime factor of v (0 for v = 1).
    #[inline]
    pub fn top_prime_index(&self, v: u64) -> u32 {
        match self.record(v) {
            Some(rec) if !rec.is_empty() => rec[0].pi(),
            _ => 0,
        }
    }

    /// Multiply a record back into the integer it represents.
    pub fn record_value(&self, rec: &[Pp]) -> u64 {
        let mut acc: u128 = 1;
        for pp in rec {
            let p = self.primes[pp.pi() as usize] as u128;
            for _ in 0..pp.e() {
                acc *= p;
            }
        }
        acc as u64
    }

    /// Ascending list of smooth cofactor candidates in [2, cap] whose
    /// largest prime factor is below `lpf_below`.
    pub fn smooth_cofactors(&self, cap: u64, lpf_below: u64) -> Vec<u64> {
        let cap = cap.min(self.m_max);
        let mut out = Vec::new();
        for v in 2..=cap {
            if self.offsets[v as usize] == 0 {
                continue;
            }
            let top = self.prime(self.top_prime_index(v));
            if top < lpf_below {
                out.push(v);
            }
        }
        out
    }
}

/// Append a record plus terminator; returns its offset.
fn append(arena: &mut Vec<Pp>, rec: &[Pp]) -> u32 {
    let off = arena.len();
    assert!(off + rec.len() + 1 < u32::MAX as usize, "factorization arena overflow");
    arena.extend_from_slice(rec);
    arena.push(Pp::TERM);
    off as u32
}
