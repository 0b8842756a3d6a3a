//! # Factors — Descriptors, the Factorization Log, and Dump Output
//!
//! The engine does not materialize factors one by one — at scale there are
//! billions. Instead it emits *descriptors*, each standing for a batch of
//! identically-shaped factors: `c` primes in the open-right interval (p, q],
//! every one used in `reps` factors of the form m·p′. When p + 1 = q the
//! descriptor degenerates to a single prime q with multiplicity `reps`.
//!
//! Descriptors carry their cofactor factorization inline (an owned copy of
//! the packed record), so a log can be replayed by the verifier without
//! consulting the smooth-factorization tables it was produced from.
//!
//! The dump format is diagnostic only: one `n,m,p,q` line per descriptor.

use crate::tables::Pp;
use std::io::{self, Write};

/// One batch of factors: `c` primes in (p, q], each appearing in `reps`
/// factors m·p′. The cofactor factorization `f` is descending by prime
/// index, terminator excluded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Descriptor {
    pub reps: u64,
    pub m: u64,
    pub f: Vec<Pp>,
    pub p: u64,
    pub q: u64,
    pub c: u64,
}

impl Descriptor {
    /// Total factors this descriptor contributes.
    #[inline]
    pub fn factors(&self) -> u64 {
        self.reps * self.c
    }
}

/// Ordered record of everything one engine run allocated, replayable by the
/// verifier.
#[derive(Clone, Debug, Default)]
pub struct FactorLog {
    pub n: u64,
    pub t: u64,
    pub count: u64,
    pub descriptors: Vec<Descriptor>,
}

impl FactorLog {
    pub fn new(n: u64, t: u64) -> Self {
        FactorLog {
            n,
            t,
            count: 0,
            descriptors: Vec::new(),
        }
    }

    pub fn push(&mut self, d: Descriptor) {
        self.descriptors.push(d);
    }

    /// Write the diagnostic dump: one `n,m,p,q` line per descriptor.
    pub fn write_dump<W: Write>(&self, mut w: W) -> io::Result<()> {
        for d in &self.descriptors {
            writeln!(w, "{},{},{},{}", d.reps, d.m, d.p, d.q)?;
        }
        Ok(())
    }
}
