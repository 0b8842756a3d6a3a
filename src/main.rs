//! # Main — CLI Entry Point
//!
//! Parses the command line and routes to the run functions in `cli`.
//! Structured logging goes to stderr (`LOG_FORMAT=json` switches to JSON
//! for machine consumption); results go to stdout.
//!
//! ## Invocations
//!
//! - `egs N t` — one engine run; reports whether t(N) ≥ t was proved.
//! - `egs N` — search the largest provable t, anchored at `--ratio`.
//! - `egs LO..HI --create-hints FILE` — batch-search the range, write the
//!   covering hint chain.
//! - `egs LO..HI --hints FILE` — re-verify a previously written chain.
//!
//! ## Exit codes
//!
//! 0 — the run completed, including "failed to prove" outcomes;
//! 2 — parse or domain errors (clap's convention, shared by the envelope
//! checks via [`egs::engine::DomainError`]);
//! 1 — runtime errors (I/O, hint-file defects, resource bounds).

mod cli;

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(
    name = "egs",
    about = "Prove lower bounds for the Erdős–Guy–Selfridge function t(N)"
)]
pub struct Cli {
    /// Single N, or an inclusive range LO..HI for batch runs
    pub n: String,

    /// Target t; when omitted, search for the largest provable t
    pub t: Option<u64>,

    /// Target ratio a/b for searches and batch runs (1/4 ≤ a/b ≤ 2/5)
    #[arg(long, default_value = "1/3")]
    pub ratio: String,

    /// Use the fast greedy (required beyond the standard engine's range)
    #[arg(long)]
    pub fast: bool,

    /// Sweep every candidate t in parallel instead of trusting bisection
    #[arg(long)]
    pub exhaustive: bool,

    /// Independently replay and check the factorization log after the run
    #[arg(long)]
    pub verify: bool,

    /// Write the factorization log to FILE, one n,m,p,q line per batch
    #[arg(long, value_name = "FILE")]
    pub dump: Option<PathBuf>,

    /// Re-verify the hint file over the given range instead of searching
    #[arg(long, value_name = "FILE")]
    pub hints: Option<PathBuf>,

    /// Batch-search the range and write the covering hint file
    #[arg(long, value_name = "FILE")]
    pub create_hints: Option<PathBuf>,

    /// Cutoff exponent between prime enumeration and prime counting
    #[arg(long, default_value_t = egs::engine::CUTOFF_DEFAULT)]
    pub cutoff: f64,

    /// Worker threads for exhaustive sweeps (0 = all logical cores)
    #[arg(long, default_value_t = 0)]
    pub threads: usize,

    /// Print one JSON object per completed run
    #[arg(long)]
    pub json: bool,
}

fn main() -> ExitCode {
    // Structured logging: LOG_FORMAT=json for machine consumption,
    // human-readable on stderr otherwise.
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_default();
    if log_format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .init();
    }

    let cli = Cli::parse();
    match cli::run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {:#}", err);
            if err.downcast_ref::<egs::engine::DomainError>().is_some() {
                ExitCode::from(2)
            } else {
                ExitCode::from(1)
            }
        }
    }
}
