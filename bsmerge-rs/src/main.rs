use anyhow::Result;
use bsmerge_rs::cli::Args;
use bsmerge_rs::pipeline::{self, SharedData};
use clap::Parser;
use mimalloc::MiMalloc;
use tracing_subscriber::EnvFilter;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing subscriber
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if args.quiet {
            EnvFilter::new("warn")
        } else {
            EnvFilter::new("info")
        }
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = args.config()?;
    let shared = SharedData::load(
        &args.genome,
        args.genome_rc.as_deref(),
        args.names.as_deref(),
        args.fragments.as_deref(),
    )?;
    let stats = pipeline::run(
        &args.chunks,
        &args.out_dir,
        &shared,
        &config,
        args.threads as usize,
    )?;

    for (mismatches, n) in &stats.by_mismatches {
        tracing::info!(mismatches, alignments = n, "alignments by mismatch count");
    }
    for (reason, n) in &stats.dropped {
        tracing::info!(reason = %reason, reads = n, "reads dropped");
    }
    tracing::info!(
        lines = stats.load.lines,
        unmapped = stats.load.unmapped,
        malformed_lines = stats.load.malformed,
        over_limit = stats.load.over_limit,
        retained = stats.retained,
        dropped = stats.total_dropped(),
        "bsmerge-rs: processing complete"
    );
    Ok(())
}
