mod app;

use anyhow::{Context, Result};
use clap::Parser;

use app::{Cli, run};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::INFO
    } else {
        tracing::Level::WARN
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(level.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("CLI: Failed to initialize thread pool")?;
    }

    let start = std::time::Instant::now();
    let document_count = run(&cli)?;

    let elapsed = start.elapsed();
    tracing::info!(
        "Done! Evaluated {} documents in {:.2}s ({} documents/s)",
        document_count,
        elapsed.as_secs_f64(),
        (document_count as f64 / elapsed.as_secs_f64().max(f64::EPSILON)) as u64
    );

    Ok(())
}
