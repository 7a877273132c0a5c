//! # mediafire-dl CLI
//!
//! Command-line interface for the mediafire-dl library.
//! Mirrors a MediaFire folder tree into a local directory.

use clap::Parser;
use log::error;
use mediafire_dl::{FetchOptions, Summary};
use tokio_util::sync::CancellationToken;

mod cli;

/// Command-line interface for mediafire-dl
#[derive(Parser)]
#[command(name = "mediafire-dl")]
#[command(about = "Bulk MediaFire folder downloader with integrity verification")]
#[command(long_about = "Mirrors a MediaFire folder tree into a local directory:
  mediafire-dl https://www.mediafire.com/folder/abc123xyz           # into ./<folder name>
  mediafire-dl https://www.mediafire.com/folder/abc123xyz -o ~/dl   # custom output directory
  mediafire-dl https://www.mediafire.com/folder/abc123xyz -t 4      # at most 4 parallel downloads

Files whose local copy matches the hash reported by the listing are skipped,
so re-running after an interrupt or failure only fetches what is missing or
stale. Ctrl-C stops cleanly: in-flight downloads settle and partial files
are removed.")]
#[command(version)]
struct Cli {
    /// URL of the MediaFire folder to download
    folder_url: String,

    /// Output directory the folder tree is created in
    #[arg(short, long, default_value = ".")]
    output: String,

    /// Number of parallel downloads
    #[arg(short = 't', long = "threads", default_value_t = mediafire_dl::DEFAULT_CONCURRENCY)]
    threads: usize,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("❌ Error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging to stderr
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(if cli.verbose { "debug" } else { "info" }),
    )
    .target(env_logger::Target::Stderr)
    .init();

    if cli.threads == 0 {
        anyhow::bail!("--threads must be at least 1");
    }

    // One token per invocation; Ctrl-C flips it exactly once and every
    // in-flight task converges before the process exits.
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("🛑 Interrupt received, letting in-flight downloads settle...");
                cancel.cancel();
            }
        });
    }

    let folder_url = &cli.folder_url;
    let progress_manager = cli::ProgressManager::new(0, &format!("🌐 Downloading {folder_url}"));

    let options = FetchOptions {
        concurrency: cli.threads,
        cancel: cancel.clone(),
        progress: Some(std::sync::Arc::new({
            let pb = progress_manager.pb.clone();
            move |settled, discovered| {
                if pb.length().unwrap_or(0) != discovered {
                    pb.set_length(discovered);
                }
                pb.set_position(settled);
            }
        })),
    };

    let summary = mediafire_dl::get_with_options(folder_url, Some(&cli.output), options).await?;
    progress_manager.pb.finish_and_clear();

    if cancel.is_cancelled() {
        eprintln!("🛑 Download interrupted: {}", render_summary(&summary));
    } else if summary.failed == 0 {
        eprintln!("✅ All downloads completed: {}", render_summary(&summary));
    } else {
        eprintln!("⚠️  Completed with failures: {}", render_summary(&summary));
    }

    Ok(())
}

fn render_summary(summary: &Summary) -> String {
    format!(
        "{} downloaded, {} skipped, {} refreshed, {} failed, {} cancelled",
        summary.completed, summary.skipped, summary.redownloaded, summary.failed, summary.cancelled
    )
}
