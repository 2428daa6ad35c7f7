use anyhow::Result;
use clap::Parser;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use axsync::batch::{BatchOptions, BatchOrchestrator};
use axsync::cli::ProgressMode;
use axsync::downloader::Downloader;
use axsync::http;
use axsync::listing::DirectoryLister;
use axsync::utils::DEFAULT_FOLDER;

/// Download every file of the directory listings named in a URL list,
/// splitting each file into concurrent range requests.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Text file with one listing URL per line
    #[arg(short = 'i', long)]
    input: PathBuf,

    /// Base directory; each URL gets a subfolder named after its last path segment
    #[arg(short = 'o', long)]
    output: PathBuf,

    /// Number of parallel range requests per file
    #[arg(short = 't', long, default_value = "8")]
    threads: NonZeroUsize,

    /// How download progress is shown
    #[arg(long, value_enum, default_value = "bar")]
    progress: ProgressMode,

    /// Per-request timeout in seconds (no timeout by default)
    #[arg(long)]
    timeout: Option<u64>,

    /// Folder used for URLs without a path
    #[arg(long, default_value = DEFAULT_FOLDER)]
    default_folder: String,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(args.progress.default_log_filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let rt = tokio::runtime::Runtime::new()?;
    let summary = rt.block_on(async {
        let client = http::build_client(args.timeout.map(Duration::from_secs))?;
        let observer = args.progress.observer();

        let batch = BatchOrchestrator::new(
            DirectoryLister::new(client.clone()),
            Downloader::new(client, args.threads, observer.clone()),
            observer,
            BatchOptions {
                output: args.output,
                default_folder: args.default_folder,
            },
        );
        batch.run_file(&args.input).await
    })?;

    println!(
        "\nBatch download complete: {} downloaded, {} failed.",
        summary.downloaded, summary.failed
    );
    Ok(())
}
