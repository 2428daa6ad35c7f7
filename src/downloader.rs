use anyhow::{Context, Result};
use futures::stream::{FuturesUnordered, StreamExt};
use reqwest::Client;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::Semaphore;
use tracing::{debug, info};

use crate::artifact::ArtifactId;
use crate::fetcher;
use crate::http;
use crate::progress::{ProgressObserver, ProgressState};
use crate::range::{partition, ByteRange};
use crate::reassemble::reassemble;

/// One file to download, fixed once its size is known.
#[derive(Debug, Clone)]
pub struct DownloadTask {
    pub url: String,
    pub destination: PathBuf,
    pub total_size: u64,
    pub threads: NonZeroUsize,
}

impl DownloadTask {
    pub fn ranges(&self) -> Vec<ByteRange> {
        partition(self.total_size, self.threads)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadReport {
    pub destination: PathBuf,
    pub bytes: u64,
    pub chunks: usize,
}

pub struct Downloader {
    client: Client,
    threads: NonZeroUsize,
    observer: Arc<dyn ProgressObserver>,
}

impl Downloader {
    pub fn new(client: Client, threads: NonZeroUsize, observer: Arc<dyn ProgressObserver>) -> Self {
        Self {
            client,
            threads,
            observer,
        }
    }

    /// Downloads `url` to `destination` with one ranged request per chunk.
    ///
    /// Fails on the first chunk that fails. Chunks already in flight keep
    /// running and their part files are left behind.
    pub async fn download_file(&self, url: &str, destination: &Path) -> Result<DownloadReport> {
        let total_size = http::probe_size(&self.client, url)
            .await
            .with_context(|| format!("Failed to query size of {}", url))?;

        if let Some(parent) = destination.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .await
                    .with_context(|| format!("Failed to create directory {:?}", parent))?;
            }
        }

        let task = DownloadTask {
            url: url.to_string(),
            destination: destination.to_path_buf(),
            total_size,
            threads: self.threads,
        };
        self.run(task).await
    }

    async fn run(&self, task: DownloadTask) -> Result<DownloadReport> {
        let name = display_name(&task.destination);
        let ranges = task.ranges();
        let mut state = ProgressState::new(task.total_size, ranges.len());
        debug!(file = %name, size = task.total_size, chunks = ranges.len(), "partitioned");
        self.observer.on_start(&name, &state);

        let pool = Arc::new(Semaphore::new(task.threads.get()));
        let url: Arc<str> = Arc::from(task.url.as_str());
        let mut pending = FuturesUnordered::new();

        for (index, range) in ranges.into_iter().enumerate() {
            let client = self.client.clone();
            let url = url.clone();
            let pool = pool.clone();
            let id = ArtifactId::new(&task.destination, index);

            pending.push(tokio::spawn(async move {
                let _permit = pool.acquire_owned().await.ok();
                fetcher::fetch_chunk(&client, &url, range, id).await
            }));
        }

        // Only this loop touches `state`; workers just return their artifact.
        let mut artifacts = Vec::with_capacity(state.chunks_total);
        while let Some(joined) = pending.next().await {
            let artifact = joined
                .context("Chunk task panicked")?
                .with_context(|| format!("Failed to download chunk of {}", task.url))?;

            state.advance(artifact.size);
            self.observer.on_chunk(&name, &state);
            artifacts.push(artifact);
        }

        let chunks = artifacts.len();
        let bytes = reassemble(&task.destination, artifacts)
            .await
            .with_context(|| format!("Failed to reassemble {:?}", task.destination))?;

        self.observer.on_complete(&name, &state);
        info!(file = %name, bytes, chunks, "downloaded");

        Ok(DownloadReport {
            destination: task.destination,
            bytes,
            chunks,
        })
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
