use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};

use crate::downloader::Downloader;
use crate::listing::DirectoryLister;
use crate::progress::ProgressObserver;
use crate::utils::{folder_name_for_url, DEFAULT_FOLDER};

#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub output: PathBuf,
    pub default_folder: String,
}

impl BatchOptions {
    pub fn new(output: impl Into<PathBuf>) -> Self {
        Self {
            output: output.into(),
            default_folder: DEFAULT_FOLDER.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub sources: usize,
    pub downloaded: usize,
    pub failed: usize,
    pub bytes: u64,
}

/// Reads source URLs from a list file: one per line, blank lines and `#`
/// comments ignored.
pub async fn read_url_list(path: &Path) -> Result<Vec<String>> {
    let file = fs::File::open(path)
        .await
        .with_context(|| format!("Failed to open input file: {:?}", path))?;
    let mut lines = BufReader::new(file).lines();
    let mut urls = vec![];

    while let Some(line) = lines.next_line().await? {
        let raw = line.trim();
        if raw.is_empty() || raw.starts_with('#') {
            continue;
        }
        urls.push(raw.to_string());
    }
    Ok(urls)
}

pub struct BatchOrchestrator {
    lister: DirectoryLister,
    downloader: Downloader,
    observer: Arc<dyn ProgressObserver>,
    options: BatchOptions,
}

impl BatchOrchestrator {
    pub fn new(
        lister: DirectoryLister,
        downloader: Downloader,
        observer: Arc<dyn ProgressObserver>,
        options: BatchOptions,
    ) -> Self {
        Self {
            lister,
            downloader,
            observer,
            options,
        }
    }

    /// Downloads every source listed in `input`.
    pub async fn run_file(&self, input: &Path) -> Result<BatchSummary> {
        let urls = read_url_list(input).await?;
        self.run(&urls).await
    }

    /// Downloads every file listed under each source URL, one file at a time.
    ///
    /// A file that fails is reported and counted; the batch carries on.
    pub async fn run(&self, urls: &[String]) -> Result<BatchSummary> {
        let mut summary = BatchSummary::default();

        for url in urls {
            let folder = folder_name_for_url(url, &self.options.default_folder);
            let destination = self.options.output.join(&folder);
            fs::create_dir_all(&destination)
                .await
                .with_context(|| format!("Failed to create output directory {:?}", destination))?;

            summary.sources += 1;
            self.observer.on_source(&folder, url, &destination);

            for file in self.lister.list(url).await {
                let path = destination.join(&file.name);
                match self.downloader.download_file(&file.url, &path).await {
                    Ok(report) => {
                        summary.downloaded += 1;
                        summary.bytes += report.bytes;
                    }
                    Err(e) => {
                        summary.failed += 1;
                        error!(file = %file.name, url = %file.url, "download failed: {:#}", e);
                        self.observer.on_failure(&file.name, &e);
                    }
                }
            }
        }

        info!(
            sources = summary.sources,
            downloaded = summary.downloaded,
            failed = summary.failed,
            "batch finished"
        );
        Ok(summary)
    }
}
