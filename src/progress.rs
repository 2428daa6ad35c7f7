//! Progress reporting for downloads.
//!
//! The downloader owns a [`ProgressState`] per file and hands snapshots of it
//! to a [`ProgressObserver`]. Which observer is used decides how progress is
//! shown: a terminal bar, log lines, or nothing at all.

use indicatif::{HumanBytes, MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::path::Path;
use std::sync::Mutex;
use tracing::info;

/// Bytes received so far for one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProgressState {
    pub total: u64,
    pub received: u64,
    pub chunks_total: usize,
    pub chunks_done: usize,
}

impl ProgressState {
    pub fn new(total: u64, chunks_total: usize) -> Self {
        Self {
            total,
            received: 0,
            chunks_total,
            chunks_done: 0,
        }
    }

    /// Records one finished chunk of `bytes` bytes.
    pub fn advance(&mut self, bytes: u64) {
        self.received += bytes;
        self.chunks_done += 1;
    }

    pub fn is_complete(&self) -> bool {
        self.chunks_done == self.chunks_total && self.received == self.total
    }
}

/// Receives download lifecycle events. Every method has an empty default.
pub trait ProgressObserver: Send + Sync {
    /// A source URL is about to be listed and downloaded into `destination`.
    fn on_source(&self, _folder: &str, _url: &str, _destination: &Path) {}

    /// Size is known and chunks are about to be dispatched.
    fn on_start(&self, _name: &str, _state: &ProgressState) {}

    /// A chunk finished; `state` already includes it.
    fn on_chunk(&self, _name: &str, _state: &ProgressState) {}

    fn on_complete(&self, _name: &str, _state: &ProgressState) {}

    fn on_failure(&self, _name: &str, _error: &anyhow::Error) {}
}

/// Terminal progress bars drawn on stderr.
pub struct BarObserver {
    multi_progress: MultiProgress,
    current: Mutex<Option<ProgressBar>>,
}

impl BarObserver {
    pub fn new() -> Self {
        let multi_progress = MultiProgress::new();
        multi_progress.set_draw_target(ProgressDrawTarget::stderr_with_hz(5));
        Self {
            multi_progress,
            current: Mutex::new(None),
        }
    }

    fn style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes:>12}/{total_bytes:<12} {bytes_per_sec:>12} {eta:>4} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-")
    }

    fn take_bar(&self) -> Option<ProgressBar> {
        self.current.lock().ok().and_then(|mut slot| slot.take())
    }
}

impl Default for BarObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressObserver for BarObserver {
    fn on_source(&self, folder: &str, url: &str, destination: &Path) {
        let _ = self.multi_progress.println(format!(
            "\nDownloading folder: {}\nURL: {}\nDestination: {}",
            folder,
            url,
            destination.display()
        ));
    }

    fn on_start(&self, name: &str, state: &ProgressState) {
        let pb = self.multi_progress.add(ProgressBar::new(state.total));
        pb.set_style(Self::style());
        pb.set_message(format!("Downloading {}", name));
        if let Ok(mut slot) = self.current.lock() {
            *slot = Some(pb);
        }
    }

    fn on_chunk(&self, _name: &str, state: &ProgressState) {
        if let Ok(slot) = self.current.lock() {
            if let Some(pb) = slot.as_ref() {
                pb.set_position(state.received);
            }
        }
    }

    fn on_complete(&self, name: &str, state: &ProgressState) {
        if let Some(pb) = self.take_bar() {
            pb.set_position(state.received);
            pb.finish_with_message(format!("Completed   {}", name));
        }
    }

    fn on_failure(&self, name: &str, error: &anyhow::Error) {
        if let Some(pb) = self.take_bar() {
            pb.abandon_with_message(format!("Failed      {}", name));
        }
        self.multi_progress
            .suspend(|| eprintln!("Failed to download {}: {:#}", name, error));
    }
}

/// Progress as `tracing` events, one line per chunk. Failures are already
/// logged by the batch itself.
#[derive(Debug, Default)]
pub struct LogObserver;

impl ProgressObserver for LogObserver {
    fn on_source(&self, folder: &str, url: &str, destination: &Path) {
        info!(folder, url, destination = %destination.display(), "listing source");
    }

    fn on_start(&self, name: &str, state: &ProgressState) {
        info!(file = name, size = %HumanBytes(state.total), chunks = state.chunks_total, "download started");
    }

    fn on_chunk(&self, name: &str, state: &ProgressState) {
        info!(
            file = name,
            "{}/{} chunks, {} / {}",
            state.chunks_done,
            state.chunks_total,
            HumanBytes(state.received),
            HumanBytes(state.total)
        );
    }

    fn on_complete(&self, name: &str, state: &ProgressState) {
        info!(file = name, size = %HumanBytes(state.received), "download completed");
    }
}

#[derive(Debug, Default)]
pub struct SilentObserver;

impl ProgressObserver for SilentObserver {}
