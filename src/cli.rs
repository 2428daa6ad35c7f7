use clap::ValueEnum;
use std::sync::Arc;

use crate::progress::{BarObserver, LogObserver, ProgressObserver, SilentObserver};

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProgressMode {
    Bar,
    Log,
    Silent,
}

impl ProgressMode {
    pub fn observer(self) -> Arc<dyn ProgressObserver> {
        match self {
            ProgressMode::Bar => Arc::new(BarObserver::new()),
            ProgressMode::Log => Arc::new(LogObserver),
            ProgressMode::Silent => Arc::new(SilentObserver),
        }
    }

    /// Log filter used when `RUST_LOG` is not set.
    pub fn default_log_filter(self) -> &'static str {
        match self {
            ProgressMode::Log => "info",
            ProgressMode::Bar | ProgressMode::Silent => "warn",
        }
    }
}
