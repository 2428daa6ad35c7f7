pub mod artifact;
pub mod batch;
pub mod cli;
pub mod downloader;
pub mod error;
pub mod fetcher;
pub mod http;
pub mod listing;
pub mod progress;
pub mod range;
pub mod reassemble;
pub mod utils;

#[cfg(test)]
mod test_server;
