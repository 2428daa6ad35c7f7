use anyhow::{Context, Result};
use reqwest::{header, Client, RequestBuilder};
use std::time::Duration;

use crate::error::{FetchError, FetchResult};

pub const USER_AGENT: &str = concat!("axsync/", env!("CARGO_PKG_VERSION"));

/// Builds the client shared by the lister, the size query and every chunk fetch.
///
/// No timeout is set unless one is asked for: a stalled server stalls its file.
pub fn build_client(timeout: Option<Duration>) -> Result<Client> {
    let mut builder = Client::builder().user_agent(USER_AGENT);
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder.build().context("Failed to build HTTP client")
}

// Compressed bodies would not match the declared length or the requested range.
pub fn get(client: &Client, url: &str) -> RequestBuilder {
    client.get(url).header(header::ACCEPT_ENCODING, "identity")
}

pub fn head(client: &Client, url: &str) -> RequestBuilder {
    client.head(url).header(header::ACCEPT_ENCODING, "identity")
}

/// Asks the server for the size of `url` without downloading it.
///
/// A missing or unparsable `content-length` counts as an empty file.
pub async fn probe_size(client: &Client, url: &str) -> FetchResult<u64> {
    let response = head(client, url).send().await?;
    if !response.status().is_success() {
        return Err(FetchError::Status {
            status: response.status(),
            url: url.to_string(),
        });
    }

    // Read the header itself: the body size hint of a HEAD response is always 0.
    let size = response
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(0);

    Ok(size)
}
