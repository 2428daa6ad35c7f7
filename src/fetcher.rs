use futures::TryStreamExt;
use reqwest::{header, Client};
use std::io;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_util::io::StreamReader;
use tracing::debug;

use crate::artifact::{ArtifactId, ChunkArtifact};
use crate::error::{FetchError, FetchResult};
use crate::http;
use crate::range::ByteRange;

pub const READ_BUFFER_SIZE: usize = 8 * 1024;

/// Downloads `range` of `url` into the artifact file named by `id`.
///
/// The body is copied in `READ_BUFFER_SIZE` steps and must be exactly
/// `range.len()` bytes long. Reading stops as soon as the body runs past the
/// range, so a server that ignores `Range` is not streamed to the end.
pub async fn fetch_chunk(
    client: &Client,
    url: &str,
    range: ByteRange,
    id: ArtifactId,
) -> FetchResult<ChunkArtifact> {
    let response = http::get(client, url)
        .header(header::RANGE, range.header_value())
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(FetchError::Status {
            status: response.status(),
            url: url.to_string(),
        });
    }

    let stream = response
        .bytes_stream()
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e));
    let mut body = StreamReader::new(stream);

    let path = id.path();
    let mut file = File::create(&path).await?;
    let mut buffer = [0u8; READ_BUFFER_SIZE];
    let mut received: u64 = 0;

    loop {
        let n = body.read(&mut buffer).await.map_err(unwrap_transport_error)?;
        if n == 0 {
            break;
        }
        if received + n as u64 > range.len() {
            return Err(FetchError::Oversized {
                expected: range.len(),
                received: received + n as u64,
            });
        }
        file.write_all(&buffer[..n]).await?;
        received += n as u64;
    }
    file.flush().await?;

    if received != range.len() {
        return Err(FetchError::Truncated {
            expected: range.len(),
            received,
        });
    }

    debug!(index = id.index(), %range, path = %path.display(), "chunk written");
    Ok(ChunkArtifact { id, size: received })
}

// Body errors arrive wrapped in io::Error by the stream adapter.
fn unwrap_transport_error(e: io::Error) -> FetchError {
    if !e.get_ref().map_or(false, |inner| inner.is::<reqwest::Error>()) {
        return FetchError::Io(e);
    }
    match e.into_inner().map(|inner| inner.downcast::<reqwest::Error>()) {
        Some(Ok(err)) => FetchError::from(*err),
        Some(Err(other)) => FetchError::Io(io::Error::new(io::ErrorKind::Other, other)),
        None => FetchError::Io(io::Error::from(io::ErrorKind::Other)),
    }
}
