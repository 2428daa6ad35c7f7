use anyhow::{bail, Context, Result};
use std::path::Path;
use tokio::fs::{self, File};
use tokio::io::{AsyncWriteExt, BufWriter};

use crate::artifact::ChunkArtifact;

/// Concatenates `artifacts` into `destination` in ordinal order, deleting each
/// artifact as soon as it has been copied. Returns the number of bytes written.
///
/// Artifacts may be passed in completion order; the caller must only call this
/// once every chunk of the download has finished.
pub async fn reassemble(destination: &Path, mut artifacts: Vec<ChunkArtifact>) -> Result<u64> {
    artifacts.sort_by_key(|a| a.id.index());
    for (expected, artifact) in artifacts.iter().enumerate() {
        if artifact.id.index() != expected {
            bail!(
                "Missing chunk {} for {:?} (found chunk {})",
                expected,
                destination,
                artifact.id.index()
            );
        }
    }

    let file = File::create(destination)
        .await
        .with_context(|| format!("Failed to create {:?}", destination))?;
    let mut out = BufWriter::new(file);
    let mut written = 0u64;

    for artifact in &artifacts {
        let path = artifact.path();
        let mut part = File::open(&path)
            .await
            .with_context(|| format!("Failed to open chunk {:?}", path))?;
        written += tokio::io::copy(&mut part, &mut out)
            .await
            .with_context(|| format!("Failed to append chunk {:?}", path))?;
        drop(part);
        fs::remove_file(&path)
            .await
            .with_context(|| format!("Failed to remove chunk {:?}", path))?;
    }

    out.flush().await.context("Failed to flush reassembled file")?;
    Ok(written)
}
