use std::ffi::OsString;
use std::path::PathBuf;

/// Identity of one temporary chunk file: the download it belongs to and its
/// position in the partition.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactId {
    destination: PathBuf,
    index: usize,
}

impl ArtifactId {
    pub fn new(destination: impl Into<PathBuf>, index: usize) -> Self {
        Self {
            destination: destination.into(),
            index,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// `<destination>.part<index>`, next to the final file.
    pub fn path(&self) -> PathBuf {
        let mut name = OsString::from(self.destination.as_os_str());
        name.push(format!(".part{}", self.index));
        PathBuf::from(name)
    }
}

/// A chunk that has been fully written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkArtifact {
    pub id: ArtifactId,
    pub size: u64,
}

impl ChunkArtifact {
    pub fn path(&self) -> PathBuf {
        self.id.path()
    }
}
