use std::fmt;
use std::num::NonZeroUsize;

/// Inclusive byte range `[start, end]` of a remote resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    start: u64,
    end: u64,
}

impl ByteRange {
    /// Panics if `end < start`; a range always holds at least one byte.
    pub fn new(start: u64, end: u64) -> Self {
        assert!(start <= end, "inverted range {}-{}", start, end);
        Self { start, end }
    }

    pub fn start(&self) -> u64 {
        self.start
    }

    pub fn end(&self) -> u64 {
        self.end
    }

    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// Value for the `Range` request header.
    pub fn header_value(&self) -> String {
        format!("bytes={}-{}", self.start, self.end)
    }
}

impl fmt::Display for ByteRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Splits `[0, total_size - 1]` into at most `threads` contiguous ranges.
///
/// Every range but the last is `total_size / threads` bytes long; the last one
/// absorbs the remainder. When the file has fewer bytes than there are threads
/// each byte gets its own range, and an empty file yields no ranges at all.
pub fn partition(total_size: u64, threads: NonZeroUsize) -> Vec<ByteRange> {
    if total_size == 0 {
        return vec![];
    }

    let count = (threads.get() as u64).min(total_size);
    let part_size = total_size / count;
    let mut ranges = Vec::with_capacity(count as usize);

    for i in 0..count {
        let start = i * part_size;
        let end = if i == count - 1 {
            total_size - 1
        } else {
            (i + 1) * part_size - 1
        };
        ranges.push(ByteRange::new(start, end));
    }

    ranges
}
