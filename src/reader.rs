//! Sequential bounded-size reads over a mailbox archive

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

/// Default read window: 50 MiB
pub const DEFAULT_CHUNK_SIZE: usize = 50 * 1024 * 1024;

/// A byte-range-sliceable source with a known total size.
///
/// The orchestrator issues exactly one `read_range` at a time, in ascending
/// offset order.
pub trait ChunkSource {
    /// Total size of the source in bytes
    fn len(&self) -> u64;

    /// Whether the source has no bytes at all
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read up to `len` bytes starting at `offset`.
    ///
    /// A short read is only valid at end of source.
    fn read_range(&mut self, offset: u64, len: usize) -> io::Result<Vec<u8>>;
}

/// Chunk source over a file on disk
#[derive(Debug)]
pub struct FileSource {
    file: File,
    size: u64,
}

impl FileSource {
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = File::open(path)?;
        let size = file.metadata()?.len();
        Ok(Self { file, size })
    }
}

impl ChunkSource for FileSource {
    fn len(&self) -> u64 {
        self.size
    }

    fn read_range(&mut self, offset: u64, len: usize) -> io::Result<Vec<u8>> {
        self.file.seek(SeekFrom::Start(offset))?;
        let mut buf = vec![0u8; len];
        let mut filled = 0;
        while filled < len {
            let n = self.file.read(&mut buf[filled..])?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        buf.truncate(filled);
        Ok(buf)
    }
}

/// Chunk source over an in-memory buffer
#[derive(Debug, Clone)]
pub struct MemorySource {
    data: Vec<u8>,
}

impl MemorySource {
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self { data: data.into() }
    }
}

impl ChunkSource for MemorySource {
    fn len(&self) -> u64 {
        self.data.len() as u64
    }

    fn read_range(&mut self, offset: u64, len: usize) -> io::Result<Vec<u8>> {
        let start = usize::try_from(offset)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "offset out of range"))?;
        let start = start.min(self.data.len());
        let end = start.saturating_add(len).min(self.data.len());
        Ok(self.data[start..end].to_vec())
    }
}
