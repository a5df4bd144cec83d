//! Read-only memory map of a reader's snapshot
//!
//! 读取器快照的只读内存映射

use memmap2::Mmap;
use std::marker::PhantomData;
use std::ops::Deref;

/// Zero-copy view of `[0, snapshot)`, borrowed from a [`Reader`](super::Reader)
///
/// `[0, snapshot)` 的零拷贝视图，借用自 [`Reader`](super::Reader)
///
/// # Examples
///
/// ```
/// # use shared_file::{SharedFile, Result};
/// # use tempfile::tempdir;
/// # fn main() -> Result<()> {
/// # let dir = tempdir()?;
/// # let path = dir.path().join("map.bin");
/// let file = SharedFile::open(&path)?;
/// file.append(b"hello world")?;
///
/// let reader = file.reader()?;
/// let map = reader.map()?;
/// assert_eq!(&map[..5], b"hello");
/// # Ok(())
/// # }
/// ```
pub struct SnapshotMap<'r> {
    mmap: Mmap,
    _reader: PhantomData<&'r ()>,
}

impl SnapshotMap<'_> {
    pub(crate) fn new(mmap: Mmap) -> Self {
        Self {
            mmap,
            _reader: PhantomData,
        }
    }

    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.mmap
    }
}

impl Deref for SnapshotMap<'_> {
    type Target = [u8];

    #[inline]
    fn deref(&self) -> &[u8] {
        &self.mmap
    }
}

impl AsRef<[u8]> for SnapshotMap<'_> {
    #[inline]
    fn as_ref(&self) -> &[u8] {
        &self.mmap
    }
}

impl std::fmt::Debug for SnapshotMap<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotMap")
            .field("len", &self.mmap.len())
            .field("mmap", &"Mmap")
            .finish()
    }
}
