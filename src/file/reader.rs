//! Snapshot-bounded reader cursor
//!
//! 受快照限制的读取游标

use super::error::{Error, Result};
use super::lease::SharedLease;
use super::snapshot::SnapshotMap;
use super::sys;
use memmap2::MmapOptions;
use std::io::{self, Read, Seek, SeekFrom};

/// Reader over a [`SharedFile`](super::SharedFile)
///
/// [`SharedFile`](super::SharedFile) 上的读取器
///
/// Holds the primary lock shared. The file length is captured when the reader
/// is created and every read is bounded by it, so bytes appended afterwards
/// are never observed, not even a partially written tail.
///
/// 共享持有主锁。文件长度在读取器创建时被捕获，所有读取都受其限制，
/// 因此之后追加的字节（包括部分写入的尾部）永远不会被看到。
///
/// Implements [`Read`] and [`Seek`]; the inherent methods return the crate
/// [`Error`] directly.
///
/// 实现了 [`Read`] 和 [`Seek`]；固有方法直接返回 crate 的 [`Error`]。
pub struct Reader<'a> {
    lease: Option<SharedLease<'a>>,
    offset: i64,
    snapshot: u64,
}

impl<'a> Reader<'a> {
    /// Offset of a reader that was seeked to just before the first byte
    ///
    /// 定位到第一个字节之前的读取器偏移
    ///
    /// [`seek`](Self::seek) accepts it as the one target below zero. A reader
    /// in this state fails [`read`](Self::read) with [`Error::InvalidRange`]
    /// until it is seeked forward again.
    ///
    /// [`seek`](Self::seek) 接受它作为唯一低于零的目标。处于该状态的读取器调用
    /// [`read`](Self::read) 会返回 [`Error::InvalidRange`]，直到再次向前定位。
    pub const UNPOSITIONED: i64 = -1;

    pub(crate) fn new(lease: SharedLease<'a>, offset: u64, snapshot: u64) -> Self {
        Self {
            lease: Some(lease),
            offset: i64::try_from(offset).unwrap_or(i64::MAX),
            snapshot,
        }
    }

    /// The lease, provided neither the reader nor the file has been closed
    ///
    /// 租约，前提是读取器和文件都未关闭
    fn live(&self) -> Result<&SharedLease<'a>> {
        let lease = self.lease.as_ref().ok_or(Error::Closed)?;
        if lease.file().is_closed() {
            return Err(Error::Closed);
        }
        Ok(lease)
    }

    /// Read at the current offset and advance it
    ///
    /// 在当前偏移处读取并前移偏移
    ///
    /// Returns `Ok(0)` once the snapshot boundary is reached, even if the file
    /// has grown since.
    ///
    /// 到达快照边界时返回 `Ok(0)`，即使文件此后已增长。
    ///
    /// # Errors
    /// - [`Error::Closed`] if the reader or the file was closed
    /// - [`Error::InvalidRange`] while the reader is [`UNPOSITIONED`](Self::UNPOSITIONED)
    ///
    /// # Errors
    /// - 读取器或文件已关闭时返回 [`Error::Closed`]
    /// - 读取器处于 [`UNPOSITIONED`](Self::UNPOSITIONED) 时返回 [`Error::InvalidRange`]
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.live()?;
        let offset = u64::try_from(self.offset).map_err(|_| Error::InvalidRange {
            offset: i128::from(self.offset),
            size: self.snapshot,
        })?;
        let n = self.read_at(buf, offset)?;
        self.offset += n as i64;
        Ok(n)
    }

    /// Read at `offset` without moving the cursor
    ///
    /// 在 `offset` 处读取，不移动游标
    pub fn read_at(&self, buf: &mut [u8], offset: u64) -> Result<usize> {
        let lease = self.live()?;
        let file = lease.file().descriptor()?;
        if offset >= self.snapshot || buf.is_empty() {
            return Ok(0);
        }
        let visible = usize::try_from(self.snapshot - offset).unwrap_or(usize::MAX);
        let len = buf.len().min(visible);
        Ok(sys::read_full_at(&file, &mut buf[..len], offset)?)
    }

    /// Move the cursor; `SeekFrom::End` is relative to the snapshot length
    ///
    /// 移动游标；`SeekFrom::End` 相对于快照长度
    ///
    /// Valid targets are `[0, snapshot]` plus [`UNPOSITIONED`](Self::UNPOSITIONED).
    ///
    /// 有效目标为 `[0, snapshot]` 以及 [`UNPOSITIONED`](Self::UNPOSITIONED)。
    ///
    /// # Errors
    /// - [`Error::InvalidRange`] for any other target; the offset is left unchanged
    ///
    /// # Errors
    /// - 其他目标返回 [`Error::InvalidRange`]，偏移保持不变
    pub fn seek(&mut self, pos: SeekFrom) -> Result<i64> {
        self.live()?;
        let target = self.target(pos);
        if target < i128::from(Self::UNPOSITIONED) || target > i128::from(self.snapshot) {
            return Err(Error::InvalidRange {
                offset: target,
                size: self.snapshot,
            });
        }
        self.offset = target as i64;
        Ok(self.offset)
    }

    fn target(&self, pos: SeekFrom) -> i128 {
        match pos {
            SeekFrom::Start(n) => i128::from(n),
            SeekFrom::Current(delta) => i128::from(self.offset) + i128::from(delta),
            SeekFrom::End(delta) => i128::from(self.snapshot) + i128::from(delta),
        }
    }

    /// Current offset, [`UNPOSITIONED`](Self::UNPOSITIONED) included
    ///
    /// 当前偏移，可能为 [`UNPOSITIONED`](Self::UNPOSITIONED)
    #[inline]
    pub fn position(&self) -> i64 {
        self.offset
    }

    /// File length captured when the reader was created
    ///
    /// 读取器创建时捕获的文件长度
    #[inline]
    pub fn snapshot_len(&self) -> u64 {
        self.snapshot
    }

    /// Map `[0, snapshot)` read-only
    ///
    /// 只读映射 `[0, snapshot)`
    ///
    /// The map borrows the reader, so the shared lock outlives it and the file
    /// cannot be truncated through this handle while it is alive.
    ///
    /// 映射借用读取器，因此共享锁比映射存活更久，映射存活期间无法通过本句柄截断文件。
    ///
    /// # Errors
    /// - [`Error::EmptyFile`] if the snapshot is empty
    ///
    /// # Errors
    /// - 快照为空时返回 [`Error::EmptyFile`]
    pub fn map(&self) -> Result<SnapshotMap<'_>> {
        let lease = self.live()?;
        let file = lease.file().descriptor()?;
        if self.snapshot == 0 {
            return Err(Error::EmptyFile);
        }
        let len = usize::try_from(self.snapshot).map_err(|_| Error::InvalidRange {
            offset: i128::from(self.snapshot),
            size: self.snapshot,
        })?;

        // Safety: the shared lock held by this reader excludes truncation
        // through the handle for as long as the map borrows the reader.
        let mmap = unsafe { MmapOptions::new().len(len).map(&*file)? };

        Ok(SnapshotMap::new(mmap))
    }

    /// Release the shared lock
    ///
    /// 释放共享锁
    ///
    /// # Errors
    /// - [`Error::Closed`] on a second call
    ///
    /// # Errors
    /// - 第二次调用时返回 [`Error::Closed`]
    pub fn close(&mut self) -> Result<()> {
        let lease = self.lease.take().ok_or(Error::Closed)?;
        drop(lease);
        Ok(())
    }

    /// Whether [`close`](Self::close) has been called
    ///
    /// 是否已调用 [`close`](Self::close)
    #[inline]
    pub fn is_closed(&self) -> bool {
        self.lease.is_none()
    }
}

impl Read for Reader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Ok(Reader::read(self, buf)?)
    }
}

// std callers never see the unpositioned state.
impl Seek for Reader<'_> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.live()?;
        let target = self.target(pos);
        if target < 0 {
            return Err(Error::InvalidRange {
                offset: target,
                size: self.snapshot,
            }
            .into());
        }
        Ok(Reader::seek(self, pos)? as u64)
    }
}

impl std::fmt::Debug for Reader<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reader")
            .field("offset", &self.offset)
            .field("snapshot", &self.snapshot)
            .field("closed", &self.is_closed())
            .finish()
    }
}
