//! Exclusive positioned writer cursor
//!
//! 独占的定位写入游标

use super::error::{Error, Result};
use super::lease::ExclusiveLease;
use super::sys;
use std::io::{self, Seek, SeekFrom, Write};

/// Writer over a [`SharedFile`](super::SharedFile)
///
/// [`SharedFile`](super::SharedFile) 上的写入器
///
/// Holds the primary lock exclusively for its whole lifetime: no reader,
/// appender or other writer runs while it is open. On close the cached file
/// size is reloaded from the descriptor.
///
/// 在整个生命周期内独占主锁：打开期间没有读取器、追加器或其他写入器运行。
/// 关闭时从描述符重新加载缓存的文件大小。
///
/// Dropping an unclosed writer closes it; errors are logged and discarded.
///
/// 未关闭的写入器在释放时会被关闭；错误会被记录并丢弃。
///
/// # Examples
///
/// ```
/// # use shared_file::{SharedFile, Result};
/// # use tempfile::tempdir;
/// # fn main() -> Result<()> {
/// # let dir = tempdir()?;
/// # let path = dir.path().join("writer.bin");
/// let file = SharedFile::open(&path)?;
///
/// let mut writer = file.writer_at(0)?;
/// writer.write(b"hello")?;
/// writer.write_at(b"J", 0)?;
/// writer.close()?;
///
/// let mut buf = [0u8; 5];
/// file.read_at(&mut buf, 0)?;
/// assert_eq!(&buf, b"Jello");
/// assert_eq!(file.size(), 5);
/// # Ok(())
/// # }
/// ```
pub struct Writer<'a> {
    lease: Option<ExclusiveLease<'a>>,
    offset: u64,
}

impl<'a> Writer<'a> {
    pub(crate) fn new(lease: ExclusiveLease<'a>, offset: u64) -> Self {
        Self {
            lease: Some(lease),
            offset,
        }
    }

    /// Write at the current offset and advance it
    ///
    /// 在当前偏移处写入并前移偏移
    pub fn write(&mut self, buf: &[u8]) -> Result<usize> {
        let lease = self.lease.as_ref().ok_or(Error::Closed)?;
        let file = lease.file().descriptor()?;
        let n = (&*file).write(buf)?;
        self.offset += n as u64;
        Ok(n)
    }

    /// Write the whole buffer at the current offset
    ///
    /// 在当前偏移处写入整个缓冲区
    pub fn write_all(&mut self, mut buf: &[u8]) -> Result<()> {
        while !buf.is_empty() {
            match self.write(buf) {
                Ok(0) => return Err(io::Error::from(io::ErrorKind::WriteZero).into()),
                Ok(n) => buf = &buf[n..],
                Err(Error::Io(err)) if err.kind() == io::ErrorKind::Interrupted => {}
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }

    /// Write at `offset` without moving the cursor
    ///
    /// 在 `offset` 处写入，不移动游标
    pub fn write_at(&mut self, buf: &[u8], offset: u64) -> Result<usize> {
        let lease = self.lease.as_ref().ok_or(Error::Closed)?;
        let file = lease.file().descriptor()?;
        let n = sys::write_at(&file, buf, offset)?;
        #[cfg(windows)]
        (&*file).seek(SeekFrom::Start(self.offset))?;
        Ok(n)
    }

    /// Move the descriptor's cursor
    ///
    /// 移动描述符的游标
    pub fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        let lease = self.lease.as_ref().ok_or(Error::Closed)?;
        let file = lease.file().descriptor()?;
        self.offset = (&*file).seek(pos)?;
        Ok(self.offset)
    }

    /// Current offset
    ///
    /// 当前偏移
    #[inline]
    pub fn position(&self) -> u64 {
        self.offset
    }

    /// Reload the cached size and release the exclusive lock
    ///
    /// 重新加载缓存大小并释放独占锁
    ///
    /// Syncs first when [`Options::sync_on_writer_close`](super::Options::sync_on_writer_close)
    /// is set. If syncing or reading the length fails the error is returned,
    /// the cached size keeps its previous value and the lock is still released.
    ///
    /// 设置了 [`Options::sync_on_writer_close`](super::Options::sync_on_writer_close)
    /// 时会先同步。如果同步或读取长度失败，返回错误，缓存大小保持原值，锁仍会被释放。
    ///
    /// # Errors
    /// - [`Error::Closed`] on a second call
    ///
    /// # Errors
    /// - 第二次调用时返回 [`Error::Closed`]
    pub fn close(&mut self) -> Result<()> {
        let lease = self.lease.take().ok_or(Error::Closed)?;
        let reconciled = lease.file().reconcile();
        drop(lease);
        reconciled
    }

    /// Whether [`close`](Self::close) has been called
    ///
    /// 是否已调用 [`close`](Self::close)
    #[inline]
    pub fn is_closed(&self) -> bool {
        self.lease.is_none()
    }
}

impl Write for Writer<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(Writer::write(self, buf)?)
    }

    fn flush(&mut self) -> io::Result<()> {
        match &self.lease {
            Some(lease) if !lease.file().is_closed() => Ok(()),
            _ => Err(Error::Closed.into()),
        }
    }
}

impl Seek for Writer<'_> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        Ok(Writer::seek(self, pos)?)
    }
}

impl Drop for Writer<'_> {
    fn drop(&mut self) {
        if self.lease.is_some() {
            if let Err(err) = self.close() {
                tracing::warn!(error = %err, "failed to close dropped writer");
            }
        }
    }
}

impl std::fmt::Debug for Writer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Writer")
            .field("offset", &self.offset)
            .field("closed", &self.is_closed())
            .finish()
    }
}
