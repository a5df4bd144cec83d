//! Append-only cursor that runs alongside readers
//!
//! 可与读取器并行运行的仅追加游标

use super::error::{Error, Result};
use super::lease::AppendLease;
use super::sys;
use std::io::{self, Write};

/// Appender over a [`SharedFile`](super::SharedFile)
///
/// [`SharedFile`](super::SharedFile) 上的追加器
///
/// Holds the primary lock shared and the append lock exclusively. Appenders are
/// serialized among themselves, excluded by writers, and run concurrently with
/// readers. Every successful write grows the cached size, so readers created
/// afterwards see the new bytes while existing readers keep their snapshot.
///
/// 共享持有主锁并独占持有追加锁。追加器之间串行执行，与写入器互斥，
/// 与读取器并发运行。每次成功写入都会增加缓存大小，
/// 因此之后创建的读取器能看到新字节，而已有读取器保持其快照。
///
/// Writes are positioned at the tracked end of file and never depend on the
/// descriptor's cursor.
///
/// 写入定位在跟踪的文件末尾，从不依赖描述符的游标。
pub struct Appender<'a> {
    lease: Option<AppendLease<'a>>,
    end: u64,
}

impl<'a> Appender<'a> {
    pub(crate) fn new(lease: AppendLease<'a>, end: u64) -> Self {
        Self {
            lease: Some(lease),
            end,
        }
    }

    /// Append `buf` at end of file
    ///
    /// 在文件末尾追加 `buf`
    pub fn write(&mut self, buf: &[u8]) -> Result<usize> {
        let lease = self.lease.as_ref().ok_or(Error::Closed)?;
        let shared = lease.file();
        let n = {
            let file = shared.descriptor()?;
            sys::write_at(&file, buf, self.end)?
        };
        self.end += n as u64;
        shared.grow(n as u64);
        Ok(n)
    }

    /// Append the whole buffer
    ///
    /// 追加整个缓冲区
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

    /// Offset the next write lands at
    ///
    /// 下一次写入的偏移
    #[inline]
    pub fn position(&self) -> u64 {
        self.end
    }

    /// Release the append lock, then the shared primary lock
    ///
    /// 先释放追加锁，再释放共享主锁
    ///
    /// Syncs first when [`Options::sync_on_writer_close`](super::Options::sync_on_writer_close)
    /// is set; the locks are released even if syncing fails.
    ///
    /// 设置了 [`Options::sync_on_writer_close`](super::Options::sync_on_writer_close)
    /// 时会先同步；即使同步失败锁也会被释放。
    ///
    /// # Errors
    /// - [`Error::Closed`] on a second call
    ///
    /// # Errors
    /// - 第二次调用时返回 [`Error::Closed`]
    pub fn close(&mut self) -> Result<()> {
        let lease = self.lease.take().ok_or(Error::Closed)?;
        let synced = lease.file().sync_if_configured();
        drop(lease);
        synced
    }

    /// Whether [`close`](Self::close) has been called
    ///
    /// 是否已调用 [`close`](Self::close)
    #[inline]
    pub fn is_closed(&self) -> bool {
        self.lease.is_none()
    }
}

impl Write for Appender<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(Appender::write(self, buf)?)
    }

    fn flush(&mut self) -> io::Result<()> {
        match &self.lease {
            Some(lease) if !lease.file().is_closed() => Ok(()),
            _ => Err(Error::Closed.into()),
        }
    }
}

impl Drop for Appender<'_> {
    fn drop(&mut self) {
        if self.lease.is_some() {
            if let Err(err) = self.close() {
                tracing::warn!(error = %err, "failed to close dropped appender");
            }
        }
    }
}

impl std::fmt::Debug for Appender<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Appender")
            .field("end", &self.end)
            .field("closed", &self.is_closed())
            .finish()
    }
}
