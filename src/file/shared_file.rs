//! Shared file handle
//!
//! 共享文件句柄

use super::appender::Appender;
use super::error::{Error, Result};
use super::lease::{
    AppendLease, ExclusiveLease, InFlight, Lease, LeaseKind, SharedLease, Wait,
};
use super::options::Options;
use super::reader::Reader;
use super::writer::Writer;
use parking_lot::{MappedRwLockReadGuard, Mutex, RwLock, RwLockReadGuard};
use std::fs::{File, Metadata};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// A file descriptor shared by many readers, one writer, or readers plus serialized appenders
///
/// 由多个读取器、单个写入器、或读取器加串行追加器共享的文件描述符
///
/// Cursors are handed out by [`reader`](Self::reader), [`writer_at`](Self::writer_at)
/// and [`appender`](Self::appender). Each cursor borrows the handle and holds its
/// locks until it is closed or dropped:
///
/// | Cursor | Primary lock | Append lock |
/// |---|---|---|
/// | [`Reader`] | shared | - |
/// | [`Writer`] | exclusive | - |
/// | [`Appender`] | shared | exclusive |
///
/// 游标由 [`reader`](Self::reader)、[`writer_at`](Self::writer_at) 和
/// [`appender`](Self::appender) 发放。每个游标借用句柄，并持有锁直到被关闭或释放。
///
/// A writer never overlaps with any other cursor. Appenders overlap only with
/// readers, and readers only use positioned reads, so the descriptor's own
/// cursor position is touched by at most one party at a time.
///
/// 写入器不会与任何其他游标重叠。追加器只与读取器重叠，而读取器只使用定位读取，
/// 因此描述符自身的游标位置同一时刻最多被一方使用。
///
/// A waiting exclusive operation ([`writer_at`](Self::writer_at),
/// [`truncate`](Self::truncate), [`with`](Self::with), [`close`](Self::close))
/// blocks new readers and appenders, so a steady stream of readers cannot
/// starve it. The flip side is that a thread already holding a cursor may
/// deadlock when it opens another one while a writer is queued, and always
/// deadlocks when it calls an exclusive operation itself.
///
/// 等待中的独占操作会阻止新的读取器和追加器，因此持续的读取流不会使其饿死。
/// 代价是：已持有游标的线程在有写入器排队时再打开游标可能死锁，
/// 自己调用独占操作则一定死锁。
///
/// # Examples
///
/// ```
/// # use shared_file::{SharedFile, Result};
/// # use tempfile::tempdir;
/// # fn main() -> Result<()> {
/// # let dir = tempdir()?;
/// # let path = dir.path().join("log.bin");
/// let file = SharedFile::open(&path)?;
/// file.append(b"0123456789")?;
///
/// std::thread::scope(|s| {
///     s.spawn(|| -> Result<()> {
///         let mut appender = file.appender()?;
///         appender.write(b"abc")?;
///         appender.close()
///     });
///     s.spawn(|| -> Result<()> {
///         let mut reader = file.reader_at(5)?;
///         let mut buf = [0u8; 5];
///         assert_eq!(reader.read(&mut buf)?, 5);
///         assert_eq!(&buf, b"56789");
///         reader.close()
///     });
/// });
///
/// assert_eq!(file.size(), 13);
/// file.close()?;
/// # Ok(())
/// # }
/// ```
pub struct SharedFile {
    /// The descriptor, `None` once closed
    ///
    /// 文件描述符，关闭后为 `None`
    descriptor: RwLock<Option<File>>,

    /// Cached logical length
    ///
    /// 缓存的逻辑长度
    ///
    /// Written only under the exclusive primary lock, or under the shared
    /// primary lock together with the append lock.
    ///
    /// 只在独占主锁下，或共享主锁加追加锁下写入。
    size: AtomicU64,

    primary: RwLock<()>,
    append: Mutex<()>,
    in_flight: InFlight,

    options: Options,
    path: Option<PathBuf>,
}

impl SharedFile {
    /// Open or create `path` with default [`Options`]
    ///
    /// 使用默认 [`Options`] 打开或创建 `path`
    ///
    /// # Errors
    /// - I/O errors from opening or querying the file
    /// - [`Error::InvalidTarget`] if the path is not a regular file
    ///
    /// # Errors
    /// - 打开或查询文件时的 I/O 错误
    /// - 路径不是普通文件时返回 [`Error::InvalidTarget`]
    #[inline]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Options::default().open(path)
    }

    /// Wrap an already opened file with default [`Options`]
    ///
    /// 使用默认 [`Options`] 包装已打开的文件
    #[inline]
    pub fn from_file(file: File) -> Result<Self> {
        Options::default().from_file(file)
    }

    pub(crate) fn from_parts(file: File, path: Option<PathBuf>, options: Options) -> Result<Self> {
        let metadata = file.metadata()?;
        if !metadata.is_file() {
            return Err(Error::InvalidTarget);
        }
        let size = metadata.len();

        tracing::debug!(path = ?path, size, "shared file opened");

        Ok(Self {
            descriptor: RwLock::new(Some(file)),
            size: AtomicU64::new(size),
            primary: RwLock::new(()),
            append: Mutex::new(()),
            in_flight: InFlight::default(),
            options,
            path,
        })
    }

    /// Get a reader positioned at offset 0
    ///
    /// 获取位于偏移 0 的读取器
    #[inline]
    pub fn reader(&self) -> Result<Reader<'_>> {
        self.reader_at(0)
    }

    /// Get a reader positioned at `offset`
    ///
    /// 获取位于 `offset` 的读取器
    ///
    /// Takes the primary lock shared: never waits for other readers or
    /// appenders, only for an active or queued writer. The reader sees the file
    /// as it was when this call returned.
    ///
    /// 以共享模式获取主锁：不等待其他读取器或追加器，只等待活动或排队的写入器。
    /// 读取器看到的是本调用返回时的文件。
    ///
    /// # Errors
    /// - [`Error::Closed`] if the file was closed
    ///
    /// # Errors
    /// - 文件已关闭时返回 [`Error::Closed`]
    #[inline]
    pub fn reader_at(&self, offset: u64) -> Result<Reader<'_>> {
        self.open_reader(offset, Wait::Forever)
    }

    /// Like [`reader_at`](Self::reader_at), giving up after `timeout`
    ///
    /// 同 [`reader_at`](Self::reader_at)，超过 `timeout` 后放弃
    pub fn try_reader_for(&self, offset: u64, timeout: Duration) -> Result<Reader<'_>> {
        self.open_reader(offset, Wait::Until(Instant::now() + timeout))
    }

    /// Get a writer at offset 0, or at the cached end of file if `append` is set
    ///
    /// 获取位于偏移 0 的写入器；若 `append` 为真则位于缓存的文件末尾
    ///
    /// This is a positioned writer and takes the primary lock exclusively.
    /// Appending that may overlap with readers goes through [`appender`](Self::appender).
    ///
    /// 这是定位写入器，独占主锁。需要与读取器并行的追加请使用 [`appender`](Self::appender)。
    pub fn writer(&self, append: bool) -> Result<Writer<'_>> {
        let offset = if append { None } else { Some(0) };
        self.open_writer(offset, Wait::Forever)
    }

    /// Get a writer positioned at `offset`
    ///
    /// 获取位于 `offset` 的写入器
    ///
    /// Blocks until every reader, appender and writer has released.
    ///
    /// 阻塞直到所有读取器、追加器和写入器释放。
    #[inline]
    pub fn writer_at(&self, offset: u64) -> Result<Writer<'_>> {
        self.open_writer(Some(offset), Wait::Forever)
    }

    /// Like [`writer_at`](Self::writer_at), giving up after `timeout`
    ///
    /// 同 [`writer_at`](Self::writer_at)，超过 `timeout` 后放弃
    pub fn try_writer_for(&self, offset: u64, timeout: Duration) -> Result<Writer<'_>> {
        self.open_writer(Some(offset), Wait::Until(Instant::now() + timeout))
    }

    /// Get an appender positioned at end of file
    ///
    /// 获取位于文件末尾的追加器
    ///
    /// Takes the primary lock shared and the append lock exclusively. It runs
    /// alongside readers and waits only for other appenders or an active or
    /// queued writer.
    ///
    /// 共享获取主锁并独占获取追加锁。可与读取器并行，只等待其他追加器或活动、排队的写入器。
    #[inline]
    pub fn appender(&self) -> Result<Appender<'_>> {
        self.open_appender(Wait::Forever)
    }

    /// Like [`appender`](Self::appender), giving up after `timeout`
    ///
    /// 同 [`appender`](Self::appender)，超过 `timeout` 后放弃
    ///
    /// Both locks are acquired or neither is.
    ///
    /// 两把锁要么都获取，要么都不获取。
    pub fn try_appender_for(&self, timeout: Duration) -> Result<Appender<'_>> {
        self.open_appender(Wait::Until(Instant::now() + timeout))
    }

    /// Truncate or extend the file to `size` bytes
    ///
    /// 将文件截断或扩展到 `size` 字节
    ///
    /// The cached size changes only if the underlying call succeeds.
    ///
    /// 只有底层调用成功时缓存的大小才会改变。
    pub fn truncate(&self, size: u64) -> Result<()> {
        let _primary = self.primary.write();
        let file = self.descriptor()?;
        file.set_len(size)?;
        self.size.store(size, Ordering::Release);
        tracing::debug!(size, "shared file truncated");
        Ok(())
    }

    /// Cached file size
    ///
    /// 缓存的文件大小
    ///
    /// Refreshed whenever a writer closes, an appender writes or the file is
    /// truncated; the descriptor is never queried.
    ///
    /// 在写入器关闭、追加器写入或文件截断时刷新；不查询描述符。
    pub fn size(&self) -> u64 {
        let _primary = self.primary.read_recursive();
        self.size.load(Ordering::Acquire)
    }

    /// Live metadata of the descriptor, bypassing the size cache
    ///
    /// 描述符的实时元数据，绕过大小缓存
    pub fn stat(&self) -> Result<Metadata> {
        let _primary = self.primary.read_recursive();
        let file = self.descriptor()?;
        Ok(file.metadata()?)
    }

    /// Run `f` with exclusive access to the raw descriptor
    ///
    /// 在独占访问原始描述符的情况下运行 `f`
    ///
    /// The lock is released on every exit path. Afterwards the cached size is
    /// re-read from the descriptor so changes made by `f` are visible.
    ///
    /// 锁在所有退出路径上都会释放。之后会从描述符重新读取缓存大小，使 `f` 的修改可见。
    ///
    /// # Examples
    ///
    /// ```
    /// # use shared_file::{SharedFile, Result};
    /// # use tempfile::tempdir;
    /// # fn main() -> Result<()> {
    /// # let dir = tempdir()?;
    /// # let path = dir.path().join("with.bin");
    /// let file = SharedFile::open(&path)?;
    /// file.with(|raw| Ok(raw.set_len(64)?))?;
    /// assert_eq!(file.size(), 64);
    /// # Ok(())
    /// # }
    /// ```
    pub fn with<T>(&self, f: impl FnOnce(&File) -> Result<T>) -> Result<T> {
        let _primary = self.primary.write();
        let file = self.descriptor()?;
        let result = f(&file);
        match file.metadata() {
            Ok(metadata) => self.size.store(metadata.len(), Ordering::Release),
            Err(err) => tracing::warn!(error = %err, "failed to refresh size after `with`"),
        }
        result
    }

    /// Read into `buf` starting at `offset` through a one-shot reader
    ///
    /// 通过一次性读取器从 `offset` 开始读入 `buf`
    pub fn read_at(&self, buf: &mut [u8], offset: u64) -> Result<usize> {
        let mut reader = self.reader_at(offset)?;
        let n = reader.read(buf)?;
        reader.close()?;
        Ok(n)
    }

    /// Write `buf` at `offset` through a one-shot writer
    ///
    /// 通过一次性写入器在 `offset` 处写入 `buf`
    pub fn write_at(&self, buf: &[u8], offset: u64) -> Result<usize> {
        let mut writer = self.writer_at(offset)?;
        writer.write_all(buf)?;
        writer.close()?;
        Ok(buf.len())
    }

    /// Write `buf` at the cached end of file through a one-shot exclusive writer
    ///
    /// 通过一次性独占写入器在缓存的文件末尾写入 `buf`
    pub fn append(&self, buf: &[u8]) -> Result<usize> {
        let mut writer = self.writer(true)?;
        writer.write_all(buf)?;
        writer.close()?;
        Ok(buf.len())
    }

    /// Copy the whole file, as of now, into `dst`
    ///
    /// 将当前的整个文件复制到 `dst`
    pub fn copy_to(&self, dst: &mut impl Write) -> Result<u64> {
        let mut reader = self.reader()?;
        let copied = io::copy(&mut reader, dst)?;
        reader.close()?;
        Ok(copied)
    }

    /// Copy `src` into the file starting at offset 0
    ///
    /// 从偏移 0 开始将 `src` 复制到文件
    ///
    /// Bytes past the copied length are left in place; call
    /// [`truncate`](Self::truncate) to drop them.
    ///
    /// 复制长度之后的字节保持不变；需要时调用 [`truncate`](Self::truncate) 删除。
    pub fn copy_from(&self, src: &mut impl Read) -> Result<u64> {
        let mut writer = self.writer_at(0)?;
        let copied = io::copy(src, &mut writer)?;
        writer.close()?;
        Ok(copied)
    }

    /// Close the descriptor without waiting for outstanding cursors
    ///
    /// 不等待未关闭的游标，立即关闭描述符
    ///
    /// Cursors still open fail their next call with [`Error::Closed`].
    ///
    /// 仍打开的游标在下一次调用时返回 [`Error::Closed`]。
    pub fn force_close(&self) -> Result<()> {
        let file = self.descriptor.write().take().ok_or(Error::Closed)?;
        drop(file);
        tracing::debug!(
            path = ?self.path,
            outstanding = self.in_flight.current(),
            "shared file force closed"
        );
        Ok(())
    }

    /// Wait for every cursor to finish, then close the descriptor
    ///
    /// 等待所有游标结束后关闭描述符
    ///
    /// # Errors
    /// - [`Error::Closed`] if the file was already closed
    ///
    /// # Errors
    /// - 文件已关闭时返回 [`Error::Closed`]
    pub fn close(&self) -> Result<()> {
        let _primary = self.primary.write();
        self.in_flight.wait_drained();
        let file = self.descriptor.write().take().ok_or(Error::Closed)?;
        drop(file);
        tracing::debug!(path = ?self.path, "shared file closed");
        Ok(())
    }

    /// Whether [`close`](Self::close) or [`force_close`](Self::force_close) has run
    ///
    /// 是否已调用 [`close`](Self::close) 或 [`force_close`](Self::force_close)
    #[inline]
    pub fn is_closed(&self) -> bool {
        self.descriptor.read().is_none()
    }

    #[inline]
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Path the file was opened from, if it was opened by path
    ///
    /// 打开文件时使用的路径（如果按路径打开）
    #[inline]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Borrow the descriptor for a single operation
    ///
    /// 为单次操作借用描述符
    pub(crate) fn descriptor(&self) -> Result<MappedRwLockReadGuard<'_, File>> {
        RwLockReadGuard::try_map(self.descriptor.read(), Option::as_ref).map_err(|_| Error::Closed)
    }

    #[inline]
    pub(crate) fn in_flight(&self) -> &InFlight {
        &self.in_flight
    }

    #[inline]
    pub(crate) fn cached_size(&self) -> u64 {
        self.size.load(Ordering::Acquire)
    }

    /// Record `n` bytes landed at end of file; caller holds the append lock
    ///
    /// 记录在文件末尾写入的 `n` 字节；调用者持有追加锁
    #[inline]
    pub(crate) fn grow(&self, n: u64) {
        self.size.fetch_add(n, Ordering::AcqRel);
    }

    /// Sync if configured and reload the cached size; caller holds the primary lock exclusively
    ///
    /// 按配置同步并重新加载缓存大小；调用者独占持有主锁
    pub(crate) fn reconcile(&self) -> Result<()> {
        let file = self.descriptor()?;
        if self.options.sync_on_writer_close {
            file.sync_all()?;
        }
        let len = file.metadata()?.len();
        self.size.store(len, Ordering::Release);
        Ok(())
    }

    /// Sync if configured
    ///
    /// 按配置同步
    pub(crate) fn sync_if_configured(&self) -> Result<()> {
        if self.options.sync_on_writer_close {
            self.descriptor()?.sync_all()?;
        }
        Ok(())
    }

    fn open_reader(&self, offset: u64, wait: Wait) -> Result<Reader<'_>> {
        let guard = match wait {
            Wait::Forever => self.primary.read(),
            Wait::Until(deadline) => self.primary.try_read_until(deadline).ok_or(Error::TimedOut)?,
        };
        if self.is_closed() {
            return Err(Error::Closed);
        }
        let lease: SharedLease<'_> = Lease::register(self, LeaseKind::Reader, guard);
        let snapshot = self.cached_size();
        Ok(Reader::new(lease, offset, snapshot))
    }

    fn open_writer(&self, offset: Option<u64>, wait: Wait) -> Result<Writer<'_>> {
        let guard = match wait {
            Wait::Forever => self.primary.write(),
            Wait::Until(deadline) => self.primary.try_write_until(deadline).ok_or(Error::TimedOut)?,
        };
        let lease: ExclusiveLease<'_> = Lease::register(self, LeaseKind::Writer, guard);
        // Read under the exclusive lock so no appender can move the end.
        let offset = offset.unwrap_or_else(|| self.cached_size());
        {
            let file = self.descriptor()?;
            (&*file).seek(SeekFrom::Start(offset))?;
        }
        Ok(Writer::new(lease, offset))
    }

    fn open_appender(&self, wait: Wait) -> Result<Appender<'_>> {
        let guards = match wait {
            Wait::Forever => {
                let primary = self.primary.read();
                let append = self.append.lock();
                (append, primary)
            }
            Wait::Until(deadline) => {
                let primary = self.primary.try_read_until(deadline).ok_or(Error::TimedOut)?;
                // `primary` drops here if the append lock times out.
                let append = self.append.try_lock_until(deadline).ok_or(Error::TimedOut)?;
                (append, primary)
            }
        };
        let lease: AppendLease<'_> = Lease::register(self, LeaseKind::Appender, guards);
        let end = {
            let file = self.descriptor()?;
            (&*file).seek(SeekFrom::End(0))?
        };
        Ok(Appender::new(lease, end))
    }
}

impl std::fmt::Debug for SharedFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedFile")
            .field("path", &self.path)
            .field("size", &self.size.load(Ordering::Relaxed))
            .field("in_flight", &self.in_flight.current())
            .field("closed", &self.is_closed())
            .field("options", &self.options)
            .finish()
    }
}
