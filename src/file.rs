//! Lock-coordinated cursors over a single file descriptor
//!
//! 基于单个文件描述符的锁协调游标
//!
//! Provides one handle type, [`SharedFile`], and three cursor kinds:
//! - [`Reader`]: positioned reads bounded by the size seen at creation
//! - [`Writer`]: exclusive positioned/sequential writes
//! - [`Appender`]: end-of-file writes that coexist with readers
//!
//! 提供一个句柄类型 [`SharedFile`] 和三种游标：
//! - [`Reader`]: 受创建时大小限制的定位读取
//! - [`Writer`]: 独占的定位/顺序写入
//! - [`Appender`]: 可与读取器共存的文件末尾写入
//!
//! # Locking
//!
//! The handle owns a primary shared/exclusive lock and a secondary append
//! lock. Readers take the primary lock shared, writers take it exclusively,
//! appenders take it shared plus the append lock. Each cursor is registered in
//! an in-flight counter that [`SharedFile::close`] drains before closing the
//! descriptor.
//!
//! # 锁
//!
//! 句柄拥有一把共享/独占主锁和一把追加锁。读取器共享获取主锁，写入器独占获取，
//! 追加器共享获取主锁并获取追加锁。每个游标都登记在在途计数器中，
//! [`SharedFile::close`] 在关闭描述符前会等待其归零。
//!
//! # Release
//!
//! Cursors are single use. `close()` releases the locks once and reports
//! [`Error::Closed`] on any later call; dropping an open cursor releases them too.
//!
//! # 释放
//!
//! 游标只能使用一次。`close()` 只释放一次锁，之后的任何调用都返回
//! [`Error::Closed`]；释放仍打开的游标同样会释放锁。
//!
//! ```
//! # use shared_file::{SharedFile, Error, Result};
//! # use tempfile::tempdir;
//! # fn main() -> Result<()> {
//! # let dir = tempdir()?;
//! # let path = dir.path().join("cursor.bin");
//! let file = SharedFile::open(&path)?;
//! let mut appender = file.appender()?;
//! appender.write(b"data")?;
//! appender.close()?;
//!
//! assert!(matches!(appender.write(b"more"), Err(Error::Closed)));
//! assert!(matches!(appender.close(), Err(Error::Closed)));
//! # Ok(())
//! # }
//! ```

mod appender;
mod error;
mod lease;
mod options;
mod reader;
mod shared_file;
mod snapshot;
mod sys;
mod writer;

#[cfg(test)]
mod tests;

// Re-export public API
// 重新导出公共 API
pub use appender::Appender;
pub use error::{Error, Result};
pub use options::{DEFAULT_PERMISSIONS, Options};
pub use reader::Reader;
pub use shared_file::SharedFile;
pub use snapshot::SnapshotMap;
pub use writer::Writer;
