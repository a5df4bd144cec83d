//! Concurrent readers, writers and appenders over one file descriptor
//!
//! 基于单个文件描述符的并发读取器、写入器和追加器
//!
//! A [`SharedFile`] owns a single open file and hands out scoped cursors that
//! coordinate through a shared/exclusive lock, so many threads can use one
//! descriptor without racing on its cursor position or its length.
//!
//! [`SharedFile`] 拥有一个打开的文件，并发放通过共享/独占锁协调的作用域游标，
//! 使多个线程可以共用一个描述符，而不会在其游标位置或长度上产生竞争。
//!
//! # Features
//!
//! - **Many readers**: [`Reader`]s never block each other and use positioned reads
//! - **Stable snapshots**: a reader only sees the bytes present when it was created
//! - **Concurrent appends**: [`Appender`]s run alongside readers, serialized among themselves
//! - **Exclusive writes**: a [`Writer`] never overlaps with any other cursor
//! - **Deterministic release**: cursors release their locks exactly once, on close or drop
//! - **Graceful shutdown**: [`SharedFile::close`] waits for every outstanding cursor
//!
//! # 特性
//!
//! - **多读取器**：[`Reader`] 之间互不阻塞，使用定位读取
//! - **稳定快照**：读取器只能看到创建时已存在的字节
//! - **并发追加**：[`Appender`] 与读取器并行运行，彼此之间串行
//! - **独占写入**：[`Writer`] 不会与任何其他游标重叠
//! - **确定性释放**：游标在关闭或释放时恰好释放一次锁
//! - **优雅关闭**：[`SharedFile::close`] 等待所有未关闭的游标
//!
//! # Quick Start
//!
//! ```
//! use shared_file::{SharedFile, Result};
//! # use tempfile::tempdir;
//! # fn main() -> Result<()> {
//! # let dir = tempdir()?;
//! # let path = dir.path().join("journal.bin");
//!
//! let file = SharedFile::open(&path)?;
//! file.append(b"0123456789")?;
//!
//! // Readers and appenders share the descriptor
//! // 读取器与追加器共享描述符
//! std::thread::scope(|s| {
//!     for i in 0..4u8 {
//!         let file = &file;
//!         s.spawn(move || -> Result<()> {
//!             let mut appender = file.appender()?;
//!             appender.write_all(&[b'a' + i; 4])?;
//!             appender.close()
//!         });
//!         s.spawn(move || -> Result<()> {
//!             let mut buf = [0u8; 10];
//!             let mut reader = file.reader()?;
//!             reader.read(&mut buf)?;
//!             assert_eq!(&buf, b"0123456789");
//!             reader.close()
//!         });
//!     }
//! });
//!
//! assert_eq!(file.size(), 26);
//! file.close()?;
//! # Ok(())
//! # }
//! ```
//!
//! # Main Types
//!
//! - [`SharedFile`]: The shared handle
//! - [`Reader`], [`Writer`], [`Appender`]: Cursors
//! - [`Options`]: Open configuration
//! - [`signature::Signer`]: SHA-256 signed streams
//!
//! # 主要类型
//!
//! - [`SharedFile`]: 共享句柄
//! - [`Reader`]、[`Writer`]、[`Appender`]: 游标
//! - [`Options`]: 打开配置
//! - [`signature::Signer`]: SHA-256 签名流

mod file;
pub mod signature;

pub use file::{
    Appender, DEFAULT_PERMISSIONS, Error, Options, Reader, Result, SharedFile, SnapshotMap, Writer,
};
