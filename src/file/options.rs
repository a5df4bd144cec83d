//! Open options for [`SharedFile`](super::SharedFile)
//!
//! [`SharedFile`](super::SharedFile) 的打开选项

use super::error::Result;
use super::shared_file::SharedFile;
use std::fs::{File, OpenOptions};
use std::path::Path;

/// Default permission bits for newly created files
///
/// 新建文件的默认权限位
pub const DEFAULT_PERMISSIONS: u32 = 0o644;

/// Configuration used when opening or wrapping a file
///
/// 打开或包装文件时使用的配置
///
/// # Examples
///
/// ```
/// # use shared_file::{Options, Result};
/// # use tempfile::tempdir;
/// # fn main() -> Result<()> {
/// # let dir = tempdir()?;
/// # let path = dir.path().join("data.bin");
/// let file = Options::new()
///     .sync_on_writer_close(true)
///     .permissions(0o600)
///     .open(&path)?;
///
/// assert!(file.options().sync_on_writer_close);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Options {
    /// Call `sync_all` whenever a writer or appender is closed
    ///
    /// 每次关闭写入器或追加器时调用 `sync_all`
    pub sync_on_writer_close: bool,

    /// Permission bits applied if the file is created (Unix only)
    ///
    /// 创建文件时使用的权限位（仅 Unix）
    pub permissions: u32,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            sync_on_writer_close: false,
            permissions: DEFAULT_PERMISSIONS,
        }
    }
}

impl Options {
    /// Create options with defaults
    ///
    /// 使用默认值创建选项
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether closing a writer forces a durability flush
    ///
    /// 设置关闭写入器时是否强制持久化
    #[inline]
    pub fn sync_on_writer_close(mut self, sync: bool) -> Self {
        self.sync_on_writer_close = sync;
        self
    }

    /// Set permission bits for file creation
    ///
    /// 设置创建文件时的权限位
    #[inline]
    pub fn permissions(mut self, mode: u32) -> Self {
        self.permissions = mode;
        self
    }

    /// Open or create `path` read-write and wrap it
    ///
    /// 以读写方式打开或创建 `path` 并包装
    ///
    /// # Errors
    /// - I/O errors from opening or querying the file
    /// - [`Error::InvalidTarget`](super::Error::InvalidTarget) if the path is not a regular file
    ///
    /// # Errors
    /// - 打开或查询文件时的 I/O 错误
    /// - 路径不是普通文件时返回 [`Error::InvalidTarget`](super::Error::InvalidTarget)
    pub fn open(self, path: impl AsRef<Path>) -> Result<SharedFile> {
        let path = path.as_ref();

        let mut open = OpenOptions::new();
        open.read(true).write(true).create(true);

        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            open.mode(self.permissions);
        }

        let file = open.open(path)?;
        SharedFile::from_parts(file, Some(path.to_path_buf()), self)
    }

    /// Wrap an already opened file
    ///
    /// 包装已经打开的文件
    ///
    /// The file must be readable, writable and regular.
    ///
    /// 文件必须可读、可写且为普通文件。
    pub fn from_file(self, file: File) -> Result<SharedFile> {
        SharedFile::from_parts(file, None, self)
    }
}
