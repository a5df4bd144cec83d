//! Error types for shared-file
//!
//! shared-file 的错误类型

use std::fmt;
use std::io;

/// Error type for shared-file operations
///
/// shared-file 操作的错误类型
#[derive(Debug)]
pub enum Error {
    /// I/O error from the underlying file, propagated unchanged
    ///
    /// 底层文件的 I/O 错误，原样传递
    Io(io::Error),

    /// The cursor or file has already been closed
    ///
    /// 游标或文件已关闭
    Closed,

    /// Seek target outside the visible range `[0, size]`
    ///
    /// 定位目标超出可见范围 `[0, size]`
    InvalidRange {
        offset: i128,
        size: u64,
    },

    /// The opened target is not a regular file
    ///
    /// 打开的目标不是普通文件
    InvalidTarget,

    /// Empty snapshot cannot be mapped
    ///
    /// 空快照无法映射
    EmptyFile,

    /// Lock acquisition was abandoned after its timeout
    ///
    /// 锁获取超时后被放弃
    TimedOut,

    /// Signed stream is too short to hold its header and trailer
    ///
    /// 签名流太短，无法容纳头部和尾部
    Truncated,

    /// Recomputed digest does not match the stored signature
    ///
    /// 重新计算的摘要与存储的签名不匹配
    SignatureMismatch {
        expected: [u8; 32],
        actual: [u8; 32],
    },

    /// Leading token digest does not match the expected token
    ///
    /// 前导令牌摘要与期望令牌不匹配
    TokenMismatch,

    /// Signed stream carries an unknown version byte
    ///
    /// 签名流携带未知的版本字节
    UnsupportedVersion(u8),
}

impl Error {
    /// Whether this error reports use of a closed cursor or file
    ///
    /// 此错误是否表示使用了已关闭的游标或文件
    #[inline]
    pub fn is_closed(&self) -> bool {
        matches!(self, Error::Closed)
    }

    /// Recover a crate error that was wrapped into an `io::Error` by a std trait impl
    ///
    /// 取回被 std trait 实现包装进 `io::Error` 的 crate 错误
    pub fn from_io_ref(err: &io::Error) -> Option<&Error> {
        err.get_ref().and_then(|inner| inner.downcast_ref::<Error>())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(err) => write!(f, "I/O error: {}", err),
            Error::Closed => write!(f, "File already closed / 文件已关闭"),
            Error::InvalidRange { offset, size } => {
                write!(
                    f,
                    "Offset {} is outside range [0, {}] / 偏移 {} 超出范围 [0, {}]",
                    offset, size, offset, size
                )
            }
            Error::InvalidTarget => write!(f, "Target is not a regular file / 目标不是普通文件"),
            Error::EmptyFile => write!(f, "Cannot map empty file / 无法映射空文件"),
            Error::TimedOut => write!(f, "Lock acquisition timed out / 获取锁超时"),
            Error::Truncated => write!(f, "Signed stream is truncated / 签名流被截断"),
            Error::SignatureMismatch { expected, actual } => {
                write!(
                    f,
                    "Signature mismatch: {} != {} / 签名不匹配",
                    hex::encode(actual),
                    hex::encode(expected)
                )
            }
            Error::TokenMismatch => write!(f, "Token mismatch / 令牌不匹配"),
            Error::UnsupportedVersion(version) => {
                write!(f, "Unsupported version 0x{:02X} / 不支持的版本", version)
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            _ => None,
        }
    }
}

/// Convert from io::Error to Error
///
/// 从 io::Error 转换到 Error
///
/// A crate error that was wrapped by one of the std trait impls is unwrapped
/// again, so `Closed` survives a trip through `std::io::copy`.
///
/// 被 std trait 实现包装的 crate 错误会被重新取出，使 `Closed` 在经过
/// `std::io::copy` 后仍能保留。
impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        if Error::from_io_ref(&err).is_none() {
            return Error::Io(err);
        }
        let kind = err.kind();
        match err.into_inner().map(|inner| inner.downcast::<Error>()) {
            Some(Ok(inner)) => *inner,
            _ => Error::Io(io::Error::from(kind)),
        }
    }
}

/// Convert from Error to io::Error so the std `Read`/`Write`/`Seek` impls can surface it
///
/// 从 Error 转换到 io::Error，使 std 的 `Read`/`Write`/`Seek` 实现可以返回它
impl From<Error> for io::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Io(io_err) => io_err,
            Error::InvalidRange { .. } => io::Error::new(io::ErrorKind::InvalidInput, err),
            Error::TimedOut => io::Error::new(io::ErrorKind::TimedOut, err),
            Error::Truncated => io::Error::new(io::ErrorKind::UnexpectedEof, err),
            Error::SignatureMismatch { .. }
            | Error::TokenMismatch
            | Error::UnsupportedVersion(_) => io::Error::new(io::ErrorKind::InvalidData, err),
            Error::Closed | Error::InvalidTarget | Error::EmptyFile => io::Error::other(err),
        }
    }
}

/// Result type alias using our custom Error type
///
/// 使用自定义 Error 类型的 Result 类型别名
pub type Result<T> = std::result::Result<T, Error>;
