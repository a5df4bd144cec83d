//! SHA-256 signed streams
//!
//! SHA-256 签名流
//!
//! A [`Signer`] wraps any [`Write`](std::io::Write) sink and hashes every byte
//! that goes through it; [`Signer::sign`] appends the digest as a 32-byte
//! trailer. [`verify`] and [`verify_with_token`] read such a stream back from
//! any `Read + Seek` source, copy the payload out and check the trailer.
//!
//! [`Signer`] 包装任意 [`Write`](std::io::Write) 输出并对经过的每个字节计算哈希；
//! [`Signer::sign`] 将摘要作为 32 字节尾部追加。[`verify`] 和
//! [`verify_with_token`] 从任意 `Read + Seek` 源读回这样的流，复制出负载并校验尾部。
//!
//! # Layout
//!
//! ```text
//! [version: 1][SHA-256(version ‖ token): 32, only with a token][payload][SHA-256(all preceding): 32]
//! ```
//!
//! # 布局
//!
//! 版本字节始终存在；令牌摘要只在提供令牌时存在；尾部签名覆盖之前的所有字节。
//!
//! # Examples
//!
//! ```
//! use shared_file::signature::{Signer, verify_with_token};
//! use std::io::{Cursor, Write};
//! # fn main() -> shared_file::Result<()> {
//!
//! let mut signer = Signer::with_token(Vec::new(), b"token")?;
//! signer.write_all(b"actual data")?;
//! let signature = signer.sign()?;
//! let signed = signer.into_inner();
//!
//! let mut payload = Vec::new();
//! let verified = verify_with_token(b"token", &mut Cursor::new(signed), &mut payload)?;
//! assert_eq!(verified.signature, signature);
//! assert_eq!(payload, b"actual data");
//! # Ok(())
//! # }
//! ```

mod signer;
mod verify;


pub use signer::{Signature, Signer};
pub use verify::{Verified, verify, verify_with_token};

use sha2::{Digest, Sha256};

/// Size of the trailing signature in bytes
///
/// 尾部签名的字节数
pub const SIGNATURE_SIZE: usize = 32;

/// Current format version
///
/// 当前格式版本
pub const VERSION: u8 = 1;

/// Digest binding a token to the format version
///
/// 将令牌与格式版本绑定的摘要
pub(crate) fn token_digest(token: &[u8]) -> [u8; SIGNATURE_SIZE] {
    let mut hasher = Sha256::new();
    hasher.update([VERSION]);
    hasher.update(token);
    hasher.finalize().into()
}
