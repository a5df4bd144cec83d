//! Hashing writer that appends a signature trailer
//!
//! 追加签名尾部的哈希写入器

use super::{SIGNATURE_SIZE, VERSION, token_digest};
use crate::file::{Error, Result};
use sha2::{Digest, Sha256};
use std::fmt;
use std::io::{self, Write};

/// A SHA-256 signature
///
/// SHA-256 签名
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Signature([u8; SIGNATURE_SIZE]);

impl Signature {
    #[inline]
    pub fn as_bytes(&self) -> &[u8; SIGNATURE_SIZE] {
        &self.0
    }

    #[inline]
    pub fn to_bytes(self) -> [u8; SIGNATURE_SIZE] {
        self.0
    }
}

impl From<[u8; SIGNATURE_SIZE]> for Signature {
    #[inline]
    fn from(bytes: [u8; SIGNATURE_SIZE]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Signature {
    #[inline]
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::LowerHex for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(self, f)
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({:x})", self)
    }
}

/// Writer that hashes everything passing through and signs it on demand
///
/// 对经过的所有内容计算哈希并按需签名的写入器
///
/// Only bytes the inner sink actually accepted are hashed, so the signature
/// always covers exactly what was written.
///
/// 只对内部输出实际接受的字节计算哈希，因此签名总是精确覆盖已写入的内容。
pub struct Signer<W> {
    inner: W,
    hasher: Sha256,
    written: u64,
    signed: bool,
}

impl<W: Write> Signer<W> {
    /// Start a signed stream without a token
    ///
    /// 开始一个不带令牌的签名流
    ///
    /// Writes the version byte immediately.
    ///
    /// 立即写入版本字节。
    pub fn new(inner: W) -> Result<Self> {
        let mut signer = Self::bare(inner);
        signer.write_all(&[VERSION])?;
        Ok(signer)
    }

    /// Start a signed stream bound to `token`
    ///
    /// 开始一个绑定到 `token` 的签名流
    ///
    /// Writes the version byte followed by `SHA-256(version ‖ token)`.
    ///
    /// 写入版本字节，随后写入 `SHA-256(version ‖ token)`。
    pub fn with_token(inner: W, token: &[u8]) -> Result<Self> {
        let mut signer = Self::bare(inner);
        signer.write_all(&[VERSION])?;
        signer.write_all(&token_digest(token))?;
        Ok(signer)
    }

    fn bare(inner: W) -> Self {
        Self {
            inner,
            hasher: Sha256::new(),
            written: 0,
            signed: false,
        }
    }

    /// Feed `buf` to the hash without writing it
    ///
    /// 只将 `buf` 送入哈希，不写入
    ///
    /// A verifier must feed the same bytes, otherwise the signature will not match.
    ///
    /// 校验方必须送入相同的字节，否则签名不匹配。
    pub fn hash_only(&mut self, buf: &[u8]) -> Result<()> {
        if self.signed {
            return Err(Error::Closed);
        }
        self.hasher.update(buf);
        Ok(())
    }

    /// Write the signature trailer and return it
    ///
    /// 写入签名尾部并返回签名
    ///
    /// # Errors
    /// - [`Error::Closed`] if the stream was already signed
    ///
    /// # Errors
    /// - 流已签名时返回 [`Error::Closed`]
    pub fn sign(&mut self) -> Result<Signature> {
        if self.signed {
            return Err(Error::Closed);
        }
        let digest: [u8; SIGNATURE_SIZE] = self.hasher.clone().finalize().into();
        self.inner.write_all(&digest)?;
        self.inner.flush()?;
        self.written += SIGNATURE_SIZE as u64;
        self.signed = true;
        Ok(Signature(digest))
    }

    /// Bytes written so far, header and trailer included
    ///
    /// 已写入的字节数，包括头部和尾部
    #[inline]
    pub fn bytes_written(&self) -> u64 {
        self.written
    }

    #[inline]
    pub fn is_signed(&self) -> bool {
        self.signed
    }

    #[inline]
    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    #[inline]
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for Signer<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.signed {
            return Err(Error::Closed.into());
        }
        let n = self.inner.write(buf)?;
        self.hasher.update(&buf[..n]);
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl<W> fmt::Debug for Signer<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signer")
            .field("written", &self.written)
            .field("signed", &self.signed)
            .finish()
    }
}
