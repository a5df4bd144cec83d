//! Verification of signed streams
//!
//! 签名流的校验

use super::signer::Signature;
use super::{SIGNATURE_SIZE, VERSION, token_digest};
use crate::file::{Error, Result};
use sha2::{Digest, Sha256};
use std::io::{self, Read, Seek, SeekFrom, Write};

/// Outcome of a successful verification
///
/// 校验成功的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verified {
    /// The trailer, equal to the recomputed digest
    ///
    /// 尾部签名，等于重新计算的摘要
    pub signature: Signature,

    /// Payload bytes copied to the sink
    ///
    /// 复制到输出的负载字节数
    pub payload_len: u64,
}

/// Verify a stream signed without a token
///
/// 校验不带令牌签名的流
///
/// Equivalent to the token-less form of [`verify_with_token`].
///
/// 等价于不带令牌的 [`verify_with_token`]。
pub fn verify<R, W>(src: &mut R, dst: &mut W) -> Result<Verified>
where
    R: Read + Seek + ?Sized,
    W: Write + ?Sized,
{
    verify_stream(None, src, dst)
}

/// Verify a stream signed with `token`, copying its payload to `dst`
///
/// 校验使用 `token` 签名的流，并将负载复制到 `dst`
///
/// The stream is read from the current position of `src` to its end. The
/// payload is streamed to `dst` while being hashed, so `dst` may already hold
/// it when a [`Error::SignatureMismatch`] is returned.
///
/// 从 `src` 的当前位置读到末尾。负载在计算哈希的同时流向 `dst`，
/// 因此返回 [`Error::SignatureMismatch`] 时 `dst` 可能已包含负载。
///
/// # Errors
/// - [`Error::UnsupportedVersion`] for an unknown version byte
/// - [`Error::TokenMismatch`] if the token digest differs
/// - [`Error::SignatureMismatch`] if the trailer differs from the recomputed digest
/// - [`Error::Truncated`] if the stream cannot hold header and trailer
///
/// # Errors
/// - 未知版本字节返回 [`Error::UnsupportedVersion`]
/// - 令牌摘要不同返回 [`Error::TokenMismatch`]
/// - 尾部与重新计算的摘要不同返回 [`Error::SignatureMismatch`]
/// - 流无法容纳头部和尾部时返回 [`Error::Truncated`]
pub fn verify_with_token<R, W>(token: &[u8], src: &mut R, dst: &mut W) -> Result<Verified>
where
    R: Read + Seek + ?Sized,
    W: Write + ?Sized,
{
    verify_stream(Some(token), src, dst)
}

fn verify_stream<R, W>(token: Option<&[u8]>, src: &mut R, dst: &mut W) -> Result<Verified>
where
    R: Read + Seek + ?Sized,
    W: Write + ?Sized,
{
    let header_len = 1 + if token.is_some() { SIGNATURE_SIZE as u64 } else { 0 };

    let start = src.stream_position()?;
    let end = src.seek(SeekFrom::End(0))?;
    let payload_len = end
        .checked_sub(start)
        .and_then(|total| total.checked_sub(header_len + SIGNATURE_SIZE as u64))
        .ok_or(Error::Truncated)?;
    src.seek(SeekFrom::Start(start))?;

    let mut hasher = Sha256::new();

    let mut version = [0u8; 1];
    src.read_exact(&mut version)?;
    if version[0] != VERSION {
        return Err(Error::UnsupportedVersion(version[0]));
    }
    hasher.update(version);

    if let Some(token) = token {
        let mut digest = [0u8; SIGNATURE_SIZE];
        src.read_exact(&mut digest)?;
        if digest != token_digest(token) {
            return Err(Error::TokenMismatch);
        }
        hasher.update(digest);
    }

    let mut sink = HashingSink {
        hasher: &mut hasher,
        inner: dst,
    };
    let copied = io::copy(&mut Read::take(&mut *src, payload_len), &mut sink)?;
    if copied != payload_len {
        return Err(Error::Truncated);
    }

    let mut trailer = [0u8; SIGNATURE_SIZE];
    src.read_exact(&mut trailer)?;

    let actual: [u8; SIGNATURE_SIZE] = hasher.finalize().into();
    if actual != trailer {
        tracing::debug!(payload_len, "signature mismatch");
        return Err(Error::SignatureMismatch {
            expected: trailer,
            actual,
        });
    }

    Ok(Verified {
        signature: Signature::from(trailer),
        payload_len,
    })
}

/// Tee that hashes the bytes the inner sink accepted
///
/// 对内部输出接受的字节计算哈希的分流器
struct HashingSink<'h, 'w, W: ?Sized> {
    hasher: &'h mut Sha256,
    inner: &'w mut W,
}

impl<W: Write + ?Sized> Write for HashingSink<'_, '_, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.hasher.update(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
