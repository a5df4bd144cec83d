//! Positioned I/O helpers
//!
//! 定位 I/O 辅助函数
//!
//! Readers and appenders run concurrently on the same descriptor, so neither
//! may depend on the descriptor's cursor position.
//!
//! 读取器和追加器在同一描述符上并发运行，因此二者都不能依赖描述符的游标位置。

use std::fs::File;
use std::io;

#[cfg(unix)]
#[inline]
pub(crate) fn read_at(file: &File, buf: &mut [u8], offset: u64) -> io::Result<usize> {
    use std::os::unix::fs::FileExt;
    file.read_at(buf, offset)
}

#[cfg(unix)]
#[inline]
pub(crate) fn write_at(file: &File, buf: &[u8], offset: u64) -> io::Result<usize> {
    use std::os::unix::fs::FileExt;
    file.write_at(buf, offset)
}

// seek_read/seek_write move the file pointer on Windows. Only the writer
// depends on that pointer and it runs alone under the exclusive lock.
#[cfg(windows)]
#[inline]
pub(crate) fn read_at(file: &File, buf: &mut [u8], offset: u64) -> io::Result<usize> {
    use std::os::windows::fs::FileExt;
    file.seek_read(buf, offset)
}

#[cfg(windows)]
#[inline]
pub(crate) fn write_at(file: &File, buf: &[u8], offset: u64) -> io::Result<usize> {
    use std::os::windows::fs::FileExt;
    file.seek_write(buf, offset)
}

/// Fill `buf` from `offset` until the buffer is full or EOF is reached
///
/// 从 `offset` 开始填充 `buf`，直到填满或到达文件末尾
pub(crate) fn read_full_at(file: &File, mut buf: &mut [u8], mut offset: u64) -> io::Result<usize> {
    let mut total = 0;
    while !buf.is_empty() {
        match read_at(file, buf, offset) {
            Ok(0) => break,
            Ok(n) => {
                total += n;
                offset += n as u64;
                buf = &mut buf[n..];
            }
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
            Err(err) => return Err(err),
        }
    }
    Ok(total)
}
