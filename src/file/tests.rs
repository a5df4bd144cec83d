//! 测试模块

use super::*;
use std::io::{Read, SeekFrom, Write};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Barrier;
use std::time::{Duration, Instant};
use tempfile::tempdir;

const DECADE: &[u8] = b"0123456789";

/// 写入两次 "0123456789"，共 20 字节
fn seeded(path: &std::path::Path) -> SharedFile {
    let file = SharedFile::open(path).unwrap();
    file.append(DECADE).unwrap();
    file.append(DECADE).unwrap();
    assert_eq!(file.size(), 20);
    file
}

/// SharedFile 句柄测试
#[cfg(test)]
mod shared_file_tests {
    use super::*;

    #[test]
    fn test_open_creates_empty_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("open_empty.bin");

        let file = SharedFile::open(&path).unwrap();
        assert!(path.exists());
        assert_eq!(file.size(), 0);
        assert_eq!(file.path(), Some(path.as_path()));
        assert!(!file.is_closed());
    }

    #[test]
    fn test_open_existing_file_reads_length() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("open_existing.bin");
        std::fs::write(&path, b"hello world").unwrap();

        let file = SharedFile::open(&path).unwrap();
        assert_eq!(file.size(), 11);

        let mut buf = [0u8; 5];
        assert_eq!(file.read_at(&mut buf, 6).unwrap(), 5);
        assert_eq!(&buf, b"world");
    }

    #[test]
    fn test_from_file_rejects_directory() {
        let dir = tempdir().unwrap();

        let handle = std::fs::File::open(dir.path()).unwrap();
        let result = SharedFile::from_file(handle);
        assert!(matches!(result, Err(Error::InvalidTarget)));
    }

    #[cfg(unix)]
    #[test]
    fn test_open_applies_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let path = dir.path().join("perm.bin");

        let _file = Options::new().permissions(0o600).open(&path).unwrap();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_truncate_updates_size() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("truncate.bin");
        let file = seeded(&path);

        file.truncate(5).unwrap();
        assert_eq!(file.size(), 5);
        assert_eq!(file.stat().unwrap().len(), 5);

        let mut out = Vec::new();
        file.copy_to(&mut out).unwrap();
        assert_eq!(out, b"01234");

        // 扩展
        file.truncate(8).unwrap();
        assert_eq!(file.size(), 8);
    }

    #[test]
    fn test_truncate_waits_for_reader() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("truncate_wait.bin");
        let file = seeded(&path);

        let released = AtomicBool::new(false);
        let started = Barrier::new(2);

        std::thread::scope(|s| {
            s.spawn(|| {
                let mut reader = file.reader().unwrap();
                started.wait();
                std::thread::sleep(Duration::from_millis(50));
                released.store(true, Ordering::SeqCst);
                reader.close().unwrap();
            });

            started.wait();
            file.truncate(0).unwrap();
            // truncate 只能在读取器释放后完成
            assert!(released.load(Ordering::SeqCst));
        });

        assert_eq!(file.size(), 0);
    }

    #[test]
    fn test_truncate_waits_for_appender() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("truncate_appender.bin");
        let file = seeded(&path);

        let released = AtomicBool::new(false);
        let started = Barrier::new(2);

        std::thread::scope(|s| {
            s.spawn(|| {
                let mut appender = file.appender().unwrap();
                appender.write_all(DECADE).unwrap();
                started.wait();
                std::thread::sleep(Duration::from_millis(50));
                released.store(true, Ordering::SeqCst);
                appender.close().unwrap();
            });

            started.wait();
            // 追加器持有期间无法获得独占锁
            let result = file.try_writer_for(0, Duration::from_millis(10));
            assert!(matches!(result, Err(Error::TimedOut)));

            file.truncate(5).unwrap();
            assert!(released.load(Ordering::SeqCst));
            // 返回后立即可见新长度
            assert_eq!(file.size(), 5);
        });

        assert_eq!(file.stat().unwrap().len(), 5);
        assert_eq!(file.in_flight().current(), 0);
    }

    #[test]
    fn test_stat_bypasses_cache() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stat.bin");
        let file = seeded(&path);

        // 通过另一个描述符在外部修改文件
        let mut external = std::fs::OpenOptions::new().append(true).open(&path).unwrap();
        external.write_all(b"external").unwrap();
        drop(external);

        assert_eq!(file.size(), 20);
        assert_eq!(file.stat().unwrap().len(), 28);
    }

    #[test]
    fn test_with_exposes_descriptor_and_refreshes_size() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("with.bin");
        let file = seeded(&path);

        let len = file.with(|raw| Ok(raw.metadata()?.len())).unwrap();
        assert_eq!(len, 20);

        file.with(|raw| Ok(raw.set_len(100)?)).unwrap();
        assert_eq!(file.size(), 100);
    }

    #[test]
    fn test_with_releases_lock_on_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("with_error.bin");
        let file = seeded(&path);

        let result: Result<()> = file.with(|_| Err(Error::TimedOut));
        assert!(matches!(result, Err(Error::TimedOut)));

        // 锁已释放，可以再次获取独占写入器
        let mut writer = file.try_writer_for(0, Duration::from_millis(100)).unwrap();
        writer.close().unwrap();
    }

    #[test]
    fn test_write_at_and_read_at() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("write_at.bin");
        let file = seeded(&path);

        assert_eq!(file.write_at(b"abc", 3).unwrap(), 3);
        assert_eq!(file.size(), 20);

        let mut buf = [0u8; 6];
        file.read_at(&mut buf, 0).unwrap();
        assert_eq!(&buf, b"012abc");

        // 写入超过末尾会扩展文件
        file.write_at(b"tail", 20).unwrap();
        assert_eq!(file.size(), 24);
    }

    #[test]
    fn test_copy_from_and_copy_to() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("copy.bin");
        let file = seeded(&path);

        let copied = file.copy_from(&mut &b"abcde"[..]).unwrap();
        assert_eq!(copied, 5);
        // 复制长度之后的字节保持不变
        assert_eq!(file.size(), 20);

        let mut out = Vec::new();
        assert_eq!(file.copy_to(&mut out).unwrap(), 20);
        assert_eq!(&out[..], b"abcde567890123456789");
    }

    #[test]
    fn test_close_then_everything_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("close.bin");
        let file = seeded(&path);

        file.close().unwrap();
        assert!(file.is_closed());

        assert!(matches!(file.reader(), Err(Error::Closed)));
        assert!(matches!(file.writer_at(0), Err(Error::Closed)));
        assert!(matches!(file.appender(), Err(Error::Closed)));
        assert!(matches!(file.truncate(0), Err(Error::Closed)));
        assert!(matches!(file.stat(), Err(Error::Closed)));
        assert!(matches!(file.close(), Err(Error::Closed)));
        assert!(matches!(file.force_close(), Err(Error::Closed)));
    }

    #[test]
    fn test_close_waits_for_delayed_reader() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("close_wait.bin");
        let file = seeded(&path);

        let delay = Duration::from_millis(100);
        let started = Barrier::new(2);

        std::thread::scope(|s| {
            s.spawn(|| {
                let mut reader = file.reader().unwrap();
                started.wait();
                std::thread::sleep(delay);
                let mut buf = [0u8; 20];
                assert_eq!(reader.read(&mut buf).unwrap(), 20);
                reader.close().unwrap();
            });

            started.wait();
            let begin = Instant::now();
            file.close().unwrap();
            assert!(begin.elapsed() >= delay / 2);
            assert_eq!(file.in_flight().current(), 0);
        });
    }

    #[test]
    fn test_force_close_does_not_wait() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("force_close.bin");
        let file = seeded(&path);

        let mut reader = file.reader().unwrap();
        file.force_close().unwrap();

        let mut buf = [0u8; 4];
        assert!(matches!(reader.read(&mut buf), Err(Error::Closed)));
        assert!(matches!(reader.read(&mut []), Err(Error::Closed)));
        assert!(matches!(reader.read_at(&mut buf, 20), Err(Error::Closed)));
        assert!(matches!(reader.seek(SeekFrom::Start(3)), Err(Error::Closed)));
        assert!(matches!(reader.map(), Err(Error::Closed)));
        assert!(std::io::Seek::seek(&mut reader, SeekFrom::Start(3)).is_err());
        // 释放游标自身的锁仍然成功
        reader.close().unwrap();

        assert!(matches!(file.reader(), Err(Error::Closed)));
        assert!(matches!(file.close(), Err(Error::Closed)));
    }

    #[test]
    fn test_force_close_fails_open_appender() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("force_close_appender.bin");
        let file = seeded(&path);

        let mut appender = file.appender().unwrap();
        file.force_close().unwrap();
        assert!(matches!(appender.write(b"x"), Err(Error::Closed)));
        appender.close().unwrap();
        assert_eq!(file.in_flight().current(), 0);
    }

    #[test]
    fn test_try_writer_times_out_behind_reader() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("try_writer.bin");
        let file = seeded(&path);

        let started = Barrier::new(2);
        let done = Barrier::new(2);

        std::thread::scope(|s| {
            s.spawn(|| {
                let reader = file.reader().unwrap();
                started.wait();
                done.wait();
                drop(reader);
            });

            started.wait();
            let result = file.try_writer_for(0, Duration::from_millis(20));
            assert!(matches!(result, Err(Error::TimedOut)));
            done.wait();
        });

        assert_eq!(file.in_flight().current(), 0);
    }

    #[test]
    fn test_try_appender_is_all_or_nothing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("try_appender.bin");
        let file = seeded(&path);

        let started = Barrier::new(2);
        let done = Barrier::new(2);

        std::thread::scope(|s| {
            s.spawn(|| {
                let mut appender = file.appender().unwrap();
                started.wait();
                done.wait();
                appender.close().unwrap();
            });

            started.wait();
            let result = file.try_appender_for(Duration::from_millis(20));
            assert!(matches!(result, Err(Error::TimedOut)));
            // 超时的追加器没有残留共享主锁，读取器仍可获取
            let reader = file.try_reader_for(0, Duration::from_millis(100)).unwrap();
            drop(reader);
            done.wait();
        });

        // 全部释放后可以独占
        let mut writer = file.try_writer_for(0, Duration::from_millis(100)).unwrap();
        writer.close().unwrap();
        assert_eq!(file.in_flight().current(), 0);
    }

    #[test]
    fn test_sync_on_writer_close() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sync.bin");

        let file = Options::new().sync_on_writer_close(true).open(&path).unwrap();
        assert!(file.options().sync_on_writer_close);

        file.append(DECADE).unwrap();
        let mut appender = file.appender().unwrap();
        appender.write_all(DECADE).unwrap();
        appender.close().unwrap();

        assert_eq!(file.size(), 20);
        assert_eq!(std::fs::read(&path).unwrap().len(), 20);
    }
}

/// Reader 游标测试
#[cfg(test)]
mod reader_tests {
    use super::*;

    #[test]
    fn test_reader_snapshot_limits_reads() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("reader_limit.bin");
        let file = seeded(&path);

        // 同一线程先持有读取器再获取追加器
        let mut reader = file.reader().unwrap();
        let mut appender = file.appender().unwrap();
        appender.write_all(DECADE).unwrap();
        appender.write_all(DECADE).unwrap();
        appender.close().unwrap();

        let mut out = Vec::new();
        reader.read_to_end(&mut out).unwrap();
        reader.close().unwrap();
        assert_eq!(out.len(), 20);
        assert_eq!(&out[..10], DECADE);

        // 新读取器能看到追加的内容
        let mut reader = file.reader().unwrap();
        let mut out = Vec::new();
        reader.read_to_end(&mut out).unwrap();
        reader.close().unwrap();
        assert_eq!(out.len(), 40);
    }

    #[test]
    fn test_read_advances_offset() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("reader_advance.bin");
        let file = seeded(&path);

        let mut reader = file.reader_at(5).unwrap();
        let mut buf = [0u8; 5];
        assert_eq!(reader.read(&mut buf).unwrap(), 5);
        assert_eq!(&buf, b"56789");
        assert_eq!(reader.position(), 10);

        // 跨越快照边界只返回剩余部分
        let mut buf = [0u8; 32];
        assert_eq!(reader.read(&mut buf).unwrap(), 10);
        assert_eq!(reader.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn test_read_at_is_stateless() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("reader_read_at.bin");
        let file = seeded(&path);

        let reader = file.reader().unwrap();
        let mut buf = [0u8; 3];
        assert_eq!(reader.read_at(&mut buf, 12).unwrap(), 3);
        assert_eq!(&buf, b"234");
        assert_eq!(reader.position(), 0);

        // 超出快照
        assert_eq!(reader.read_at(&mut buf, 20).unwrap(), 0);
        assert_eq!(reader.read_at(&mut buf, 100).unwrap(), 0);
    }

    #[test]
    fn test_seek_bounds() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("reader_seek.bin");
        let file = seeded(&path);

        let mut reader = file.reader().unwrap();
        assert_eq!(reader.snapshot_len(), 20);

        assert_eq!(reader.seek(SeekFrom::End(0)).unwrap(), 20);
        assert_eq!(reader.seek(SeekFrom::End(-5)).unwrap(), 15);
        assert_eq!(reader.seek(SeekFrom::Current(-15)).unwrap(), 0);
        assert_eq!(reader.seek(SeekFrom::Start(7)).unwrap(), 7);

        // 超出范围，偏移保持不变
        assert!(matches!(
            reader.seek(SeekFrom::Start(21)),
            Err(Error::InvalidRange { offset: 21, size: 20 })
        ));
        assert!(matches!(
            reader.seek(SeekFrom::Current(-9)),
            Err(Error::InvalidRange { offset: -2, size: 20 })
        ));
        assert!(matches!(reader.seek(SeekFrom::End(1)), Err(Error::InvalidRange { .. })));
        assert_eq!(reader.position(), 7);
    }

    #[test]
    fn test_seek_to_unpositioned() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("reader_unpositioned.bin");
        let file = seeded(&path);

        let mut reader = file.reader().unwrap();
        // 起始位置之前的一个字节是允许的
        assert_eq!(reader.seek(SeekFrom::Current(-1)).unwrap(), Reader::UNPOSITIONED);
        assert_eq!(reader.position(), -1);
        assert_eq!(reader.seek(SeekFrom::End(-21)).unwrap(), -1);

        // 未定位状态下读取失败，偏移不变
        let mut buf = [0u8; 4];
        assert!(matches!(
            reader.read(&mut buf),
            Err(Error::InvalidRange { offset: -1, size: 20 })
        ));
        assert_eq!(reader.position(), -1);

        // 向前定位后恢复正常
        assert_eq!(reader.seek(SeekFrom::Current(1)).unwrap(), 0);
        assert_eq!(reader.read(&mut buf).unwrap(), 4);
        assert_eq!(&buf, b"0123");

        // std Seek 不接受负偏移
        let err = std::io::Seek::seek(&mut reader, SeekFrom::Current(-5)).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidInput);
        assert_eq!(reader.position(), 4);
    }

    #[test]
    fn test_std_traits() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("reader_traits.bin");
        let file = seeded(&path);

        let mut reader = file.reader().unwrap();
        std::io::Seek::seek(&mut reader, SeekFrom::Start(10)).unwrap();
        let mut out = String::new();
        reader.read_to_string(&mut out).unwrap();
        assert_eq!(out.as_bytes(), DECADE);

        let err = std::io::Seek::seek(&mut reader, SeekFrom::Start(99)).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidInput);
    }

    #[test]
    fn test_map_snapshot() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("reader_map.bin");
        let file = seeded(&path);

        let reader = file.reader().unwrap();
        let map = reader.map().unwrap();
        assert_eq!(map.len(), 20);
        assert_eq!(&map[..10], DECADE);
        assert_eq!(map.as_slice(), &map[..]);
    }

    #[test]
    fn test_map_empty_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("reader_map_empty.bin");
        let file = SharedFile::open(&path).unwrap();

        let reader = file.reader().unwrap();
        assert!(matches!(reader.map(), Err(Error::EmptyFile)));
    }

    #[test]
    fn test_use_after_close() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("reader_closed.bin");
        let file = seeded(&path);

        let mut reader = file.reader().unwrap();
        reader.close().unwrap();
        assert!(reader.is_closed());

        let mut buf = [0u8; 4];
        assert!(matches!(reader.read(&mut buf), Err(Error::Closed)));
        assert!(matches!(reader.read_at(&mut buf, 0), Err(Error::Closed)));
        assert!(matches!(reader.seek(SeekFrom::Start(0)), Err(Error::Closed)));
        assert!(matches!(reader.map(), Err(Error::Closed)));
        assert!(matches!(reader.close(), Err(Error::Closed)));
        assert_eq!(file.in_flight().current(), 0);

        // 通过 std trait 返回的错误仍可还原为 Closed
        let err = Read::read(&mut reader, &mut buf).unwrap_err();
        assert!(Error::from_io_ref(&err).is_some_and(Error::is_closed));
        assert!(Error::from(err).is_closed());
    }
}

/// Writer 游标测试
#[cfg(test)]
mod writer_tests {
    use super::*;

    #[test]
    fn test_writer_truncating_position() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("writer_start.bin");
        let file = seeded(&path);

        let mut writer = file.writer(false).unwrap();
        assert_eq!(writer.position(), 0);
        writer.write_all(b"ab").unwrap();
        writer.close().unwrap();

        let mut buf = [0u8; 4];
        file.read_at(&mut buf, 0).unwrap();
        assert_eq!(&buf, b"ab23");
    }

    #[test]
    fn test_writer_append_flag_uses_cached_size() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("writer_append.bin");
        let file = seeded(&path);

        let mut writer = file.writer(true).unwrap();
        assert_eq!(writer.position(), 20);
        writer.write_all(b"xyz").unwrap();
        assert_eq!(writer.position(), 23);
        writer.close().unwrap();

        assert_eq!(file.size(), 23);
    }

    #[test]
    fn test_writer_seek_and_write_at() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("writer_seek.bin");
        let file = seeded(&path);

        let mut writer = file.writer_at(0).unwrap();
        assert_eq!(writer.seek(SeekFrom::End(0)).unwrap(), 20);
        writer.write_all(b"!!").unwrap();

        // 定位写入不移动游标
        assert_eq!(writer.write_at(b"AB", 0).unwrap(), 2);
        assert_eq!(writer.position(), 22);
        writer.write_all(b"?").unwrap();
        writer.close().unwrap();

        let mut out = Vec::new();
        file.copy_to(&mut out).unwrap();
        assert_eq!(&out[..], b"AB234567890123456789!!?");
        assert_eq!(file.size(), 23);
    }

    #[test]
    fn test_writer_std_traits() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("writer_traits.bin");
        let file = SharedFile::open(&path).unwrap();

        let mut writer = file.writer_at(0).unwrap();
        write!(writer, "{}-{}", 1, 2).unwrap();
        Write::flush(&mut writer).unwrap();
        writer.close().unwrap();

        assert_eq!(file.size(), 3);
    }

    #[test]
    fn test_dropped_writer_releases_and_reconciles() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("writer_drop.bin");
        let file = seeded(&path);

        {
            let mut writer = file.writer(true).unwrap();
            writer.write_all(b"dropped").unwrap();
        }

        assert_eq!(file.size(), 27);
        assert_eq!(file.in_flight().current(), 0);
        let reader = file.try_reader_for(0, Duration::from_millis(100)).unwrap();
        assert_eq!(reader.snapshot_len(), 27);
    }

    #[test]
    fn test_use_after_close() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("writer_closed.bin");
        let file = seeded(&path);

        let mut writer = file.writer_at(0).unwrap();
        writer.close().unwrap();
        assert!(writer.is_closed());

        assert!(matches!(writer.write(b"x"), Err(Error::Closed)));
        assert!(matches!(writer.write_at(b"x", 0), Err(Error::Closed)));
        assert!(matches!(writer.seek(SeekFrom::Start(0)), Err(Error::Closed)));
        assert!(matches!(writer.close(), Err(Error::Closed)));
        assert!(Write::flush(&mut writer).is_err());
    }
}

/// Appender 游标测试
#[cfg(test)]
mod appender_tests {
    use super::*;

    #[test]
    fn test_appender_grows_size_per_write() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("appender_grow.bin");
        let file = seeded(&path);

        let mut appender = file.appender().unwrap();
        assert_eq!(appender.position(), 20);
        appender.write_all(b"abc").unwrap();
        assert_eq!(appender.position(), 23);

        // 追加期间创建的读取器看到已落盘的字节
        let reader = file.reader().unwrap();
        assert_eq!(reader.snapshot_len(), 23);
        drop(reader);

        appender.close().unwrap();
        assert_eq!(file.size(), 23);
        assert_eq!(file.stat().unwrap().len(), 23);
    }

    #[test]
    fn test_appender_std_write() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("appender_traits.bin");
        let file = SharedFile::open(&path).unwrap();

        let mut appender = file.appender().unwrap();
        writeln!(appender, "line {}", 1).unwrap();
        Write::flush(&mut appender).unwrap();
        drop(appender);

        assert_eq!(file.size(), 7);
        assert_eq!(file.in_flight().current(), 0);
    }

    #[test]
    fn test_use_after_close() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("appender_closed.bin");
        let file = seeded(&path);

        let mut appender = file.appender().unwrap();
        appender.close().unwrap();
        assert!(appender.is_closed());

        assert!(matches!(appender.write(b"x"), Err(Error::Closed)));
        assert!(matches!(appender.write_all(b"x"), Err(Error::Closed)));
        assert!(matches!(appender.close(), Err(Error::Closed)));
        assert_eq!(file.size(), 20);
    }
}

/// 并发场景测试
#[cfg(test)]
mod concurrency_tests {
    use super::*;

    #[test]
    fn test_concurrent_readers_and_appenders() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("concurrent_read_append.bin");
        let file = seeded(&path);

        std::thread::scope(|s| {
            for i in 0..10u8 {
                let file = &file;
                s.spawn(move || {
                    let mut appender = file.appender().unwrap();
                    let run = [b'0' + i; 10];
                    assert_eq!(appender.write(&run).unwrap(), 10);
                    appender.close().unwrap();
                });

                s.spawn(move || {
                    let mut reader = file.reader_at(10).unwrap();
                    let mut buf = [0u8; 10];
                    assert_eq!(reader.read(&mut buf).unwrap(), 10);
                    assert_eq!(&buf, DECADE);
                    reader.close().unwrap();
                });
            }
        });

        assert_eq!(file.size(), 120);

        let mut out = Vec::new();
        file.copy_to(&mut out).unwrap();
        assert_eq!(out.len(), 120);

        // 每次追加都是连续的 10 字节
        let mut digits: Vec<u8> = out[20..]
            .chunks(10)
            .map(|chunk| {
                assert!(chunk.iter().all(|&b| b == chunk[0]));
                chunk[0]
            })
            .collect();
        digits.sort_unstable();
        assert_eq!(digits, b"0123456789");

        file.close().unwrap();
    }

    #[test]
    fn test_readers_see_prefix_of_append_history() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("prefix.bin");
        let file = SharedFile::open(&path).unwrap();

        std::thread::scope(|s| {
            for i in 0..4u8 {
                let file = &file;
                s.spawn(move || {
                    for _ in 0..25 {
                        let mut appender = file.appender().unwrap();
                        appender.write_all(&[b'a' + i; 8]).unwrap();
                        appender.close().unwrap();
                    }
                });
            }

            for _ in 0..4 {
                let file = &file;
                s.spawn(move || {
                    for _ in 0..25 {
                        let mut reader = file.reader().unwrap();
                        let snapshot = reader.snapshot_len();
                        let mut out = Vec::new();
                        reader.read_to_end(&mut out).unwrap();
                        reader.close().unwrap();

                        // 快照总是完整追加记录的边界
                        assert_eq!(out.len() as u64, snapshot);
                        assert_eq!(out.len() % 8, 0);
                        for record in out.chunks(8) {
                            assert!(record.iter().all(|&b| b == record[0]));
                        }
                    }
                });
            }
        });

        assert_eq!(file.size(), 4 * 25 * 8);
    }

    #[test]
    fn test_writer_never_overlaps() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("overlap.bin");
        let file = seeded(&path);

        let readers = AtomicUsize::new(0);
        let appenders = AtomicUsize::new(0);
        let writers = AtomicUsize::new(0);
        let violation = AtomicBool::new(false);

        let check = |ok: bool| {
            if !ok {
                violation.store(true, Ordering::SeqCst);
            }
        };

        std::thread::scope(|s| {
            for _ in 0..3 {
                s.spawn(|| {
                    for _ in 0..50 {
                        let mut writer = file.writer_at(0).unwrap();
                        writers.fetch_add(1, Ordering::SeqCst);
                        check(writers.load(Ordering::SeqCst) == 1);
                        check(readers.load(Ordering::SeqCst) == 0);
                        check(appenders.load(Ordering::SeqCst) == 0);
                        writer.write_all(DECADE).unwrap();
                        writers.fetch_sub(1, Ordering::SeqCst);
                        writer.close().unwrap();
                    }
                });

                s.spawn(|| {
                    for _ in 0..50 {
                        let mut appender = file.appender().unwrap();
                        appenders.fetch_add(1, Ordering::SeqCst);
                        check(appenders.load(Ordering::SeqCst) == 1);
                        check(writers.load(Ordering::SeqCst) == 0);
                        appender.write_all(b"a").unwrap();
                        appenders.fetch_sub(1, Ordering::SeqCst);
                        appender.close().unwrap();
                    }
                });

                s.spawn(|| {
                    for _ in 0..50 {
                        let mut reader = file.reader().unwrap();
                        readers.fetch_add(1, Ordering::SeqCst);
                        check(writers.load(Ordering::SeqCst) == 0);
                        let mut buf = [0u8; 10];
                        reader.read(&mut buf).unwrap();
                        readers.fetch_sub(1, Ordering::SeqCst);
                        reader.close().unwrap();
                    }
                });
            }
        });

        assert!(!violation.load(Ordering::SeqCst));
        assert_eq!(file.size(), 20 + 3 * 50);
        assert_eq!(file.in_flight().current(), 0);
    }

    #[test]
    fn test_writer_not_starved_by_readers() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("starve.bin");
        let file = seeded(&path);

        let stop = AtomicBool::new(false);

        std::thread::scope(|s| {
            // 读取器持续重叠，主锁从不空闲
            for _ in 0..4 {
                s.spawn(|| {
                    while !stop.load(Ordering::SeqCst) {
                        let reader = file.reader().unwrap();
                        std::thread::sleep(Duration::from_millis(2));
                        drop(reader);
                    }
                });
            }

            std::thread::sleep(Duration::from_millis(20));
            let begin = Instant::now();
            let mut writer = file.try_writer_for(0, Duration::from_secs(2)).unwrap();
            assert!(begin.elapsed() < Duration::from_secs(2));
            stop.store(true, Ordering::SeqCst);
            writer.write_all(b"W").unwrap();
            writer.close().unwrap();
        });

        let mut buf = [0u8; 1];
        file.read_at(&mut buf, 0).unwrap();
        assert_eq!(&buf, b"W");
        assert_eq!(file.in_flight().current(), 0);
    }

    #[test]
    fn test_close_not_starved_by_readers() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("starve_close.bin");
        let file = seeded(&path);

        std::thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    // 关闭后获取读取器返回 Closed，循环结束
                    while let Ok(reader) = file.reader() {
                        std::thread::sleep(Duration::from_millis(2));
                        drop(reader);
                    }
                });
            }

            std::thread::sleep(Duration::from_millis(20));
            file.close().unwrap();
        });

        assert!(file.is_closed());
        assert_eq!(file.in_flight().current(), 0);
    }

    #[test]
    fn test_shared_through_arc() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("arc.bin");
        let file = std::sync::Arc::new(seeded(&path));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let file = std::sync::Arc::clone(&file);
                std::thread::spawn(move || {
                    let mut appender = file.appender().unwrap();
                    appender.write_all(DECADE).unwrap();
                    appender.close().unwrap();
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(file.size(), 60);
    }
}
