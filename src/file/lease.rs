//! Lock leases and the in-flight counter
//!
//! 锁租约与在途计数器
//!
//! Every cursor owns exactly one [`Lease`]. The lease owns the lock guards it
//! was granted and is registered in the handle's [`InFlight`] counter. Dropping
//! the lease first unregisters it, then releases the guards in reverse
//! acquisition order, so a lock can never be released twice or forgotten.
//!
//! 每个游标恰好拥有一个 [`Lease`]。租约持有获得的锁守卫，并在句柄的
//! [`InFlight`] 计数器中登记。释放租约时先注销登记，再按获取的逆序释放守卫，
//! 因此锁不会被重复释放或遗漏释放。

use super::shared_file::SharedFile;
use parking_lot::{Condvar, Mutex, MutexGuard, RwLockReadGuard, RwLockWriteGuard};
use std::time::Instant;

/// Counter of outstanding cursors, used to gate graceful close
///
/// 未关闭游标的计数器，用于控制优雅关闭
#[derive(Debug, Default)]
pub(crate) struct InFlight {
    count: Mutex<usize>,
    drained: Condvar,
}

impl InFlight {
    #[inline]
    pub(crate) fn enter(&self) {
        *self.count.lock() += 1;
    }

    pub(crate) fn exit(&self) {
        let mut count = self.count.lock();
        debug_assert!(*count > 0, "in-flight counter underflow");
        *count = count.saturating_sub(1);
        if *count == 0 {
            self.drained.notify_all();
        }
    }

    /// Block until no cursor is outstanding
    ///
    /// 阻塞直到没有未关闭的游标
    pub(crate) fn wait_drained(&self) {
        let mut count = self.count.lock();
        while *count > 0 {
            self.drained.wait(&mut count);
        }
    }

    #[inline]
    pub(crate) fn current(&self) -> usize {
        *self.count.lock()
    }
}

/// How long an acquisition may block
///
/// 获取锁时允许阻塞的时长
#[derive(Debug, Clone, Copy)]
pub(crate) enum Wait {
    Forever,
    Until(Instant),
}

/// Which cursor a lease belongs to, for logging
///
/// 租约所属的游标类型，用于日志
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LeaseKind {
    Reader,
    Writer,
    Appender,
}

/// Lock holdings of a single cursor
///
/// 单个游标持有的锁
///
/// `G` is the guard (or tuple of guards) granted at acquisition. Tuple
/// elements drop front to back, so guards are listed last-acquired first.
///
/// `G` 是获取时得到的守卫（或守卫元组）。元组元素从前往后释放，
/// 因此按最后获取的在前排列。
pub(crate) struct Lease<'a, G> {
    file: &'a SharedFile,
    kind: LeaseKind,
    _guard: G,
}

/// Primary lock held shared
///
/// 共享持有主锁
pub(crate) type SharedLease<'a> = Lease<'a, RwLockReadGuard<'a, ()>>;

/// Primary lock held exclusively
///
/// 独占持有主锁
pub(crate) type ExclusiveLease<'a> = Lease<'a, RwLockWriteGuard<'a, ()>>;

/// Append lock plus primary lock held shared
///
/// 追加锁加共享主锁
pub(crate) type AppendLease<'a> = Lease<'a, (MutexGuard<'a, ()>, RwLockReadGuard<'a, ()>)>;

impl<'a, G> Lease<'a, G> {
    /// Register a freshly acquired guard with the in-flight counter
    ///
    /// 将新获取的守卫登记到在途计数器
    pub(crate) fn register(file: &'a SharedFile, kind: LeaseKind, guard: G) -> Self {
        file.in_flight().enter();
        tracing::trace!(?kind, "cursor acquired");
        Self {
            file,
            kind,
            _guard: guard,
        }
    }

    #[inline]
    pub(crate) fn file(&self) -> &'a SharedFile {
        self.file
    }
}

impl<G> Drop for Lease<'_, G> {
    fn drop(&mut self) {
        // Guards are released after this body returns.
        self.file.in_flight().exit();
        tracing::trace!(kind = ?self.kind, "cursor released");
    }
}
