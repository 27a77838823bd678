//! ### English
//! Renderer identity allocation.
//!
//! ### 中文
//! 渲染器标识分配。

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// ### English
/// Opaque 64-bit identity of one texture renderer.
///
/// Issued once by a [`SequenceAllocator`]; never reused or reassigned. `0` is never issued.
///
/// ### 中文
/// 单个纹理渲染器的不透明 64 位标识。
///
/// 由 [`SequenceAllocator`] 一次性分配；不会复用或重新分配。`0` 永远不会被分配。
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RendererId(u64);

impl RendererId {
    #[inline]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RendererId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// ### English
/// Monotonic identity generator shared by every renderer of one relay.
///
/// Lock-free; safe to call from any number of threads concurrently.
///
/// ### 中文
/// 同一中继下所有渲染器共享的单调标识生成器。
///
/// 无锁；可被任意数量的线程并发调用。
pub struct SequenceAllocator {
    last: AtomicU64,
}

impl Default for SequenceAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl SequenceAllocator {
    pub const fn new() -> Self {
        Self {
            last: AtomicU64::new(0),
        }
    }

    /// ### English
    /// Issues the next identity (strictly greater than every identity issued before it).
    ///
    /// ### 中文
    /// 分配下一个标识（严格大于此前分配的所有标识）。
    #[inline]
    pub fn next(&self) -> RendererId {
        RendererId(self.last.fetch_add(1, Ordering::Relaxed).wrapping_add(1))
    }
}
