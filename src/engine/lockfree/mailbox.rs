use std::ptr;
use std::sync::atomic::{AtomicPtr, Ordering};

use crate::engine::frame::FrameMetadata;

/// ### English
/// Owned copy of one frame parked for the consumer's turn.
///
/// ### 中文
/// 为消费者调度轮次暂存的一帧数据副本（自有）。
#[derive(Default)]
pub(crate) struct ParkedFrame {
    pub metadata: FrameMetadata,
    pub bytes: Vec<u8>,
}

/// ### English
/// Depth-1, drop-oldest frame mailbox (latest-wins) with a single-node recycle cache.
///
/// - Producer side: [`Self::post`] copies into a recycled node and swaps it in; an undelivered
///   older node is recycled (dropped for the consumer).
/// - Consumer side: [`Self::take`] swaps the pending node out; [`Self::recycle`] hands it back
///   after the handler returns so its buffer capacity is reused by the next post.
/// - Peak memory: one pending node plus one cached node.
///
/// ### 中文
/// 深度为 1、丢弃最旧帧（latest-wins）的帧邮箱，带单节点回收缓存。
///
/// - 生产者侧：[`Self::post`] 把数据拷贝进回收节点并原子交换进去；尚未投递的旧节点被回收
///  （对消费者而言即被丢弃）。
/// - 消费者侧：[`Self::take`] 原子交换取出待处理节点；处理函数返回后用 [`Self::recycle`]
///   归还，使其缓冲区容量被下一次 post 复用。
/// - 峰值内存：一个待处理节点加一个缓存节点。
pub(crate) struct FrameMailbox {
    pending: AtomicPtr<ParkedFrame>,
    free: AtomicPtr<ParkedFrame>,
}

impl Default for FrameMailbox {
    fn default() -> Self {
        Self {
            pending: AtomicPtr::new(ptr::null_mut()),
            free: AtomicPtr::new(ptr::null_mut()),
        }
    }
}

impl FrameMailbox {
    /// ### English
    /// Parks a copy of `bytes`. Returns `true` if an undelivered older frame was superseded.
    ///
    /// ### 中文
    /// 暂存 `bytes` 的一份副本。若有尚未投递的旧帧被取代则返回 `true`。
    pub(crate) fn post(&self, metadata: FrameMetadata, bytes: &[u8]) -> bool {
        let mut node = self.pop_free().unwrap_or_default();
        node.metadata = metadata;
        node.bytes.clear();
        node.bytes.extend_from_slice(bytes);

        let old = self.pending.swap(Box::into_raw(node), Ordering::AcqRel);
        if old.is_null() {
            return false;
        }
        self.recycle(unsafe { Box::from_raw(old) });
        true
    }

    #[inline]
    pub(crate) fn is_pending(&self) -> bool {
        !self.pending.load(Ordering::Acquire).is_null()
    }

    #[inline]
    pub(crate) fn take(&self) -> Option<Box<ParkedFrame>> {
        let ptr = self.pending.swap(ptr::null_mut(), Ordering::AcqRel);
        if ptr.is_null() {
            None
        } else {
            Some(unsafe { Box::from_raw(ptr) })
        }
    }

    /// ### English
    /// Returns a node to the cache; a previously cached node is freed.
    ///
    /// ### 中文
    /// 把节点放回缓存；原先缓存的节点会被释放。
    #[inline]
    pub(crate) fn recycle(&self, node: Box<ParkedFrame>) {
        let old = self.free.swap(Box::into_raw(node), Ordering::AcqRel);
        if !old.is_null() {
            unsafe {
                drop(Box::from_raw(old));
            }
        }
    }

    #[inline]
    fn pop_free(&self) -> Option<Box<ParkedFrame>> {
        let ptr = self.free.swap(ptr::null_mut(), Ordering::AcqRel);
        if ptr.is_null() {
            None
        } else {
            Some(unsafe { Box::from_raw(ptr) })
        }
    }
}

impl Drop for FrameMailbox {
    fn drop(&mut self) {
        drop(self.take());
        drop(self.pop_free());
    }
}
