//! ### English
//! Bounded renderer-ID queue used to signal "frame parked" to the consumer's turn.
//! On overflow we set a flag so the consumer can fall back to scanning every renderer.
//!
//! ### 中文
//! 有界渲染器 ID 队列：用于向消费者调度轮次信号化“有暂存帧”。
//! 溢出时设置标记，消费者可回退为扫描所有渲染器，避免漏处理。
use std::sync::atomic::{AtomicBool, Ordering};

use crossbeam_channel as channel;

use crate::engine::sequence::RendererId;

pub(crate) struct PendingRendererQueue {
    tx: channel::Sender<RendererId>,
    rx: channel::Receiver<RendererId>,
    overflowed: AtomicBool,
}

impl PendingRendererQueue {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        let (tx, rx) = channel::bounded(capacity.max(1));
        Self {
            tx,
            rx,
            overflowed: AtomicBool::new(false),
        }
    }

    /// ### English
    /// Tries to enqueue an ID.
    ///
    /// Returns `true` on success; returns `false` if the queue is full (and sets the overflow flag).
    ///
    /// ### 中文
    /// 尝试入队一个 ID。
    ///
    /// 成功返回 `true`；若队列已满则返回 `false`（并设置 overflow 标记）。
    pub(crate) fn push(&self, id: RendererId) -> bool {
        match self.tx.try_send(id) {
            Ok(()) => true,
            Err(_) => {
                self.overflowed.store(true, Ordering::Release);
                false
            }
        }
    }

    pub(crate) fn pop(&self) -> Option<RendererId> {
        self.rx.try_recv().ok()
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.rx.len()
    }

    /// ### English
    /// Returns and clears the overflow flag.
    ///
    /// ### 中文
    /// 返回并清除 overflow 标记。
    pub(crate) fn take_overflowed(&self) -> bool {
        self.overflowed.swap(false, Ordering::AcqRel)
    }
}
