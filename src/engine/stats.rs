//! ### English
//! Per-renderer delivery counters.
//!
//! ### 中文
//! 每个渲染器的投递计数器。

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use crate::engine::error::DropReason;

/// ### English
/// Point-in-time copy of a renderer's counters.
///
/// ### 中文
/// 渲染器计数器的某一时刻快照。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// ### English
    /// Frames the consumer handled without raising.
    ///
    /// ### 中文
    /// 消费者未抛错处理完成的帧数。
    pub delivered: u64,
    /// ### English
    /// Frames parked for the consumer's turn (queued dispatch).
    ///
    /// ### 中文
    /// 为消费者调度轮次暂存的帧数（排队分发）。
    pub queued: u64,
    /// ### English
    /// Parked frames replaced by a newer one before the consumer drained them.
    ///
    /// ### 中文
    /// 在消费者取走前被新帧取代的暂存帧数。
    pub superseded: u64,
    pub no_consumer: u64,
    pub invalid_binding: u64,
    pub consumer_error: u64,
}

#[derive(Default)]
pub(crate) struct RendererStats {
    delivered: AtomicU64,
    queued: AtomicU64,
    superseded: AtomicU64,
    no_consumer: AtomicU64,
    invalid_binding: AtomicU64,
    consumer_error: AtomicU64,
    consecutive_faults: AtomicU32,
}

impl RendererStats {
    #[inline]
    pub(crate) fn record_delivered(&self) {
        self.delivered.fetch_add(1, Ordering::Relaxed);
        self.consecutive_faults.store(0, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_queued(&self, superseded: bool) {
        self.queued.fetch_add(1, Ordering::Relaxed);
        if superseded {
            self.superseded.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// ### English
    /// Counts one drop. For consumer errors, returns the length of the current fault streak.
    ///
    /// ### 中文
    /// 记录一次丢帧。对于消费者错误，返回当前连续出错的次数。
    #[inline]
    pub(crate) fn record_dropped(&self, reason: DropReason) -> u32 {
        match reason {
            DropReason::NoConsumer => {
                self.no_consumer.fetch_add(1, Ordering::Relaxed);
                0
            }
            DropReason::InvalidBinding => {
                self.invalid_binding.fetch_add(1, Ordering::Relaxed);
                0
            }
            DropReason::ConsumerError => {
                self.consumer_error.fetch_add(1, Ordering::Relaxed);
                self.consecutive_faults
                    .fetch_add(1, Ordering::Relaxed)
                    .saturating_add(1)
            }
        }
    }

    pub(crate) fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            delivered: self.delivered.load(Ordering::Relaxed),
            queued: self.queued.load(Ordering::Relaxed),
            superseded: self.superseded.load(Ordering::Relaxed),
            no_consumer: self.no_consumer.load(Ordering::Relaxed),
            invalid_binding: self.invalid_binding.load(Ordering::Relaxed),
            consumer_error: self.consumer_error.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fault_streak_resets_after_a_delivery() {
        let stats = RendererStats::default();
        assert_eq!(stats.record_dropped(DropReason::ConsumerError), 1);
        assert_eq!(stats.record_dropped(DropReason::ConsumerError), 2);
        stats.record_delivered();
        assert_eq!(stats.record_dropped(DropReason::ConsumerError), 1);

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.consumer_error, 3);
        assert_eq!(snapshot.delivered, 1);
    }
}
