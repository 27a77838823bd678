//! ### English
//! Relay configuration.
//!
//! ### 中文
//! 中继配置。

use crate::engine::consumer::ConsumerRuntime;
use crate::engine::flags;

/// ### English
/// Default capacity of the pending-renderer queue drained by `pump`.
///
/// ### 中文
/// `pump` 所 drain 的待处理渲染器队列的默认容量。
pub const DEFAULT_PENDING_CAPACITY: usize = 1024;

/// ### English
/// How deliveries reach the consumer.
///
/// ### 中文
/// 投递如何到达消费者。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DispatchMode {
    /// ### English
    /// `Direct` if the runtime accepts foreign-thread calls, otherwise `Queued`.
    ///
    /// ### 中文
    /// 运行时允许外部线程调用时为 `Direct`，否则为 `Queued`。
    #[default]
    Auto,
    /// ### English
    /// Invoke the handler on the producer thread, inside the runtime scope.
    ///
    /// ### 中文
    /// 在生产者线程上、运行时作用域内调用处理函数。
    Direct,
    /// ### English
    /// Park the newest frame per renderer; deliver it on the consumer's turn.
    ///
    /// ### 中文
    /// 每个渲染器只暂存最新帧；在消费者调度轮次投递。
    Queued,
}

impl DispatchMode {
    /// ### English
    /// Resolves to `Direct` or `Queued` for `runtime`.
    ///
    /// `Direct` is never returned for a runtime that rejects foreign-thread calls.
    ///
    /// ### 中文
    /// 针对 `runtime` 解析为 `Direct` 或 `Queued`。
    ///
    /// 对不接受外部线程调用的运行时，永远不会返回 `Direct`。
    pub fn resolve(self, runtime: &dyn ConsumerRuntime) -> Self {
        let foreign_ok = runtime.supports_foreign_threads();
        match self {
            Self::Auto if foreign_ok => Self::Direct,
            Self::Auto => Self::Queued,
            Self::Direct if foreign_ok => Self::Direct,
            Self::Direct => {
                tracing::warn!(
                    "direct dispatch requested but the consumer runtime rejects foreign threads; using queued dispatch"
                );
                Self::Queued
            }
            Self::Queued => Self::Queued,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RelayConfig {
    pub dispatch: DispatchMode,
    /// ### English
    /// Capacity of the pending-renderer queue; overflow falls back to a full scan in `pump`.
    ///
    /// ### 中文
    /// 待处理渲染器队列容量；溢出时 `pump` 回退为全量扫描。
    pub pending_capacity: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            dispatch: DispatchMode::Auto,
            pending_capacity: DEFAULT_PENDING_CAPACITY,
        }
    }
}

impl RelayConfig {
    /// ### English
    /// Decodes the C ABI bitmask (see [`crate::engine::flags`]).
    ///
    /// ### 中文
    /// 解码 C ABI 位掩码（见 [`crate::engine::flags`]）。
    pub fn from_flags(relay_flags: u32) -> Self {
        let dispatch = if relay_flags & flags::XIAN_FRAME_RELAY_FLAG_QUEUED_DISPATCH != 0 {
            DispatchMode::Queued
        } else if relay_flags & flags::XIAN_FRAME_RELAY_FLAG_DIRECT_DISPATCH != 0 {
            DispatchMode::Direct
        } else {
            DispatchMode::Auto
        };
        Self {
            dispatch,
            ..Self::default()
        }
    }
}
