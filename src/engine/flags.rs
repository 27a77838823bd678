//! ### English
//! Bitflags controlling relay behavior.
//!
//! These are passed through the C ABI as a `u32` bitmask.
//!
//! ### 中文
//! 控制中继行为的位标志（bitflags）。
//!
//! 通过 C ABI 以 `u32` 位掩码传入。

/// ### English
/// Always park frames in the per-renderer mailbox and deliver them on the consumer's turn
/// (`xian_frame_relay_pump`), even if the runtime accepts foreign-thread calls.
///
/// ### 中文
/// 始终把帧暂存在每个渲染器的邮箱中，并在消费者调度轮次（`xian_frame_relay_pump`）投递，
/// 即使运行时允许外部线程调用。
pub const XIAN_FRAME_RELAY_FLAG_QUEUED_DISPATCH: u32 = 1 << 0;

/// ### English
/// Request direct dispatch on the producer thread.
///
/// Ignored (with a warning) when the runtime hooks declare `supports_foreign_threads = 0`.
/// If both dispatch flags are set, queued dispatch wins.
///
/// ### 中文
/// 请求在生产者线程上直接分发。
///
/// 若运行时钩子声明 `supports_foreign_threads = 0`，该标志会被忽略（并输出警告）。
/// 若两个分发标志同时设置，以排队分发为准。
pub const XIAN_FRAME_RELAY_FLAG_DIRECT_DISPATCH: u32 = 1 << 1;
