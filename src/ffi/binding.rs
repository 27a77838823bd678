//! ### English
//! Foreign consumer callbacks and runtime hooks.
//!
//! ### 中文
//! 外部消费者回调与运行时钩子。

use std::ffi::c_void;

use crate::engine::binding::FrameCallable;
use crate::engine::consumer::ConsumerRuntime;
use crate::engine::error::ConsumerFault;
use crate::engine::frame::FrameBufferView;
use crate::engine::sequence::RendererId;

use super::XianFrameRelayMetadata;

/// ### English
/// Frame callback registered by the consumer.
///
/// - `data`/`data_length`: frame bytes, valid only until the callback returns (copy them).
/// - `metadata`: metadata of this frame, valid only until the callback returns.
/// - Return `0` on success; any other value is treated as "the consumer raised" and the frame is
///   dropped with `XIAN_FRAME_RELAY_DROPPED_CONSUMER_ERROR`.
///
/// ### 中文
/// 消费者注册的帧回调。
///
/// - `data`/`data_length`：帧字节，仅在回调返回前有效（请拷贝）。
/// - `metadata`：该帧的元数据，仅在回调返回前有效。
/// - 成功返回 `0`；其它值视为“消费者抛错”，该帧以 `XIAN_FRAME_RELAY_DROPPED_CONSUMER_ERROR` 丢弃。
pub type XianFrameRelayFrameCallback = extern "C" fn(
    user_data: *mut c_void,
    renderer_id: u64,
    data: *const u8,
    data_length: usize,
    metadata: *const XianFrameRelayMetadata,
) -> i32;

pub(super) struct ForeignCallable {
    user_data: *mut c_void,
    callback: XianFrameRelayFrameCallback,
}

// The embedder owns `user_data` and guarantees it is usable from the threads that deliver.
unsafe impl Send for ForeignCallable {}
unsafe impl Sync for ForeignCallable {}

impl ForeignCallable {
    pub(super) fn new(callback: XianFrameRelayFrameCallback, user_data: *mut c_void) -> Self {
        Self {
            user_data,
            callback,
        }
    }
}

impl FrameCallable for ForeignCallable {
    fn call(&self, renderer: RendererId, frame: FrameBufferView<'_>) -> Result<(), ConsumerFault> {
        let metadata = XianFrameRelayMetadata::from(frame.metadata());
        let bytes = frame.as_bytes();
        let status = (self.callback)(
            self.user_data,
            renderer.get(),
            bytes.as_ptr(),
            bytes.len(),
            &metadata,
        );
        if status == 0 {
            Ok(())
        } else {
            Err(ConsumerFault::Status(status))
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy)]
/// ### English
/// Consumer runtime hooks. Every function pointer is optional.
///
/// - `supports_foreign_threads`: non-zero if callbacks may run on producer threads (inside
///   `enter`/`leave`); `0` selects queued dispatch (`xian_frame_relay_pump`).
/// - `enter`/`leave`: acquire/release the runtime's calling context around each callback.
/// - `clear_error`: discard stale error state before each callback.
/// - `take_error`: return non-zero (and clear it) if the callback raised through the runtime.
///
/// ### 中文
/// 消费者运行时钩子。所有函数指针均为可选。
///
/// - `supports_foreign_threads`：非 0 表示回调可在生产者线程上执行（位于 `enter`/`leave` 之间）；
///   `0` 表示使用排队分发（`xian_frame_relay_pump`）。
/// - `enter`/`leave`：在每次回调前后获取/释放运行时调用上下文。
/// - `clear_error`：每次回调前丢弃遗留的错误状态。
/// - `take_error`：若回调通过运行时抛出了错误，返回非 0（并清除）。
pub struct XianFrameRelayRuntimeHooks {
    pub user_data: *mut c_void,
    pub supports_foreign_threads: u8,
    pub enter: Option<extern "C" fn(user_data: *mut c_void)>,
    pub leave: Option<extern "C" fn(user_data: *mut c_void)>,
    pub clear_error: Option<extern "C" fn(user_data: *mut c_void)>,
    pub take_error: Option<extern "C" fn(user_data: *mut c_void) -> i32>,
}

pub(super) struct ForeignRuntime {
    hooks: XianFrameRelayRuntimeHooks,
}

unsafe impl Send for ForeignRuntime {}
unsafe impl Sync for ForeignRuntime {}

impl ForeignRuntime {
    pub(super) fn new(hooks: XianFrameRelayRuntimeHooks) -> Self {
        Self { hooks }
    }
}

impl ConsumerRuntime for ForeignRuntime {
    fn supports_foreign_threads(&self) -> bool {
        self.hooks.supports_foreign_threads != 0
    }

    fn enter(&self) {
        if let Some(enter) = self.hooks.enter {
            enter(self.hooks.user_data);
        }
    }

    fn leave(&self) {
        if let Some(leave) = self.hooks.leave {
            leave(self.hooks.user_data);
        }
    }

    fn clear_pending_error(&self) {
        if let Some(clear_error) = self.hooks.clear_error {
            clear_error(self.hooks.user_data);
        }
    }

    fn take_pending_error(&self) -> Option<ConsumerFault> {
        let take_error = self.hooks.take_error?;
        match take_error(self.hooks.user_data) {
            0 => None,
            status => Some(ConsumerFault::Status(status)),
        }
    }
}
