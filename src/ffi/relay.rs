//! ### English
//! C ABI bindings for relay lifecycle, logging, and the consumer turn.
//!
//! ### 中文
//! 中继生命周期、日志与消费者调度轮次的 C ABI 绑定。

use std::ffi::c_char;
use std::sync::Arc;

use crate::engine::config::RelayConfig;
use crate::engine::consumer::{ConsumerRuntime, ReentrantRuntime};
use crate::engine::logging;
use crate::engine::relay::FrameRelay;

use super::binding::ForeignRuntime;
use super::status::{self, AbiError};
use super::{XianFrameRelay, XianFrameRelayRuntimeHooks};

#[unsafe(no_mangle)]
/// ### English
/// Installs a stderr logger with the given `EnvFilter` directives (NULL/empty: `RUST_LOG` or
/// `info`).
///
/// Returns `0`, `XIAN_FRAME_RELAY_ERROR_INVALID_ARGUMENT` for a malformed filter, or
/// `XIAN_FRAME_RELAY_ERROR_LOGGING_ACTIVE` if a global logger is already installed.
///
/// ### 中文
/// 使用给定的 `EnvFilter` 指令安装 stderr 日志（NULL/空字符串：使用 `RUST_LOG` 或 `info`）。
///
/// 成功返回 `0`；过滤器格式错误返回 `XIAN_FRAME_RELAY_ERROR_INVALID_ARGUMENT`；
/// 已安装全局日志时返回 `XIAN_FRAME_RELAY_ERROR_LOGGING_ACTIVE`。
pub unsafe extern "C" fn xian_frame_relay_set_log_filter(filter: *const c_char) -> i32 {
    status::return_code(|| {
        let filter = unsafe { status::parse_str(filter) }?;
        logging::init_logging(filter).map_err(AbiError::from)
    })
}

#[unsafe(no_mangle)]
/// ### English
/// Creates a relay.
///
/// - `flags`: `XIAN_FRAME_RELAY_FLAG_*` bitmask.
/// - `hooks`: consumer runtime hooks, copied; NULL means a runtime that accepts calls from any
///   thread and needs no scope.
///
/// Returns NULL only if creation panicked.
///
/// ### 中文
/// 创建一个中继。
///
/// - `flags`：`XIAN_FRAME_RELAY_FLAG_*` 位掩码。
/// - `hooks`：消费者运行时钩子（会被复制）；NULL 表示可接受任意线程调用且无需作用域的运行时。
///
/// 仅在创建过程 panic 时返回 NULL。
pub unsafe extern "C" fn xian_frame_relay_create(
    flags: u32,
    hooks: *const XianFrameRelayRuntimeHooks,
) -> *mut XianFrameRelay {
    status::catch_or(std::ptr::null_mut(), || {
        let runtime: Arc<dyn ConsumerRuntime> = match unsafe { hooks.as_ref() } {
            Some(hooks) => Arc::new(ForeignRuntime::new(*hooks)),
            None => Arc::new(ReentrantRuntime),
        };
        let relay = FrameRelay::new(runtime, RelayConfig::from_flags(flags));
        Box::into_raw(Box::new(XianFrameRelay { relay }))
    })
}

#[unsafe(no_mangle)]
/// ### English
/// Destroys a relay created by `xian_frame_relay_create`.
///
/// Renderer handles created from it stay valid until they are destroyed themselves.
///
/// ### 中文
/// 销毁由 `xian_frame_relay_create` 创建的中继。
///
/// 由其创建的渲染器句柄在各自被销毁前依然有效。
pub unsafe extern "C" fn xian_frame_relay_destroy(relay: *mut XianFrameRelay) {
    if relay.is_null() {
        return;
    }
    unsafe {
        drop(Box::from_raw(relay));
    }
}

#[unsafe(no_mangle)]
/// ### English
/// Consumer turn: delivers every parked frame (queued dispatch). Must be called on the consumer
/// runtime's own thread. Returns the number of frames handed to callbacks or dropped.
///
/// ### 中文
/// 消费者调度轮次：投递所有暂存帧（排队分发）。必须在消费者运行时自己的线程调用。
/// 返回交给回调或被丢弃的帧数量。
pub unsafe extern "C" fn xian_frame_relay_pump(relay: *mut XianFrameRelay) -> i32 {
    status::return_code(|| {
        let relay = unsafe { relay.as_ref() }.ok_or(AbiError::NullHandle)?;
        Ok(relay.relay.pump().total())
    })
}
