//! ### English
//! C ABI bindings for renderer lifecycle, consumer binding, and metadata queries.
//!
//! ### 中文
//! 渲染器生命周期、消费者绑定与元数据查询的 C ABI 绑定。

use std::ffi::c_void;
use std::sync::Arc;

use crate::engine::binding::ConsumerBinding;
use crate::engine::stats::StatsSnapshot;

use super::binding::ForeignCallable;
use super::status::{self, AbiError};
use super::{
    XianFrameRelay, XianFrameRelayFrameCallback, XianFrameRelayMetadata, XianFrameRenderer,
};

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
/// ### English
/// Per-renderer delivery counters as seen by C.
///
/// ### 中文
/// C 侧看到的单个渲染器投递计数。
pub struct XianFrameRelayStats {
    pub delivered: u64,
    pub queued: u64,
    pub superseded: u64,
    pub no_consumer: u64,
    pub invalid_binding: u64,
    pub consumer_error: u64,
}

impl From<StatsSnapshot> for XianFrameRelayStats {
    fn from(snapshot: StatsSnapshot) -> Self {
        Self {
            delivered: snapshot.delivered,
            queued: snapshot.queued,
            superseded: snapshot.superseded,
            no_consumer: snapshot.no_consumer,
            invalid_binding: snapshot.invalid_binding,
            consumer_error: snapshot.consumer_error,
        }
    }
}

#[unsafe(no_mangle)]
/// ### English
/// Creates a renderer registered with `relay`. Returns NULL if `relay` is NULL.
///
/// The renderer starts unbound with 0x0 metadata; its identity is never 0.
///
/// ### 中文
/// 创建一个注册到 `relay` 的渲染器。`relay` 为 NULL 时返回 NULL。
///
/// 渲染器初始未绑定，元数据为 0x0；其标识永远不为 0。
pub unsafe extern "C" fn xian_frame_relay_renderer_create(
    relay: *mut XianFrameRelay,
) -> *mut XianFrameRenderer {
    let Some(relay) = (unsafe { relay.as_ref() }) else {
        return std::ptr::null_mut();
    };
    status::catch_or(std::ptr::null_mut(), || {
        let relay = relay.relay.clone();
        let renderer = relay.create_renderer();
        Box::into_raw(Box::new(XianFrameRenderer { relay, renderer }))
    })
}

#[unsafe(no_mangle)]
/// ### English
/// Destroys a renderer and unregisters it from its relay.
///
/// The producer must have stopped calling `xian_frame_relay_renderer_deliver` on it.
///
/// ### 中文
/// 销毁渲染器并将其从所属中继注销。
///
/// 调用前生产者必须已停止对其调用 `xian_frame_relay_renderer_deliver`。
pub unsafe extern "C" fn xian_frame_relay_renderer_destroy(renderer: *mut XianFrameRenderer) {
    if renderer.is_null() {
        return;
    }
    unsafe {
        drop(Box::from_raw(renderer));
    }
}

#[unsafe(no_mangle)]
/// ### English
/// Returns the renderer identity passed to callbacks, or `0` for NULL.
///
/// ### 中文
/// 返回传给回调的渲染器标识；NULL 时返回 `0`。
pub unsafe extern "C" fn xian_frame_relay_renderer_id(renderer: *const XianFrameRenderer) -> u64 {
    unsafe { renderer.as_ref() }
        .map(|handle| handle.renderer.identity().get())
        .unwrap_or(0)
}

#[unsafe(no_mangle)]
/// ### English
/// Binds (or rebinds) the consumer callback. A NULL `callback` unbinds.
///
/// `user_data` is passed back verbatim and must stay valid until the renderer is rebound,
/// unbound, or destroyed.
///
/// ### 中文
/// 绑定（或重新绑定）消费者回调。`callback` 为 NULL 表示解绑。
///
/// `user_data` 会原样回传，在渲染器重新绑定、解绑或销毁之前必须保持有效。
pub unsafe extern "C" fn xian_frame_relay_renderer_bind(
    renderer: *mut XianFrameRenderer,
    callback: Option<XianFrameRelayFrameCallback>,
    user_data: *mut c_void,
) -> i32 {
    status::return_code(|| {
        let handle = unsafe { renderer.as_ref() }.ok_or(AbiError::NullHandle)?;
        let binding = callback.map(|callback| {
            ConsumerBinding::callable(Arc::new(ForeignCallable::new(callback, user_data)))
        });
        handle.renderer.bind(binding);
        Ok(())
    })
}

#[unsafe(no_mangle)]
/// ### English
/// Writes the most recently recorded metadata into `out_metadata`.
///
/// Returns `false` if either pointer is NULL.
///
/// ### 中文
/// 把最近记录的元数据写入 `out_metadata`。
///
/// 任一指针为 NULL 时返回 `false`。
pub unsafe extern "C" fn xian_frame_relay_renderer_metadata(
    renderer: *const XianFrameRenderer,
    out_metadata: *mut XianFrameRelayMetadata,
) -> bool {
    let (Some(handle), Some(out)) = (unsafe { renderer.as_ref() }, unsafe {
        out_metadata.as_mut()
    }) else {
        return false;
    };
    *out = handle.renderer.metadata().into();
    true
}

#[unsafe(no_mangle)]
/// ### English
/// Writes the renderer's delivery counters into `out_stats`.
///
/// Returns `false` if either pointer is NULL.
///
/// ### 中文
/// 把渲染器的投递计数写入 `out_stats`。
///
/// 任一指针为 NULL 时返回 `false`。
pub unsafe extern "C" fn xian_frame_relay_renderer_stats(
    renderer: *const XianFrameRenderer,
    out_stats: *mut XianFrameRelayStats,
) -> bool {
    let (Some(handle), Some(out)) = (unsafe { renderer.as_ref() }, unsafe { out_stats.as_mut() })
    else {
        return false;
    };
    *out = handle.renderer.stats().into();
    true
}
