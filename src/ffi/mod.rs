//! ### English
//! C ABI surface for `xian_frame_relay`.
//! All exported symbols are `extern "C"` functions; structs are `#[repr(C)]`.
//!
//! The producer pipeline calls `xian_frame_relay_renderer_deliver` on its own thread; the consumer
//! runtime binds a frame callback and (for queued dispatch) calls `xian_frame_relay_pump` on its
//! own turn. Frame pointers handed to callbacks are only valid until the callback returns.
//!
//! ### 中文
//! `xian_frame_relay` 的 C ABI 接口层。
//! 所有导出符号均为 `extern "C"` 函数；结构体使用 `#[repr(C)]`。
//!
//! 生产者管线在自己的线程调用 `xian_frame_relay_renderer_deliver`；消费者运行时绑定帧回调，
//! 并（在排队分发时）在自己的调度轮次调用 `xian_frame_relay_pump`。传给回调的帧指针仅在回调返回前有效。

use std::sync::Arc;

use crate::engine::frame::FrameMetadata;
use crate::engine::relay::FrameRelay;
use crate::engine::renderer::TextureRenderer;

mod abi;
mod binding;
mod frame;
mod relay;
mod renderer;
mod status;

pub use binding::{XianFrameRelayFrameCallback, XianFrameRelayRuntimeHooks};
pub use renderer::XianFrameRelayStats;
pub use status::*;

/// ### English
/// C ABI version; bump on any breaking change to exported signatures or structs.
///
/// ### 中文
/// C ABI 版本号；导出签名或结构体发生不兼容变更时递增。
pub const XIAN_FRAME_RELAY_ABI_VERSION: u32 = 1;

#[repr(C)]
/// ### English
/// Opaque relay handle.
///
/// ### 中文
/// 不透明中继句柄。
pub struct XianFrameRelay {
    relay: FrameRelay,
}

#[repr(C)]
/// ### English
/// Opaque renderer handle (thread-safe for the producer and consumer to use via pointers).
///
/// ### 中文
/// 不透明渲染器句柄（生产者与消费者可通过指针线程安全地使用）。
pub struct XianFrameRenderer {
    /// ### English
    /// Relay the renderer is registered with (used to unregister on destroy).
    ///
    /// ### 中文
    /// 渲染器注册所在的中继（销毁时用于注销）。
    relay: FrameRelay,
    renderer: Arc<TextureRenderer>,
}

impl Drop for XianFrameRenderer {
    fn drop(&mut self) {
        self.relay.destroy_renderer(self.renderer.identity());
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
/// ### English
/// Frame metadata as seen by C.
///
/// ### 中文
/// C 侧看到的帧元数据。
pub struct XianFrameRelayMetadata {
    pub width: u32,
    pub height: u32,
    /// ### English
    /// Clockwise rotation in degrees (`0/90/180/270`).
    ///
    /// ### 中文
    /// 顺时针旋转角度（`0/90/180/270`）。
    pub rotation: u32,
    /// ### English
    /// `0 = None`, `1 = Horizontal`, `2 = Vertical`, `3 = Both`.
    ///
    /// ### 中文
    /// `0 = None`，`1 = Horizontal`，`2 = Vertical`，`3 = Both`。
    pub flip_mode: u32,
}

impl From<FrameMetadata> for XianFrameRelayMetadata {
    fn from(metadata: FrameMetadata) -> Self {
        Self {
            width: metadata.width(),
            height: metadata.height(),
            rotation: metadata.rotation.degrees(),
            flip_mode: metadata.flip.raw(),
        }
    }
}
