/// ### English
/// `xian_frame_relay` cdylib crate root.
/// Exposes the C ABI via `ffi`; core implementation lives under `engine`.
///
/// ### 中文
/// `xian_frame_relay` 的 cdylib crate 根。
/// 通过 `ffi` 导出 C ABI；核心实现位于 `engine` 模块。
pub mod engine;
pub mod ffi;

pub use engine::binding::{
    BindingResolution, ConsumerBinding, ConsumerTarget, DEFAULT_FRAME_METHOD, FrameCallable,
};
pub use engine::config::{DispatchMode, RelayConfig};
pub use engine::consumer::{ConsumerRuntime, ReentrantRuntime};
pub use engine::error::{ConsumerFault, DropReason, FrameError, RelayError};
pub use engine::frame::{FlipMode, FrameBufferView, FrameMetadata, Rotation};
pub use engine::relay::{FrameRelay, PumpReport};
pub use engine::renderer::{Delivery, TextureRenderer};
pub use engine::sequence::{RendererId, SequenceAllocator};
pub use engine::stats::StatsSnapshot;
