/// ### English
/// Relay internals (renderer registry, dispatch, consumer bindings, and frame metadata).
///
/// ### 中文
/// 中继内部模块（渲染器注册表、分发、消费者绑定、帧元数据等）。
pub mod binding;
pub mod config;
pub mod consumer;
pub mod error;
pub mod flags;
pub mod frame;
pub(crate) mod lockfree;
pub mod logging;
pub(crate) mod pending;
pub mod relay;
pub mod renderer;
pub mod sequence;
pub mod stats;
