//! ### English
//! Opt-in stderr logging for embedders that have no `tracing` subscriber of their own.
//!
//! ### 中文
//! 为自身没有 `tracing` subscriber 的宿主提供的可选 stderr 日志输出。

use tracing_subscriber::EnvFilter;

use crate::engine::error::RelayError;

/// ### English
/// Filter used when neither an explicit filter nor `RUST_LOG` is given.
///
/// ### 中文
/// 未提供显式过滤器且没有 `RUST_LOG` 时使用的过滤器。
pub const DEFAULT_LOG_FILTER: &str = "info";

/// ### English
/// Installs a global fmt subscriber writing to stderr.
///
/// #### Parameters
/// - `filter`: `EnvFilter` directives (e.g. `"xian_frame_relay=debug"`). Empty means `RUST_LOG`,
///   falling back to [`DEFAULT_LOG_FILTER`].
///
/// Fails if the filter does not parse or a global subscriber is already installed.
///
/// ### 中文
/// 安装一个写入 stderr 的全局 fmt subscriber。
///
/// #### 参数
/// - `filter`：`EnvFilter` 指令（例如 `"xian_frame_relay=debug"`）。为空时使用 `RUST_LOG`，
///   否则回退为 [`DEFAULT_LOG_FILTER`]。
///
/// 过滤器解析失败或已安装全局 subscriber 时返回错误。
pub fn init_logging(filter: &str) -> Result<(), RelayError> {
    let filter = if filter.trim().is_empty() {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
    } else {
        EnvFilter::try_new(filter)?
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| RelayError::LogInit(err.to_string()))
}
