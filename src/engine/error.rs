//! ### English
//! Error taxonomy for the frame relay.
//!
//! Drops are terminal for one delivery and never propagate into the producer pipeline;
//! the other error types describe misuse at the producer boundary or relay-level failures.
//!
//! ### 中文
//! 帧中继的错误分类。
//!
//! 丢帧只对单次投递生效，绝不会传播到生产者管线；其余错误类型描述生产者边界的误用或中继级失败。

use thiserror::Error;

/// ### English
/// Why a delivery completed without reaching a consumer.
///
/// ### 中文
/// 投递未到达消费者即结束的原因。
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DropReason {
    /// ### English
    /// No consumer is bound (expected before the consumer attaches).
    ///
    /// ### 中文
    /// 未绑定消费者（消费者接入前的正常状态）。
    #[error("no consumer is bound")]
    NoConsumer,
    /// ### English
    /// A binding exists but its target is no longer callable.
    ///
    /// ### 中文
    /// 存在绑定，但目标已不可调用。
    #[error("consumer binding is no longer callable")]
    InvalidBinding,
    /// ### English
    /// The consumer raised while handling the frame.
    ///
    /// ### 中文
    /// 消费者在处理该帧时抛出了错误。
    #[error("consumer raised while handling the frame")]
    ConsumerError,
}

/// ### English
/// What a consumer raised during one invocation.
///
/// ### 中文
/// 消费者在一次调用中抛出的错误。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConsumerFault {
    #[error("consumer raised: {0}")]
    Raised(String),
    #[error("consumer returned status {0}")]
    Status(i32),
    #[error("consumer panicked: {0}")]
    Panicked(String),
}

impl ConsumerFault {
    pub fn raised(msg: impl Into<String>) -> Self {
        Self::Raised(msg.into())
    }
}

/// ### English
/// Precondition violations at the producer boundary and on frame views.
///
/// ### 中文
/// 生产者边界与帧视图上的前置条件违例。
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    #[error("null frame buffer with length {0}")]
    NullBuffer(usize),
    #[error("invalid rotation: {0} degrees")]
    InvalidRotation(u32),
    #[error("invalid flip mode: {0}")]
    InvalidFlipMode(u32),
    #[error("destination holds {available} bytes, frame needs {needed}")]
    DestinationTooSmall { needed: usize, available: usize },
}

/// ### English
/// Relay-level failures (outside the per-frame hot path).
///
/// ### 中文
/// 中继级失败（不在逐帧热路径上）。
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("invalid log filter: {0}")]
    LogFilter(#[from] tracing_subscriber::filter::ParseError),
    #[error("logging already initialized: {0}")]
    LogInit(String),
}
