//! ### English
//! Return codes and panic containment for the C ABI.
//!
//! Non-negative codes describe a delivery outcome (or a count); negative codes describe ABI misuse.
//!
//! ### 中文
//! C ABI 的返回码与 panic 隔离。
//!
//! 非负返回码表示投递结果（或计数）；负返回码表示 ABI 误用。

use std::ffi::{CStr, c_char};
use std::panic::{self, AssertUnwindSafe};

use thiserror::Error;

use crate::engine::error::{DropReason, FrameError, RelayError};
use crate::engine::renderer::Delivery;

pub const XIAN_FRAME_RELAY_DELIVERED: i32 = 0;
pub const XIAN_FRAME_RELAY_QUEUED: i32 = 1;
pub const XIAN_FRAME_RELAY_DROPPED_NO_CONSUMER: i32 = 2;
pub const XIAN_FRAME_RELAY_DROPPED_INVALID_BINDING: i32 = 3;
pub const XIAN_FRAME_RELAY_DROPPED_CONSUMER_ERROR: i32 = 4;

pub const XIAN_FRAME_RELAY_ERROR_NULL_HANDLE: i32 = -1;
pub const XIAN_FRAME_RELAY_ERROR_INVALID_ARGUMENT: i32 = -2;
pub const XIAN_FRAME_RELAY_ERROR_PANIC: i32 = -3;
pub const XIAN_FRAME_RELAY_ERROR_LOGGING_ACTIVE: i32 = -4;

#[derive(Error, Debug)]
pub(super) enum AbiError {
    #[error("null handle")]
    NullHandle,
    #[error(transparent)]
    Frame(#[from] FrameError),
    #[error("string is not valid UTF-8")]
    Utf8(#[from] std::str::Utf8Error),
    #[error(transparent)]
    Relay(#[from] RelayError),
}

impl AbiError {
    fn code(&self) -> i32 {
        match self {
            Self::NullHandle => XIAN_FRAME_RELAY_ERROR_NULL_HANDLE,
            Self::Frame(_) | Self::Utf8(_) | Self::Relay(RelayError::LogFilter(_)) => {
                XIAN_FRAME_RELAY_ERROR_INVALID_ARGUMENT
            }
            Self::Relay(RelayError::LogInit(_)) => XIAN_FRAME_RELAY_ERROR_LOGGING_ACTIVE,
        }
    }
}

pub(super) trait ReturnCode {
    fn code(&self) -> i32;
}

impl ReturnCode for () {
    fn code(&self) -> i32 {
        0
    }
}

impl ReturnCode for usize {
    fn code(&self) -> i32 {
        i32::try_from(*self).unwrap_or(i32::MAX)
    }
}

impl ReturnCode for Delivery {
    fn code(&self) -> i32 {
        match self {
            Delivery::Delivered => XIAN_FRAME_RELAY_DELIVERED,
            Delivery::Queued { .. } => XIAN_FRAME_RELAY_QUEUED,
            Delivery::Dropped(DropReason::NoConsumer) => XIAN_FRAME_RELAY_DROPPED_NO_CONSUMER,
            Delivery::Dropped(DropReason::InvalidBinding) => {
                XIAN_FRAME_RELAY_DROPPED_INVALID_BINDING
            }
            Delivery::Dropped(DropReason::ConsumerError) => {
                XIAN_FRAME_RELAY_DROPPED_CONSUMER_ERROR
            }
        }
    }
}

impl<T: ReturnCode> ReturnCode for Result<T, AbiError> {
    fn code(&self) -> i32 {
        match self {
            Ok(value) => value.code(),
            Err(err) => {
                tracing::debug!(%err, "C ABI call rejected");
                err.code()
            }
        }
    }
}

/// ### English
/// Runs `f`, mapping its result to a return code; a panic becomes
/// [`XIAN_FRAME_RELAY_ERROR_PANIC`] instead of unwinding into foreign frames.
///
/// ### 中文
/// 执行 `f` 并把结果映射为返回码；panic 会变为 [`XIAN_FRAME_RELAY_ERROR_PANIC`]，
/// 而不会展开进入外部栈帧。
pub(super) fn return_code<C: ReturnCode, F: FnOnce() -> C>(f: F) -> i32 {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(ret) => ret.code(),
        Err(_) => {
            tracing::error!("panic caught at the C ABI boundary");
            XIAN_FRAME_RELAY_ERROR_PANIC
        }
    }
}

/// ### English
/// Like [`return_code`] for entry points that return a value instead of a code.
///
/// ### 中文
/// 与 [`return_code`] 类似，用于返回值而非返回码的入口函数。
pub(super) fn catch_or<T, F: FnOnce() -> T>(fallback: T, f: F) -> T {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(value) => value,
        Err(_) => {
            tracing::error!("panic caught at the C ABI boundary");
            fallback
        }
    }
}

/// # Safety
///
/// If non-null, `data` must be valid for reads of `size` bytes for `'a`.
pub(super) unsafe fn parse_slice<'a>(data: *const u8, size: usize) -> Result<&'a [u8], AbiError> {
    if data.is_null() {
        if size == 0 {
            return Ok(&[]);
        }
        return Err(FrameError::NullBuffer(size).into());
    }

    Ok(unsafe { std::slice::from_raw_parts(data, size) })
}

/// # Safety
///
/// If non-null, `cstr` must point to a NUL-terminated string valid for `'a`.
pub(super) unsafe fn parse_str<'a>(cstr: *const c_char) -> Result<&'a str, AbiError> {
    if cstr.is_null() {
        return Ok("");
    }
    Ok(unsafe { CStr::from_ptr(cstr) }.to_str()?)
}
