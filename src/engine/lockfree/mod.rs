//! ### English
//! Lock-free hand-off primitives used on the delivery hot path.
//!
//! ### 中文
//! 投递热路径上使用的无锁交接原语。
mod mailbox;

pub(crate) use mailbox::FrameMailbox;
