//! ### English
//! Frame values that cross from the producer pipeline to the consumer runtime:
//! metadata, the borrowed byte view, and the tear-free metadata cell.
//!
//! ### 中文
//! 从生产者管线跨越到消费者运行时的帧数据：元数据、借用式字节视图，以及无撕裂的元数据单元。
mod cell;
mod metadata;
mod view;

pub(crate) use cell::MetadataCell;
pub use metadata::{FlipMode, FrameMetadata, Rotation};
pub use view::FrameBufferView;
