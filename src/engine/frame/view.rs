//! ### English
//! Borrowed, bounds-checked view over one frame's pixel bytes.
//!
//! ### 中文
//! 针对单帧像素字节的借用式、带边界检查的视图。

use std::ops::Range;

use crate::engine::error::FrameError;

use super::FrameMetadata;

/// ### English
/// Non-owning view handed to the consumer for the synchronous extent of one delivery.
///
/// The lifetime ties the view to the hand-off call: the producer may reuse or free the
/// underlying storage as soon as the call returns, so consumers must copy what they keep
/// (see [`Self::copy_to`] / [`Self::to_vec`]).
///
/// ### 中文
/// 在单次投递的同步期间交给消费者的非持有视图。
///
/// 生命周期把视图绑定在本次调用上：调用返回后生产者即可复用或释放底层存储，
/// 因此消费者必须拷贝需要保留的数据（见 [`Self::copy_to`] / [`Self::to_vec`]）。
#[derive(Clone, Copy, Debug)]
pub struct FrameBufferView<'a> {
    bytes: &'a [u8],
    metadata: FrameMetadata,
}

impl<'a> FrameBufferView<'a> {
    pub fn new(bytes: &'a [u8], metadata: FrameMetadata) -> Self {
        Self { bytes, metadata }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// ### English
    /// Metadata of the frame these bytes belong to.
    ///
    /// ### 中文
    /// 这些字节所属帧的元数据。
    #[inline]
    pub fn metadata(&self) -> FrameMetadata {
        self.metadata
    }

    #[inline]
    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// ### English
    /// Returns the bytes in `range`, or `None` if the range is out of bounds.
    ///
    /// ### 中文
    /// 返回 `range` 范围内的字节；越界时返回 `None`。
    #[inline]
    pub fn get(&self, range: Range<usize>) -> Option<&'a [u8]> {
        self.bytes.get(range)
    }

    /// ### English
    /// Copies the whole frame into the front of `dst` (e.g. a texture upload buffer).
    ///
    /// Returns the number of bytes written.
    ///
    /// ### 中文
    /// 把整帧拷贝到 `dst` 的开头（例如纹理上传缓冲区）。
    ///
    /// 返回写入的字节数。
    pub fn copy_to(&self, dst: &mut [u8]) -> Result<usize, FrameError> {
        let needed = self.bytes.len();
        let Some(head) = dst.get_mut(..needed) else {
            return Err(FrameError::DestinationTooSmall {
                needed,
                available: dst.len(),
            });
        };
        head.copy_from_slice(self.bytes);
        Ok(needed)
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.bytes.to_vec()
    }
}
