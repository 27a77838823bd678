//! ### English
//! Frame geometry and orientation.
//!
//! ### 中文
//! 帧的几何尺寸与方向信息。

use dpi::PhysicalSize;

use crate::engine::error::FrameError;

/// ### English
/// Clockwise rotation the consumer must apply when presenting a frame.
///
/// ### 中文
/// 消费者显示帧时需要应用的顺时针旋转角度。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Rotation {
    #[default]
    Deg0 = 0,
    Deg90 = 1,
    Deg180 = 2,
    Deg270 = 3,
}

impl Rotation {
    #[inline]
    pub fn degrees(self) -> u32 {
        match self {
            Self::Deg0 => 0,
            Self::Deg90 => 90,
            Self::Deg180 => 180,
            Self::Deg270 => 270,
        }
    }

    /// ### English
    /// Returns `true` for quarter turns (90/270), which swap width and height on screen.
    ///
    /// ### 中文
    /// 对 90/270 度返回 `true`（显示时宽高互换）。
    #[inline]
    pub fn swaps_axes(self) -> bool {
        matches!(self, Self::Deg90 | Self::Deg270)
    }

    #[inline]
    pub(crate) fn code(self) -> u8 {
        self as u8
    }

    #[inline]
    pub(crate) fn from_code(code: u8) -> Self {
        match code & 0b11 {
            0 => Self::Deg0,
            1 => Self::Deg90,
            2 => Self::Deg180,
            _ => Self::Deg270,
        }
    }
}

impl TryFrom<u32> for Rotation {
    type Error = FrameError;

    fn try_from(degrees: u32) -> Result<Self, Self::Error> {
        match degrees {
            0 => Ok(Self::Deg0),
            90 => Ok(Self::Deg90),
            180 => Ok(Self::Deg180),
            270 => Ok(Self::Deg270),
            other => Err(FrameError::InvalidRotation(other)),
        }
    }
}

/// ### English
/// Mirroring applied to a frame.
///
/// Raw values match the pipeline's encoding: `0 = None`, `1 = Horizontal`, `2 = Vertical`,
/// `3 = Both`.
///
/// ### 中文
/// 帧的镜像方式。
///
/// 原始数值与管线编码一致：`0 = None`，`1 = Horizontal`，`2 = Vertical`，`3 = Both`。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FlipMode {
    #[default]
    None = 0,
    Horizontal = 1,
    Vertical = 2,
    Both = 3,
}

impl FlipMode {
    #[inline]
    pub fn raw(self) -> u32 {
        self as u32
    }

    #[inline]
    pub(crate) fn from_code(code: u8) -> Self {
        match code & 0b11 {
            0 => Self::None,
            1 => Self::Horizontal,
            2 => Self::Vertical,
            _ => Self::Both,
        }
    }
}

impl TryFrom<u32> for FlipMode {
    type Error = FrameError;

    fn try_from(raw: u32) -> Result<Self, Self::Error> {
        match raw {
            0 => Ok(Self::None),
            1 => Ok(Self::Horizontal),
            2 => Ok(Self::Vertical),
            3 => Ok(Self::Both),
            other => Err(FrameError::InvalidFlipMode(other)),
        }
    }
}

/// ### English
/// Immutable description of one delivered frame.
///
/// ### 中文
/// 单个已投递帧的不可变描述。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameMetadata {
    /// ### English
    /// Pixel layout size of the frame bytes (before rotation).
    ///
    /// ### 中文
    /// 帧字节的像素布局尺寸（旋转前）。
    pub size: PhysicalSize<u32>,
    pub rotation: Rotation,
    pub flip: FlipMode,
}

impl Default for FrameMetadata {
    /// ### English
    /// Unset metadata: `0x0`, no rotation, no flip.
    ///
    /// ### 中文
    /// 未设置的元数据：`0x0`，无旋转，无镜像。
    fn default() -> Self {
        Self {
            size: PhysicalSize::new(0, 0),
            rotation: Rotation::Deg0,
            flip: FlipMode::None,
        }
    }
}

impl FrameMetadata {
    pub fn new(width: u32, height: u32, rotation: Rotation, flip: FlipMode) -> Self {
        Self {
            size: PhysicalSize::new(width, height),
            rotation,
            flip,
        }
    }

    /// ### English
    /// Builds metadata from raw pipeline values, validating rotation and flip mode.
    ///
    /// #### Parameters
    /// - `rotation_degrees`: One of `0/90/180/270`.
    /// - `flip_mode`: Raw flip mode (`0..=3`).
    ///
    /// ### 中文
    /// 从管线的原始数值构建元数据，并校验旋转角度与镜像方式。
    ///
    /// #### 参数
    /// - `rotation_degrees`：`0/90/180/270` 之一。
    /// - `flip_mode`：原始镜像方式（`0..=3`）。
    pub fn from_raw(
        width: u32,
        height: u32,
        rotation_degrees: u32,
        flip_mode: u32,
    ) -> Result<Self, FrameError> {
        Ok(Self::new(
            width,
            height,
            Rotation::try_from(rotation_degrees)?,
            FlipMode::try_from(flip_mode)?,
        ))
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.size.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.size.height
    }

    /// ### English
    /// On-screen size after applying rotation (axes swapped for quarter turns).
    ///
    /// ### 中文
    /// 应用旋转后的显示尺寸（90/270 度时宽高互换）。
    pub fn display_size(&self) -> PhysicalSize<u32> {
        if self.rotation.swaps_axes() {
            PhysicalSize::new(self.size.height, self.size.width)
        } else {
            self.size
        }
    }
}
