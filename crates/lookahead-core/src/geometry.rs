//! Frame geometry and plane layout.
//!
//! `PictureLayout::for_geometry` is the single place strides are derived.
//! Fresh allocations and in-place reshapes both go through it, so a slot that
//! shrinks and later returns to its original size ends up with exactly the
//! stride it was allocated with.

use crate::error::{LookaheadError, Result};
use serde::{Deserialize, Serialize};

/// Luma width and height are allocated in multiples of `1 << 3`.
pub const DIMENSION_ALIGN_LOG2: u32 = 3;

/// Row pitch is a multiple of `1 << 5` samples.
pub const STRIDE_ALIGN_LOG2: u32 = 5;

/// Round `value` up to a multiple of `1 << n`.
#[inline]
pub const fn align_power_of_two(value: usize, n: u32) -> usize {
    let mask = (1usize << n) - 1;
    (value + mask) & !mask
}

/// Storage width of a single sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SampleDepth {
    /// 8-bit samples stored as `u8`.
    #[default]
    Eight,
    /// 10/12-bit samples stored as `u16`.
    High,
}

impl SampleDepth {
    #[inline]
    pub fn from_high_bit_depth(high_bit_depth: bool) -> Self {
        if high_bit_depth {
            Self::High
        } else {
            Self::Eight
        }
    }

    #[inline]
    pub fn is_high(self) -> bool {
        matches!(self, Self::High)
    }

    /// Bytes used by one stored sample.
    #[inline]
    pub fn bytes_per_sample(self) -> usize {
        match self {
            Self::Eight => 1,
            Self::High => 2,
        }
    }
}

/// Which plane of a YUV picture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlaneKind {
    Y,
    U,
    V,
}

impl PlaneKind {
    pub const ALL: [PlaneKind; 3] = [PlaneKind::Y, PlaneKind::U, PlaneKind::V];

    #[inline]
    pub fn index(self) -> usize {
        match self {
            Self::Y => 0,
            Self::U => 1,
            Self::V => 2,
        }
    }

    #[inline]
    pub fn is_chroma(self) -> bool {
        !matches!(self, Self::Y)
    }
}

/// Logical shape of a picture: luma crop size, chroma subsampling and
/// sample depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameGeometry {
    /// Luma crop width in pixels
    pub width: u32,
    /// Luma crop height in pixels
    pub height: u32,
    /// Horizontal chroma subsampling shift (0 or 1)
    pub subsampling_x: u8,
    /// Vertical chroma subsampling shift (0 or 1)
    pub subsampling_y: u8,
    /// Sample storage depth
    #[serde(default)]
    pub depth: SampleDepth,
}

impl FrameGeometry {
    pub const fn new(
        width: u32,
        height: u32,
        subsampling_x: u8,
        subsampling_y: u8,
        depth: SampleDepth,
    ) -> Self {
        Self {
            width,
            height,
            subsampling_x,
            subsampling_y,
            depth,
        }
    }

    /// 8-bit 4:2:0.
    pub const fn yuv420(width: u32, height: u32) -> Self {
        Self::new(width, height, 1, 1, SampleDepth::Eight)
    }

    /// Same geometry with a different size.
    pub fn with_size(self, width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..self
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(LookaheadError::InvalidGeometry(format!(
                "zero-sized picture {}x{}",
                self.width, self.height
            )));
        }
        if self.subsampling_x > 1 || self.subsampling_y > 1 {
            return Err(LookaheadError::InvalidGeometry(format!(
                "unsupported subsampling ({}, {})",
                self.subsampling_x, self.subsampling_y
            )));
        }
        Ok(())
    }

    #[inline]
    pub fn aligned_width(&self) -> usize {
        align_power_of_two(self.width as usize, DIMENSION_ALIGN_LOG2)
    }

    #[inline]
    pub fn aligned_height(&self) -> usize {
        align_power_of_two(self.height as usize, DIMENSION_ALIGN_LOG2)
    }

    /// Chroma crop width, rounding odd luma widths up.
    #[inline]
    pub fn chroma_width(&self) -> usize {
        let ss = self.subsampling_x as usize;
        (self.width as usize + ss) >> ss
    }

    /// Chroma crop height, rounding odd luma heights up.
    #[inline]
    pub fn chroma_height(&self) -> usize {
        let ss = self.subsampling_y as usize;
        (self.height as usize + ss) >> ss
    }

    /// Crop size of the given plane.
    pub fn crop_size(&self, plane: PlaneKind) -> (usize, usize) {
        if plane.is_chroma() {
            (self.chroma_width(), self.chroma_height())
        } else {
            (self.width as usize, self.height as usize)
        }
    }

    /// True when no crop dimension of `self` exceeds the matching one of
    /// `capacity` and both use the same sample depth.
    pub fn fits_within(&self, capacity: &FrameGeometry) -> bool {
        self.depth == capacity.depth
            && self.width <= capacity.width
            && self.height <= capacity.height
            && self.chroma_width() <= capacity.chroma_width()
            && self.chroma_height() <= capacity.chroma_height()
    }
}

/// Position and pitch of one plane inside its sample storage.
///
/// All quantities are in samples, not bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaneLayout {
    /// Aligned width
    pub width: usize,
    /// Aligned height
    pub height: usize,
    pub crop_width: usize,
    pub crop_height: usize,
    pub border_x: usize,
    pub border_y: usize,
    pub stride: usize,
}

impl PlaneLayout {
    /// Offset of the top-left visible sample.
    #[inline]
    pub fn origin(&self) -> usize {
        self.border_y * self.stride + self.border_x
    }

    /// Rows including the top and bottom border.
    #[inline]
    pub fn total_rows(&self) -> usize {
        self.height + 2 * self.border_y
    }

    /// Samples needed to back this layout, or `None` on overflow.
    #[inline]
    pub fn sample_count(&self) -> Option<usize> {
        self.total_rows().checked_mul(self.stride)
    }
}

/// Luma and chroma layouts of a picture. U and V share one layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PictureLayout {
    pub luma: PlaneLayout,
    pub chroma: PlaneLayout,
}

impl PictureLayout {
    /// Derive plane layouts for `geometry` surrounded by `border` luma pixels.
    pub fn for_geometry(geometry: &FrameGeometry, border: usize) -> Self {
        let ss_x = geometry.subsampling_x as u32;
        let ss_y = geometry.subsampling_y as u32;
        let aligned_width = geometry.aligned_width();
        let aligned_height = geometry.aligned_height();

        let y_stride = align_power_of_two(aligned_width + 2 * border, STRIDE_ALIGN_LOG2);
        let luma = PlaneLayout {
            width: aligned_width,
            height: aligned_height,
            crop_width: geometry.width as usize,
            crop_height: geometry.height as usize,
            border_x: border,
            border_y: border,
            stride: y_stride,
        };
        let chroma = PlaneLayout {
            width: aligned_width >> ss_x,
            height: aligned_height >> ss_y,
            crop_width: geometry.chroma_width(),
            crop_height: geometry.chroma_height(),
            border_x: border >> ss_x,
            border_y: border >> ss_y,
            stride: y_stride >> ss_x,
        };
        Self { luma, chroma }
    }

    #[inline]
    pub fn plane(&self, kind: PlaneKind) -> &PlaneLayout {
        if kind.is_chroma() {
            &self.chroma
        } else {
            &self.luma
        }
    }

    /// Bytes needed for all three planes at `depth`, or `None` on overflow.
    pub fn byte_size(&self, depth: SampleDepth) -> Option<usize> {
        let luma = self.luma.sample_count()?;
        let chroma = self.chroma.sample_count()?.checked_mul(2)?;
        luma.checked_add(chroma)?.checked_mul(depth.bytes_per_sample())
    }
}
