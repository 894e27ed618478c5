//! Picture buffers for raw YUV frames in CPU memory.
//!
//! A picture owns three planes, each surrounded by a border of replicated
//! edge samples so that filters can read past the visible edges. Storage is
//! sized for the geometry the buffer was allocated with (its capacity) and
//! may describe any smaller geometry in place.

use crate::error::{LookaheadError, Result};
use crate::geometry::{FrameGeometry, PictureLayout, PlaneKind, PlaneLayout, SampleDepth};

/// Sample storage for one plane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Samples {
    Eight(Vec<u8>),
    High(Vec<u16>),
}

impl Samples {
    /// Allocate `len` zeroed samples, reporting allocator refusal as an error
    /// instead of aborting.
    fn try_zeroed(depth: SampleDepth, len: usize) -> Result<Self> {
        let bytes = len.saturating_mul(depth.bytes_per_sample());
        match depth {
            SampleDepth::Eight => try_zeroed_vec(len)
                .map(Self::Eight)
                .ok_or(LookaheadError::AllocationFailure { bytes }),
            SampleDepth::High => try_zeroed_vec(len)
                .map(Self::High)
                .ok_or(LookaheadError::AllocationFailure { bytes }),
        }
    }

    /// Number of samples allocated.
    pub fn len(&self) -> usize {
        match self {
            Self::Eight(v) => v.len(),
            Self::High(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn depth(&self) -> SampleDepth {
        match self {
            Self::Eight(_) => SampleDepth::Eight,
            Self::High(_) => SampleDepth::High,
        }
    }

    /// Raw storage as bytes. High bit depth samples are native-endian.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Eight(v) => v,
            Self::High(v) => bytemuck::cast_slice(v),
        }
    }
}

fn try_zeroed_vec<T: Copy + Default>(len: usize) -> Option<Vec<T>> {
    let mut v = Vec::new();
    v.try_reserve_exact(len).ok()?;
    v.resize(len, T::default());
    Some(v)
}

/// One plane of samples plus the layout describing where the picture lives
/// inside it.
#[derive(Debug, Clone)]
pub struct Plane {
    samples: Samples,
    layout: PlaneLayout,
}

impl Plane {
    fn try_new(layout: PlaneLayout, depth: SampleDepth) -> Result<Self> {
        let len = layout
            .sample_count()
            .ok_or(LookaheadError::AllocationFailure { bytes: usize::MAX })?;
        Ok(Self {
            samples: Samples::try_zeroed(depth, len)?,
            layout,
        })
    }

    #[inline]
    pub fn layout(&self) -> &PlaneLayout {
        &self.layout
    }

    /// Row pitch in samples.
    #[inline]
    pub fn stride(&self) -> usize {
        self.layout.stride
    }

    #[inline]
    pub fn crop_width(&self) -> usize {
        self.layout.crop_width
    }

    #[inline]
    pub fn crop_height(&self) -> usize {
        self.layout.crop_height
    }

    /// Samples allocated, independent of the current layout.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.samples.len()
    }

    #[inline]
    pub fn samples(&self) -> &Samples {
        &self.samples
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.samples.as_bytes()
    }

    /// Storage index of `(x, y)` relative to the top-left visible sample.
    /// Negative coordinates and coordinates past the aligned size address the
    /// border.
    fn index(&self, x: isize, y: isize) -> Option<usize> {
        let l = &self.layout;
        let col = x.checked_add(l.border_x as isize)?;
        let row = y.checked_add(l.border_y as isize)?;
        if col < 0 || row < 0 {
            return None;
        }
        let (col, row) = (col as usize, row as usize);
        if col >= l.width + 2 * l.border_x || row >= l.total_rows() {
            return None;
        }
        Some(row * l.stride + col)
    }

    /// Read a sample, including border samples.
    pub fn sample(&self, x: isize, y: isize) -> Option<u16> {
        let i = self.index(x, y)?;
        match &self.samples {
            Samples::Eight(v) => v.get(i).map(|&s| s as u16),
            Samples::High(v) => v.get(i).copied(),
        }
    }

    /// Write a sample inside the crop area. Values are saturated for 8-bit
    /// planes. Returns false when the coordinate is outside the crop area.
    pub fn set_sample(&mut self, x: usize, y: usize, value: u16) -> bool {
        if x >= self.layout.crop_width || y >= self.layout.crop_height {
            return false;
        }
        let i = self.layout.origin() + y * self.layout.stride + x;
        match &mut self.samples {
            Samples::Eight(v) => v[i] = u8::try_from(value).unwrap_or(u8::MAX),
            Samples::High(v) => v[i] = value,
        }
        true
    }

    /// Visible part of an 8-bit row.
    pub fn row_u8(&self, y: usize) -> Option<&[u8]> {
        let start = self.row_start(y)?;
        match &self.samples {
            Samples::Eight(v) => Some(&v[start..start + self.layout.crop_width]),
            Samples::High(_) => None,
        }
    }

    /// Visible part of a high bit depth row.
    pub fn row_u16(&self, y: usize) -> Option<&[u16]> {
        let start = self.row_start(y)?;
        match &self.samples {
            Samples::High(v) => Some(&v[start..start + self.layout.crop_width]),
            Samples::Eight(_) => None,
        }
    }

    fn row_start(&self, y: usize) -> Option<usize> {
        (y < self.layout.crop_height).then(|| self.layout.origin() + y * self.layout.stride)
    }

    /// Fill the crop area from `f(x, y)`.
    pub fn fill(&mut self, mut f: impl FnMut(usize, usize) -> u16) {
        for y in 0..self.layout.crop_height {
            for x in 0..self.layout.crop_width {
                self.set_sample(x, y, f(x, y));
            }
        }
    }

    /// Mean of the visible samples.
    pub fn mean(&self) -> f64 {
        let count = self.layout.crop_width * self.layout.crop_height;
        if count == 0 {
            return 0.0;
        }
        let mut sum = 0u64;
        for y in 0..self.layout.crop_height {
            if let Some(row) = self.row_u8(y) {
                sum += row.iter().map(|&s| s as u64).sum::<u64>();
            } else if let Some(row) = self.row_u16(y) {
                sum += row.iter().map(|&s| s as u64).sum::<u64>();
            }
        }
        sum as f64 / count as f64
    }

    fn copy_from(&mut self, src: &Plane) -> Result<()> {
        let layout = self.layout;
        if layout.crop_width != src.layout.crop_width || layout.crop_height != src.layout.crop_height {
            return Err(LookaheadError::InvalidGeometry(format!(
                "plane size mismatch: {}x{} into {}x{}",
                src.layout.crop_width, src.layout.crop_height, layout.crop_width, layout.crop_height
            )));
        }
        match (&mut self.samples, &src.samples) {
            (Samples::Eight(dst), Samples::Eight(s)) => copy_rows(dst, &layout, s, &src.layout),
            (Samples::High(dst), Samples::High(s)) => copy_rows(dst, &layout, s, &src.layout),
            _ => {
                return Err(LookaheadError::InvalidGeometry(
                    "sample depth mismatch".to_string(),
                ))
            }
        }
        Ok(())
    }

    fn extend_border(&mut self) {
        let layout = self.layout;
        match &mut self.samples {
            Samples::Eight(v) => extend_plane(v, &layout),
            Samples::High(v) => extend_plane(v, &layout),
        }
    }
}

fn copy_rows<T: Copy>(dst: &mut [T], dst_layout: &PlaneLayout, src: &[T], src_layout: &PlaneLayout) {
    let width = dst_layout.crop_width;
    for row in 0..dst_layout.crop_height {
        let d = dst_layout.origin() + row * dst_layout.stride;
        let s = src_layout.origin() + row * src_layout.stride;
        dst[d..d + width].copy_from_slice(&src[s..s + width]);
    }
}

/// Replicate the crop area's edge samples outward until the whole bordered
/// area is covered, including the alignment padding right of and below the
/// crop area.
fn extend_plane<T: Copy>(buf: &mut [T], layout: &PlaneLayout) {
    let PlaneLayout {
        width,
        height,
        crop_width,
        crop_height,
        border_x,
        border_y,
        stride,
    } = *layout;
    if crop_width == 0 || crop_height == 0 {
        return;
    }
    let ext_right = border_x + width - crop_width;
    let ext_bottom = border_y + height - crop_height;
    let full_width = width + 2 * border_x;

    for row in 0..crop_height {
        let start = (border_y + row) * stride;
        let first = start + border_x;
        let last = first + crop_width - 1;
        let (left, right) = (buf[first], buf[last]);
        buf[start..first].fill(left);
        buf[last + 1..last + 1 + ext_right].fill(right);
    }

    let top = border_y * stride;
    for row in 0..border_y {
        buf.copy_within(top..top + full_width, row * stride);
    }

    let bottom = (border_y + crop_height - 1) * stride;
    for row in 0..ext_bottom {
        let dst = (border_y + crop_height + row) * stride;
        buf.copy_within(bottom..bottom + full_width, dst);
    }
}

/// A raw YUV picture with bordered planes.
///
/// `geometry` is what the planes currently describe; `capacity` is the
/// geometry the storage was allocated for. The two differ after an in-place
/// [`reshape`](Self::reshape) to a smaller size.
#[derive(Debug, Clone)]
pub struct PictureBuffer {
    planes: [Plane; 3],
    geometry: FrameGeometry,
    capacity: FrameGeometry,
    border: usize,
}

impl PictureBuffer {
    /// Allocate a zeroed picture for `geometry` with `border` luma pixels of
    /// padding on every side.
    pub fn new(geometry: FrameGeometry, border: usize) -> Result<Self> {
        geometry.validate()?;
        let layout = PictureLayout::for_geometry(&geometry, border);
        let planes = [
            Plane::try_new(layout.luma, geometry.depth)?,
            Plane::try_new(layout.chroma, geometry.depth)?,
            Plane::try_new(layout.chroma, geometry.depth)?,
        ];
        Ok(Self {
            planes,
            geometry,
            capacity: geometry,
            border,
        })
    }

    /// Bytes a fresh allocation of `geometry` would take.
    pub fn required_bytes(geometry: &FrameGeometry, border: usize) -> Result<usize> {
        PictureLayout::for_geometry(geometry, border)
            .byte_size(geometry.depth)
            .ok_or(LookaheadError::AllocationFailure { bytes: usize::MAX })
    }

    #[inline]
    pub fn geometry(&self) -> &FrameGeometry {
        &self.geometry
    }

    #[inline]
    pub fn capacity(&self) -> &FrameGeometry {
        &self.capacity
    }

    #[inline]
    pub fn border(&self) -> usize {
        self.border
    }

    #[inline]
    pub fn depth(&self) -> SampleDepth {
        self.geometry.depth
    }

    /// Current plane layouts.
    pub fn layout(&self) -> PictureLayout {
        PictureLayout {
            luma: self.planes[0].layout,
            chroma: self.planes[1].layout,
        }
    }

    #[inline]
    pub fn plane(&self, kind: PlaneKind) -> &Plane {
        &self.planes[kind.index()]
    }

    #[inline]
    pub fn plane_mut(&mut self, kind: PlaneKind) -> &mut Plane {
        &mut self.planes[kind.index()]
    }

    /// Total bytes allocated for sample storage.
    pub fn memory_size(&self) -> usize {
        self.planes.iter().map(|p| p.as_bytes().len()).sum()
    }

    /// Whether the existing storage can describe `geometry` without
    /// reallocating.
    pub fn can_reshape_to(&self, geometry: &FrameGeometry) -> bool {
        if geometry.validate().is_err() || !geometry.fits_within(&self.capacity) {
            return false;
        }
        let layout = PictureLayout::for_geometry(geometry, self.border);
        PlaneKind::ALL.iter().all(|&kind| {
            layout
                .plane(kind)
                .sample_count()
                .is_some_and(|n| n <= self.plane(kind).capacity())
        })
    }

    /// Describe `geometry` with the existing storage. Crop sizes, subsampling
    /// and strides are updated; samples are left as they are.
    pub fn reshape(&mut self, geometry: FrameGeometry) -> Result<()> {
        if !self.can_reshape_to(&geometry) {
            return Err(LookaheadError::InvalidGeometry(format!(
                "{}x{} does not fit a buffer allocated for {}x{}",
                geometry.width, geometry.height, self.capacity.width, self.capacity.height
            )));
        }
        let layout = PictureLayout::for_geometry(&geometry, self.border);
        for kind in PlaneKind::ALL {
            self.planes[kind.index()].layout = *layout.plane(kind);
        }
        self.geometry = geometry;
        Ok(())
    }

    /// Copy the visible area of `source` and fill this picture's border by
    /// edge replication. Both pictures must have the same geometry; their
    /// borders and strides may differ.
    pub fn copy_and_extend_from(&mut self, source: &PictureBuffer) -> Result<()> {
        if source.geometry != self.geometry {
            return Err(LookaheadError::InvalidGeometry(format!(
                "cannot copy {:?} into {:?}",
                source.geometry, self.geometry
            )));
        }
        for (dst, src) in self.planes.iter_mut().zip(source.planes.iter()) {
            dst.copy_from(src)?;
            dst.extend_border();
        }
        Ok(())
    }

    /// Refill every border from the visible area.
    pub fn extend_borders(&mut self) {
        for plane in &mut self.planes {
            plane.extend_border();
        }
    }

    /// Create a deterministic gradient picture. `seed` shifts the pattern so
    /// consecutive frames differ.
    pub fn test_pattern(geometry: FrameGeometry, border: usize, seed: u32) -> Result<Self> {
        let mut picture = Self::new(geometry, border)?;
        let max = match geometry.depth {
            SampleDepth::Eight => 255usize,
            SampleDepth::High => 1023,
        };
        let seed = seed as usize;
        picture
            .plane_mut(PlaneKind::Y)
            .fill(|x, y| ((x + 2 * y + 7 * seed) % (max + 1)) as u16);
        picture
            .plane_mut(PlaneKind::U)
            .fill(|x, y| ((max / 2 + ((x ^ y) & 15) + seed) % (max + 1)) as u16);
        picture
            .plane_mut(PlaneKind::V)
            .fill(|x, y| ((max / 2 + ((x + y) & 15) + 3 * seed) % (max + 1)) as u16);
        picture.extend_borders();
        Ok(picture)
    }
}
