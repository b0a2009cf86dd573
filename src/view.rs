//! Borrowed views of pixel data.
//!
//! An [`ImageView`] borrows the storage of an [`Image`](crate::Image) (or any
//! external byte slice) and records where each plane starts and how far apart
//! its rows are. Regions are views too: they adjust the plane starts and keep
//! the parent's strides, so no pixel is copied until [`ImageView::to_image`]
//! or [`ImageView::crop`] asks for an owned copy.

use alloc::vec::Vec;
use core::fmt;

use imgref::ImgRef;
use rgb::alt::{BGR, BGRA};
use rgb::{Gray, Rgb, Rgba};

use crate::image::{Image, allocate};
use crate::{ImageError, MAX_PLANES, Orientation, PixelFormat, PlaneSpec};

/// Where a plane starts within the backing storage and its row pitch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct PlaneLayout {
    pub(crate) offset: usize,
    pub(crate) stride: usize,
}

/// Plane layouts for a tightly packed image: Y first, then U immediately
/// after, then V.
pub(crate) fn packed_planes(
    format: PixelFormat,
    width: u32,
    height: u32,
) -> [PlaneLayout; MAX_PLANES] {
    let mut planes = [PlaneLayout::default(); MAX_PLANES];
    let mut offset = 0;
    for (layout, spec) in planes.iter_mut().zip(format.planes()) {
        *layout = PlaneLayout {
            offset,
            stride: spec.stride(width),
        };
        offset += spec.size(width, height);
    }
    planes
}

/// Bytes from the first byte of a plane to the last byte of its last row.
pub(crate) fn plane_extent(rows: u32, stride: usize, row_bytes: usize) -> usize {
    if rows == 0 {
        0
    } else {
        (rows as usize - 1) * stride + row_bytes
    }
}

// ---------------------------------------------------------------------------
// PlaneSlice (borrowed, immutable)
// ---------------------------------------------------------------------------

/// Rows of a single plane.
#[derive(Clone, Copy)]
pub struct PlaneSlice<'a> {
    data: &'a [u8],
    row_bytes: usize,
    rows: u32,
    stride: usize,
}

impl<'a> PlaneSlice<'a> {
    fn new(data: &'a [u8], layout: PlaneLayout, spec: PlaneSpec, width: u32, height: u32) -> Self {
        let rows = spec.rows(height);
        let row_bytes = spec.stride(width);
        let end = layout.offset + plane_extent(rows, layout.stride, row_bytes);
        Self {
            data: &data[layout.offset..end],
            row_bytes,
            rows,
            stride: layout.stride,
        }
    }

    /// Number of rows.
    #[inline]
    pub fn rows(&self) -> u32 {
        self.rows
    }

    /// Byte distance between row starts.
    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Bytes of pixel data per row (excluding padding).
    #[inline]
    pub fn row_bytes(&self) -> usize {
        self.row_bytes
    }

    /// Pixel bytes for row `y`, without padding.
    ///
    /// # Panics
    ///
    /// Panics if `y >= rows`.
    #[inline]
    pub fn row(&self, y: u32) -> &'a [u8] {
        assert!(
            y < self.rows,
            "row index {y} out of bounds (rows: {})",
            self.rows
        );
        let start = y as usize * self.stride;
        &self.data[start..start + self.row_bytes]
    }

    /// Iterate over all rows, top to bottom.
    pub fn iter_rows(self) -> impl Iterator<Item = &'a [u8]> {
        (0..self.rows).map(move |y| self.row(y))
    }
}

impl fmt::Debug for PlaneSlice<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PlaneSlice({}x{}, stride {})",
            self.row_bytes, self.rows, self.stride
        )
    }
}

// ---------------------------------------------------------------------------
// PlaneSliceMut (borrowed, mutable)
// ---------------------------------------------------------------------------

/// Mutable rows of a single plane.
pub struct PlaneSliceMut<'a> {
    data: &'a mut [u8],
    row_bytes: usize,
    rows: u32,
    stride: usize,
}

impl<'a> PlaneSliceMut<'a> {
    /// `data` starts at the plane's first byte and spans its extent.
    pub(crate) fn new(
        data: &'a mut [u8],
        spec: PlaneSpec,
        stride: usize,
        width: u32,
        height: u32,
    ) -> Self {
        Self {
            data,
            row_bytes: spec.stride(width),
            rows: spec.rows(height),
            stride,
        }
    }

    #[inline]
    pub fn rows(&self) -> u32 {
        self.rows
    }

    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    #[inline]
    pub fn row_bytes(&self) -> usize {
        self.row_bytes
    }

    /// Pixel bytes for row `y` (immutable, no padding).
    ///
    /// # Panics
    ///
    /// Panics if `y >= rows`.
    #[inline]
    pub fn row(&self, y: u32) -> &[u8] {
        assert!(
            y < self.rows,
            "row index {y} out of bounds (rows: {})",
            self.rows
        );
        let start = y as usize * self.stride;
        &self.data[start..start + self.row_bytes]
    }

    /// Mutable pixel bytes for row `y` (no padding).
    ///
    /// # Panics
    ///
    /// Panics if `y >= rows`.
    #[inline]
    pub fn row_mut(&mut self, y: u32) -> &mut [u8] {
        assert!(
            y < self.rows,
            "row index {y} out of bounds (rows: {})",
            self.rows
        );
        let start = y as usize * self.stride;
        &mut self.data[start..start + self.row_bytes]
    }

    /// Set every pixel byte of the plane to `value`.
    pub fn fill(&mut self, value: u8) {
        for y in 0..self.rows {
            self.row_mut(y).fill(value);
        }
    }

    /// Copy rows from a plane of identical geometry.
    ///
    /// # Panics
    ///
    /// Panics if the row counts or row lengths differ.
    pub fn copy_from(&mut self, src: &PlaneSlice<'_>) {
        assert_eq!(self.rows, src.rows(), "plane row count mismatch");
        for y in 0..self.rows {
            self.row_mut(y).copy_from_slice(src.row(y));
        }
    }
}

impl fmt::Debug for PlaneSliceMut<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PlaneSliceMut({}x{}, stride {})",
            self.row_bytes, self.rows, self.stride
        )
    }
}

// ---------------------------------------------------------------------------
// ImageView
// ---------------------------------------------------------------------------

/// Non-owning view of an image.
///
/// Owns nothing and reports a [`capacity`](Self::capacity) of zero. The
/// borrow keeps the storage alive for as long as the view exists.
#[derive(Clone, Copy)]
pub struct ImageView<'a> {
    data: &'a [u8],
    width: u32,
    height: u32,
    format: PixelFormat,
    orientation: Orientation,
    planes: [PlaneLayout; MAX_PLANES],
}

impl<'a> ImageView<'a> {
    pub(crate) fn from_parts(
        data: &'a [u8],
        width: u32,
        height: u32,
        format: PixelFormat,
        orientation: Orientation,
        planes: [PlaneLayout; MAX_PLANES],
    ) -> Self {
        Self {
            data,
            width,
            height,
            format,
            orientation,
            planes,
        }
    }

    /// Wrap tightly packed planes stored back to back in `data`.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::BufferTooSmall`] if `data` is shorter than the
    /// image size, or [`ImageError::DimensionsTooLarge`] on overflow.
    pub fn new(
        data: &'a [u8],
        width: u32,
        height: u32,
        format: PixelFormat,
        orientation: Orientation,
    ) -> Result<Self, ImageError> {
        let needed = format
            .checked_image_size(width, height)
            .ok_or(ImageError::DimensionsTooLarge {
                width,
                height,
                format,
            })?;
        if data.len() < needed {
            return Err(ImageError::BufferTooSmall {
                needed,
                actual: data.len(),
            });
        }
        Ok(Self::from_parts(
            data,
            width,
            height,
            format,
            orientation,
            packed_planes(format, width, height),
        ))
    }

    /// Wrap planes stored back to back in `data`, each with its own row
    /// pitch. Entries of `strides` beyond the format's plane count are
    /// ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::StrideTooSmall`] if a stride is shorter than the
    /// plane's rows, [`ImageError::BufferTooSmall`] if `data` cannot hold
    /// every plane, or [`ImageError::DimensionsTooLarge`] on overflow.
    pub fn with_strides(
        data: &'a [u8],
        width: u32,
        height: u32,
        format: PixelFormat,
        orientation: Orientation,
        strides: [usize; MAX_PLANES],
    ) -> Result<Self, ImageError> {
        let too_large = || ImageError::DimensionsTooLarge {
            width,
            height,
            format,
        };
        let mut planes = [PlaneLayout::default(); MAX_PLANES];
        let mut offset = 0usize;
        let mut needed = 0usize;
        for (plane, (spec, layout)) in format.planes().iter().zip(planes.iter_mut()).enumerate() {
            let stride = strides[plane];
            let row_bytes = spec.stride(width);
            if stride < row_bytes {
                return Err(ImageError::StrideTooSmall {
                    plane,
                    stride,
                    row_bytes,
                });
            }
            let rows = spec.rows(height) as usize;
            let extent = match rows {
                0 => 0,
                _ => (rows - 1)
                    .checked_mul(stride)
                    .and_then(|n| n.checked_add(row_bytes))
                    .ok_or_else(too_large)?,
            };
            *layout = PlaneLayout { offset, stride };
            needed = offset.checked_add(extent).ok_or_else(too_large)?;
            offset = rows
                .checked_mul(stride)
                .and_then(|n| n.checked_add(offset))
                .ok_or_else(too_large)?;
        }
        if data.len() < needed {
            return Err(ImageError::BufferTooSmall {
                needed,
                actual: data.len(),
            });
        }
        Ok(Self::from_parts(data, width, height, format, orientation, planes))
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    #[inline]
    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Sum of the plane sizes implied by width, height and format.
    pub fn size(&self) -> usize {
        self.format.image_size(self.width, self.height)
    }

    /// Always 0: a view has no storage of its own to reuse.
    #[inline]
    pub fn capacity(&self) -> usize {
        0
    }

    /// Byte stride of plane `index`, or `None` if the format has fewer planes.
    pub fn stride(&self, index: usize) -> Option<usize> {
        (index < self.format.plane_count()).then(|| self.planes[index].stride)
    }

    /// Rows of plane `index` (0 = luma or interleaved pixels).
    pub fn plane(&self, index: usize) -> Option<PlaneSlice<'a>> {
        let spec = *self.format.planes().get(index)?;
        Some(PlaneSlice::new(
            self.data,
            self.planes[index],
            spec,
            self.width,
            self.height,
        ))
    }

    /// Zero-copy sub-region sharing this view's storage.
    ///
    /// Plane starts move down by the region's row offset (scaled for
    /// subsampled chroma) and right by its column offset; strides are
    /// inherited.
    ///
    /// # Panics
    ///
    /// Panics if the region is empty or extends past the image. Callers
    /// handling external input must validate it first.
    pub fn region(&self, x: u32, y: u32, width: u32, height: u32) -> ImageView<'a> {
        assert!(width > 0 && height > 0, "region {width}x{height} is empty");
        assert!(
            x.checked_add(width).is_some_and(|end| end <= self.width),
            "region x={x} w={width} exceeds width {}",
            self.width
        );
        assert!(
            y.checked_add(height).is_some_and(|end| end <= self.height),
            "region y={y} h={height} exceeds height {}",
            self.height
        );
        let mut planes = self.planes;
        for (layout, spec) in planes.iter_mut().zip(self.format.planes()) {
            layout.offset += spec.rows(y) as usize * layout.stride + spec.column_offset(x);
        }
        ImageView {
            data: self.data,
            width,
            height,
            format: self.format,
            orientation: self.orientation,
            planes,
        }
    }

    /// Owned, tightly packed copy of a sub-region.
    ///
    /// # Panics
    ///
    /// Panics under the same conditions as [`region`](Self::region).
    pub fn crop(&self, x: u32, y: u32, width: u32, height: u32) -> Result<Image, ImageError> {
        self.region(x, y, width, height).to_image()
    }

    /// Deep copy into a new, tightly packed owning buffer.
    pub fn to_image(&self) -> Result<Image, ImageError> {
        let size = self.size();
        let mut data = allocate(size)?;
        self.pack_into(&mut data);
        Ok(Image::from_packed(
            data,
            self.width,
            self.height,
            self.format,
            self.orientation,
        ))
    }

    /// Append every plane to `out` in packed layout. Plane `i + 1` starts
    /// exactly [`PixelFormat::plane_size`] bytes after plane `i`.
    pub(crate) fn pack_into(&self, out: &mut Vec<u8>) {
        let base = out.len();
        let mut plane_end = base;
        for index in 0..self.format.plane_count() {
            if let Some(plane) = self.plane(index) {
                for row in plane.iter_rows() {
                    out.extend_from_slice(row);
                }
            }
            plane_end += self.format.plane_size(index, self.width, self.height);
            out.resize(plane_end, 0);
        }
    }

    /// Copy this image into `dst`.
    ///
    /// When `dst` already owns at least [`size`](Self::size) bytes the planes
    /// are written into its existing storage (Y, then U immediately after,
    /// then V) and its shape is rewritten to match. Otherwise a fresh copy is
    /// swapped into `dst`. Either way `dst` is never left half-updated.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::Allocation`] if a fresh copy was needed and could
    /// not be allocated; `dst` is unchanged in that case.
    pub fn copy_to(&self, dst: &mut Image) -> Result<(), ImageError> {
        let size = self.size();
        if dst.capacity() < size {
            let mut fresh = self.to_image()?;
            dst.swap(&mut fresh);
            return Ok(());
        }

        tracing::debug!(
            needed = size,
            capacity = dst.capacity(),
            "copying into existing storage"
        );
        dst.reshape(self.width, self.height, self.format, self.orientation);
        for (index, slot) in dst.planes_mut().iter_mut().enumerate() {
            if let (Some(src), Some(dst_plane)) = (self.plane(index), slot.as_mut()) {
                dst_plane.copy_from(&src);
            }
        }
        Ok(())
    }

    /// Same shape, format and orientation, and byte-identical plane rows.
    ///
    /// Padding between rows is not compared.
    pub fn is_equal(&self, other: &ImageView<'_>) -> bool {
        if self.width != other.width
            || self.height != other.height
            || self.format != other.format
            || self.orientation != other.orientation
        {
            return false;
        }
        (0..self.format.plane_count()).all(|index| match (self.plane(index), other.plane(index)) {
            (Some(a), Some(b)) => a.iter_rows().eq(b.iter_rows()),
            _ => false,
        })
    }
}

impl PartialEq for ImageView<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.is_equal(other)
    }
}

impl Eq for ImageView<'_> {}

impl fmt::Debug for ImageView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ImageView({}x{}, {}, {})",
            self.width, self.height, self.format, self.orientation
        )
    }
}

// ---------------------------------------------------------------------------
// ImgRef → ImageView (zero-copy From impls)
// ---------------------------------------------------------------------------

macro_rules! impl_from_imgref {
    ($pixel:ty, $format:expr) => {
        impl<'a> From<ImgRef<'a, $pixel>> for ImageView<'a> {
            fn from(img: ImgRef<'a, $pixel>) -> Self {
                use rgb::ComponentBytes;
                let bytes = img.buf().as_bytes();
                let mut planes = [PlaneLayout::default(); MAX_PLANES];
                planes[0].stride = img.stride() * core::mem::size_of::<$pixel>();
                ImageView {
                    data: bytes,
                    width: img.width() as u32,
                    height: img.height() as u32,
                    format: $format,
                    orientation: Orientation::Normal,
                    planes,
                }
            }
        }
    };
}

impl_from_imgref!(Gray<u8>, PixelFormat::Gray8);
impl_from_imgref!(BGR<u8>, PixelFormat::Bgr888);
impl_from_imgref!(BGRA<u8>, PixelFormat::Bgra8888);
impl_from_imgref!(Rgb<u8>, PixelFormat::Rgb888);
impl_from_imgref!(Rgba<u8>, PixelFormat::Rgba8888);

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::format;
    use alloc::vec;

    /// 4x4 J420 whose Y bytes are `y * 16 + x`, U bytes `100 + i`, V bytes `200 + i`.
    fn numbered_j420() -> Image {
        let mut img = Image::new(4, 4, PixelFormat::J420, Orientation::Normal).unwrap();
        let [y, u, v] = img.planes_mut();
        let (mut y, mut u, mut v) = (y.unwrap(), u.unwrap(), v.unwrap());
        for row in 0..4 {
            for (x, b) in y.row_mut(row).iter_mut().enumerate() {
                *b = (row * 16) as u8 + x as u8;
            }
        }
        for row in 0..2 {
            for (x, b) in u.row_mut(row).iter_mut().enumerate() {
                *b = 100 + (row * 2) as u8 + x as u8;
            }
            for (x, b) in v.row_mut(row).iter_mut().enumerate() {
                *b = 200 + (row * 2) as u8 + x as u8;
            }
        }
        img
    }

    #[test]
    fn new_checks_length() {
        let data = [0u8; 23];
        let err = ImageView::new(&data, 4, 4, PixelFormat::J420, Orientation::Normal).unwrap_err();
        assert!(matches!(
            err,
            ImageError::BufferTooSmall {
                needed: 24,
                actual: 23
            }
        ));
        let data = [0u8; 24];
        let view = ImageView::new(&data, 4, 4, PixelFormat::J420, Orientation::Normal).unwrap();
        assert_eq!(view.size(), 24);
        assert_eq!(view.capacity(), 0);
        assert_eq!(view.stride(1), Some(2));
        assert_eq!(view.stride(2), Some(2));
        assert_eq!(view.stride(3), None);
    }

    #[test]
    fn with_strides_skips_padding() {
        // 2x2 RGB rows padded to 8 bytes
        let data = [
            1, 2, 3, 4, 5, 6, 0xEE, 0xEE, //
            7, 8, 9, 10, 11, 12,
        ];
        let view = ImageView::with_strides(
            &data,
            2,
            2,
            PixelFormat::Rgb888,
            Orientation::Normal,
            [8, 0, 0],
        )
        .unwrap();
        let plane = view.plane(0).unwrap();
        assert_eq!(plane.row(0), &[1, 2, 3, 4, 5, 6]);
        assert_eq!(plane.row(1), &[7, 8, 9, 10, 11, 12]);

        let packed = view.to_image().unwrap();
        assert_eq!(packed.as_bytes(), &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12]);
        assert!(packed.as_view().is_equal(&view));
    }

    #[test]
    fn with_strides_rejects_short_stride() {
        let data = [0u8; 64];
        let err = ImageView::with_strides(
            &data,
            4,
            4,
            PixelFormat::Nv12,
            Orientation::Normal,
            [4, 3, 0],
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ImageError::StrideTooSmall {
                plane: 1,
                stride: 3,
                row_bytes: 4
            }
        ));
    }

    #[test]
    fn region_offsets_every_plane() {
        let img = numbered_j420();
        let roi = img.region(2, 2, 2, 2);
        assert_eq!(roi.width(), 2);
        assert_eq!(roi.height(), 2);
        assert_eq!(roi.capacity(), 0);
        assert_eq!(roi.stride(0), Some(4));

        let y = roi.plane(0).unwrap();
        assert_eq!(y.row(0), &[34, 35]);
        assert_eq!(y.row(1), &[50, 51]);
        // chroma row 1, column 1
        assert_eq!(roi.plane(1).unwrap().row(0), &[103]);
        assert_eq!(roi.plane(2).unwrap().row(0), &[203]);
    }

    #[test]
    fn region_of_region_nests() {
        let img = numbered_j420();
        let outer = img.region(0, 2, 4, 2);
        let inner = outer.region(2, 0, 2, 2);
        assert!(inner.is_equal(&img.region(2, 2, 2, 2)));
    }

    #[test]
    fn nv12_region_keeps_uv_pairs() {
        let mut img = Image::new(4, 4, PixelFormat::Nv12, Orientation::Normal).unwrap();
        {
            let mut uv = img.plane_mut(1).unwrap();
            for row in 0..2 {
                for (x, b) in uv.row_mut(row).iter_mut().enumerate() {
                    *b = (row * 10) as u8 + x as u8;
                }
            }
        }
        let roi = img.region(2, 2, 2, 2);
        assert_eq!(roi.plane(1).unwrap().row(0), &[12, 13]);
    }

    #[test]
    #[should_panic(expected = "exceeds width")]
    fn region_past_right_edge_panics() {
        let img = numbered_j420();
        let _ = img.region(3, 0, 2, 1);
    }

    #[test]
    #[should_panic(expected = "exceeds height")]
    fn region_past_bottom_edge_panics() {
        let img = numbered_j420();
        let _ = img.region(0, 1, 1, 4);
    }

    #[test]
    #[should_panic(expected = "is empty")]
    fn empty_region_panics() {
        let img = numbered_j420();
        let _ = img.region(0, 0, 0, 1);
    }

    #[test]
    fn crop_copies_region() {
        let img = numbered_j420();
        let cropped = img.crop(2, 2, 2, 2).unwrap();
        assert_eq!(cropped.capacity(), cropped.size());
        assert_eq!(cropped.size(), 6);
        assert_eq!(cropped.as_bytes(), &[34, 35, 50, 51, 103, 203]);
        assert!(cropped.as_view().is_equal(&img.region(2, 2, 2, 2)));
    }

    #[test]
    fn is_equal_checks_metadata_first() {
        let img = numbered_j420();
        let a = img.as_view();
        let data = img.as_bytes();
        let b = ImageView::new(data, 4, 4, PixelFormat::J420, Orientation::Rotate90).unwrap();
        assert!(!a.is_equal(&b));
        let c = ImageView::new(data, 4, 4, PixelFormat::J420, Orientation::Normal).unwrap();
        assert!(a.is_equal(&c));
        assert_eq!(a, c);
    }

    #[test]
    fn imgref_views_are_zero_copy() {
        let pixels = vec![
            Rgb { r: 1, g: 2, b: 3 },
            Rgb { r: 4, g: 5, b: 6 },
            Rgb { r: 7, g: 8, b: 9 },
            Rgb {
                r: 10,
                g: 11,
                b: 12,
            },
        ];
        let img = imgref::Img::new(pixels.as_slice(), 2, 2);
        let view: ImageView<'_> = img.into();
        assert_eq!(view.format(), PixelFormat::Rgb888);
        assert_eq!(view.width(), 2);
        assert_eq!(view.stride(0), Some(6));
        assert_eq!(view.plane(0).unwrap().row(1), &[7, 8, 9, 10, 11, 12]);
    }

    #[test]
    fn imgref_gray_with_stride() {
        let pixels = vec![Gray::new(1u8), Gray::new(2), Gray::new(0), Gray::new(3), Gray::new(4)];
        let img = imgref::Img::new_stride(pixels.as_slice(), 2, 2, 3);
        let view: ImageView<'_> = img.into();
        assert_eq!(view.format(), PixelFormat::Gray8);
        assert_eq!(view.plane(0).unwrap().row(0), &[1, 2]);
        assert_eq!(view.plane(0).unwrap().row(1), &[3, 4]);
    }

    #[test]
    fn debug_formats() {
        let img = numbered_j420();
        assert_eq!(format!("{:?}", img.as_view()), "ImageView(4x4, J420, 1)");
        assert_eq!(
            format!("{:?}", img.plane(1).unwrap()),
            "PlaneSlice(2x2, stride 2)"
        );
    }
}
