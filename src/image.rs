//! Owning pixel buffers.

use alloc::vec::Vec;
use core::fmt;

use crate::view::{PlaneLayout, PlaneSlice, PlaneSliceMut, packed_planes, plane_extent};
use crate::{ImageError, ImageView, MAX_PLANES, Orientation, PixelFormat};

/// Reserve exactly `bytes` of storage, reporting failure instead of aborting.
pub(crate) fn allocate(bytes: usize) -> Result<Vec<u8>, ImageError> {
    let mut data = Vec::new();
    if data.try_reserve_exact(bytes).is_err() {
        tracing::error!(bytes, "pixel storage allocation failed");
        return Err(ImageError::Allocation { bytes });
    }
    Ok(data)
}

/// An image that owns its pixel storage.
///
/// Planes are packed back to back: Y (or the interleaved pixels) first, then
/// U, then V, each row exactly as long as the format requires. The storage
/// may be larger than [`size`](Self::size) after [`copy_to`](Self::copy_to)
/// reuses a bigger buffer; [`capacity`](Self::capacity) reports the full
/// length so later copies can reuse it too.
///
/// Storage is released when the image is dropped. Views borrowed from it
/// cannot outlive it.
pub struct Image {
    data: Vec<u8>,
    width: u32,
    height: u32,
    format: PixelFormat,
    orientation: Orientation,
    planes: [PlaneLayout; MAX_PLANES],
}

impl Image {
    /// Allocate a zero-filled image.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::DimensionsTooLarge`] if the size overflows, or
    /// [`ImageError::Allocation`] if the storage cannot be reserved.
    pub fn new(
        width: u32,
        height: u32,
        format: PixelFormat,
        orientation: Orientation,
    ) -> Result<Self, ImageError> {
        let size = format
            .checked_image_size(width, height)
            .ok_or(ImageError::DimensionsTooLarge {
                width,
                height,
                format,
            })?;
        let mut data = allocate(size).inspect_err(|_| {
            tracing::error!(width, height, format = format.name(), "cannot create image");
        })?;
        data.resize(size, 0);
        Ok(Self::from_packed(data, width, height, format, orientation))
    }

    /// Take ownership of packed plane data.
    ///
    /// `data` may be longer than the image needs; the excess counts towards
    /// [`capacity`](Self::capacity).
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::BufferTooSmall`] if `data` is shorter than the
    /// image size.
    pub fn from_vec(
        data: Vec<u8>,
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
        Ok(Self::from_packed(data, width, height, format, orientation))
    }

    /// `data` must hold at least `format.image_size(width, height)` bytes.
    pub(crate) fn from_packed(
        data: Vec<u8>,
        width: u32,
        height: u32,
        format: PixelFormat,
        orientation: Orientation,
    ) -> Self {
        debug_assert!(data.len() >= format.image_size(width, height));
        Self {
            data,
            width,
            height,
            format,
            orientation,
            planes: packed_planes(format, width, height),
        }
    }

    /// Give up the storage, including any bytes past [`size`](Self::size).
    pub fn into_vec(self) -> Vec<u8> {
        self.data
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

    /// Record a new orientation without touching the pixels.
    pub fn set_orientation(&mut self, orientation: Orientation) {
        self.orientation = orientation;
    }

    /// Sum of the plane sizes implied by width, height and format.
    pub fn size(&self) -> usize {
        self.format.image_size(self.width, self.height)
    }

    /// Bytes of owned storage. Never less than [`size`](Self::size).
    #[inline]
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Byte stride of plane `index`, or `None` if the format has fewer planes.
    pub fn stride(&self, index: usize) -> Option<usize> {
        (index < self.format.plane_count()).then(|| self.planes[index].stride)
    }

    /// The packed planes, without any trailing spare capacity.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data[..self.size()]
    }

    pub(crate) fn as_bytes_mut(&mut self) -> &mut [u8] {
        let size = self.size();
        &mut self.data[..size]
    }

    /// Borrow the whole image as a view.
    pub fn as_view(&self) -> ImageView<'_> {
        ImageView::from_parts(
            &self.data,
            self.width,
            self.height,
            self.format,
            self.orientation,
            self.planes,
        )
    }

    /// Rows of plane `index`.
    pub fn plane(&self, index: usize) -> Option<PlaneSlice<'_>> {
        self.as_view().plane(index)
    }

    /// Mutable rows of plane `index`.
    pub fn plane_mut(&mut self, index: usize) -> Option<PlaneSliceMut<'_>> {
        self.planes_mut().into_iter().nth(index).flatten()
    }

    /// Mutable rows of every plane at once. Slots past the format's plane
    /// count are `None`.
    pub fn planes_mut(&mut self) -> [Option<PlaneSliceMut<'_>>; MAX_PLANES] {
        let mut out = [None, None, None];
        let (width, height) = (self.width, self.height);
        let mut rest: &mut [u8] = &mut self.data;
        let mut consumed = 0;
        for (index, spec) in self.format.planes().iter().enumerate() {
            let layout = self.planes[index];
            let extent = plane_extent(spec.rows(height), layout.stride, spec.stride(width));
            let (_, tail) = core::mem::take(&mut rest).split_at_mut(layout.offset - consumed);
            let (plane, tail) = tail.split_at_mut(extent);
            rest = tail;
            consumed = layout.offset + extent;
            out[index] = Some(PlaneSliceMut::new(plane, *spec, layout.stride, width, height));
        }
        out
    }

    /// Zero-copy sub-region. See [`ImageView::region`].
    ///
    /// # Panics
    ///
    /// Panics if the region is empty or extends past the image.
    pub fn region(&self, x: u32, y: u32, width: u32, height: u32) -> ImageView<'_> {
        self.as_view().region(x, y, width, height)
    }

    /// Owned copy of a sub-region. See [`ImageView::crop`].
    ///
    /// # Panics
    ///
    /// Panics if the region is empty or extends past the image.
    pub fn crop(&self, x: u32, y: u32, width: u32, height: u32) -> Result<Image, ImageError> {
        self.as_view().crop(x, y, width, height)
    }

    /// Fallible deep copy. The copy's capacity equals its size.
    pub fn try_clone(&self) -> Result<Image, ImageError> {
        self.as_view().to_image()
    }

    /// Copy into `dst`, reusing its storage when it is large enough.
    /// See [`ImageView::copy_to`].
    pub fn copy_to(&self, dst: &mut Image) -> Result<(), ImageError> {
        self.as_view().copy_to(dst)
    }

    /// Exchange every field, storage included, with `other`.
    pub fn swap(&mut self, other: &mut Image) {
        core::mem::swap(self, other);
    }

    /// Same shape, format, orientation and pixel bytes.
    pub fn is_equal(&self, other: &Image) -> bool {
        self.as_view().is_equal(&other.as_view())
    }

    /// Repack the header for new contents. Storage is left as is, so the
    /// caller must have checked that it is large enough.
    pub(crate) fn reshape(
        &mut self,
        width: u32,
        height: u32,
        format: PixelFormat,
        orientation: Orientation,
    ) {
        debug_assert!(self.data.len() >= format.image_size(width, height));
        self.width = width;
        self.height = height;
        self.format = format;
        self.orientation = orientation;
        self.planes = packed_planes(format, width, height);
    }
}

impl Default for Image {
    /// An empty 0x0 `GRAY` image with no storage.
    fn default() -> Self {
        Self::from_packed(Vec::new(), 0, 0, PixelFormat::Gray8, Orientation::Normal)
    }
}

impl Clone for Image {
    /// Deep copy with capacity equal to size. Aborts on allocation failure
    /// like any `Vec`; use [`try_clone`](Image::try_clone) to handle it.
    fn clone(&self) -> Self {
        let view = self.as_view();
        let mut data = Vec::with_capacity(view.size());
        view.pack_into(&mut data);
        Self::from_packed(data, self.width, self.height, self.format, self.orientation)
    }
}

impl PartialEq for Image {
    fn eq(&self, other: &Self) -> bool {
        self.is_equal(other)
    }
}

impl Eq for Image {}

impl<'a> From<&'a Image> for ImageView<'a> {
    fn from(image: &'a Image) -> Self {
        image.as_view()
    }
}

impl fmt::Debug for Image {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Image({}x{}, {}, {}, {}/{} bytes)",
            self.width,
            self.height,
            self.format,
            self.orientation,
            self.size(),
            self.capacity()
        )
    }
}
