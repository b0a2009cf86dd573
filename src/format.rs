//! Pixel format descriptors.
//!
//! A [`PixelFormat`] names one of the eight supported layouts. Per-plane
//! geometry comes from a static table indexed by the format id, so nothing
//! outside this module decodes bit fields. [`FormatCode`] is the packed
//! 32-bit form used for interop:
//!
//! ```text
//! bits  0..8   Y (first plane) bits per pixel
//! bits  8..16  U (second plane) bits per pixel
//! bits 16..24  V (third plane) bits per pixel
//! bits 24..32  format id
//! ```

use core::fmt;

/// Maximum number of planes any format uses.
pub const MAX_PLANES: usize = 3;

/// Name reported for format codes whose id is outside the known range.
pub const UNKNOWN_FORMAT_NAME: &str = "Unknown Pixel Format";

// ---------------------------------------------------------------------------
// PixelFormat
// ---------------------------------------------------------------------------

/// Supported pixel layouts.
///
/// The discriminant is the format id. It indexes the conversion table and
/// the name table, so the set is closed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PixelFormat {
    /// 8-bit luma, one plane.
    Gray8 = 0,
    /// Interleaved B, G, R bytes.
    Bgr888 = 1,
    /// Interleaved B, G, R, A bytes.
    Bgra8888 = 2,
    /// Interleaved R, G, B bytes.
    Rgb888 = 3,
    /// Interleaved R, G, B, A bytes.
    Rgba8888 = 4,
    /// Full-range 4:2:0 with separate Y, U and V planes.
    J420 = 5,
    /// 4:2:0 with a Y plane and an interleaved U/V plane.
    Nv12 = 6,
    /// 4:2:0 with a Y plane and an interleaved V/U plane.
    Nv21 = 7,
}

/// Geometry of a single plane.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PlaneSpec {
    /// Bits per *image* pixel stored in this plane, averaged over the
    /// subsampling block (2 for a quarter-resolution 8-bit chroma plane).
    pub bits_per_pixel: u8,
    /// Vertical subsampling factor (1 = every row, 2 = every other row).
    pub row_divisor: u8,
}

impl PlaneSpec {
    const fn full(bits_per_pixel: u8) -> Self {
        Self {
            bits_per_pixel,
            row_divisor: 1,
        }
    }

    const fn half_rows(bits_per_pixel: u8) -> Self {
        Self {
            bits_per_pixel,
            row_divisor: 2,
        }
    }

    /// Tightly packed row length in bytes for an image `width` pixels wide.
    #[inline]
    pub const fn stride(self, width: u32) -> usize {
        width as usize * self.bits_per_pixel as usize * self.row_divisor as usize / 8
    }

    /// Number of rows this plane holds for an image `height` pixels tall.
    #[inline]
    pub const fn rows(self, height: u32) -> u32 {
        height / self.row_divisor as u32
    }

    /// Byte offset of image column `x` within a row of this plane.
    #[inline]
    pub const fn column_offset(self, x: u32) -> usize {
        self.stride(x)
    }

    /// Plane size in bytes: `width * height * bpp / 8`.
    #[inline]
    pub const fn size(self, width: u32, height: u32) -> usize {
        (width as u64 * height as u64 * self.bits_per_pixel as u64 / 8) as usize
    }

    /// Overflow-checked [`size`](Self::size).
    pub fn checked_size(self, width: u32, height: u32) -> Option<usize> {
        let bits = u64::from(width)
            .checked_mul(u64::from(height))?
            .checked_mul(u64::from(self.bits_per_pixel))?;
        usize::try_from(bits / 8).ok()
    }
}

const GRAY_PLANES: [PlaneSpec; 1] = [PlaneSpec::full(8)];
const RGB_PLANES: [PlaneSpec; 1] = [PlaneSpec::full(24)];
const RGBA_PLANES: [PlaneSpec; 1] = [PlaneSpec::full(32)];
const I420_PLANES: [PlaneSpec; 3] = [
    PlaneSpec::full(8),
    PlaneSpec::half_rows(2),
    PlaneSpec::half_rows(2),
];
const NV_PLANES: [PlaneSpec; 2] = [PlaneSpec::full(8), PlaneSpec::half_rows(4)];

/// Format table, indexed by id.
const FORMATS: [(PixelFormat, &str, &[PlaneSpec]); PixelFormat::COUNT] = [
    (PixelFormat::Gray8, "GRAY", &GRAY_PLANES),
    (PixelFormat::Bgr888, "BGR", &RGB_PLANES),
    (PixelFormat::Bgra8888, "BGRA", &RGBA_PLANES),
    (PixelFormat::Rgb888, "RGB", &RGB_PLANES),
    (PixelFormat::Rgba8888, "RGBA", &RGBA_PLANES),
    (PixelFormat::J420, "J420", &I420_PLANES),
    (PixelFormat::Nv12, "NV12", &NV_PLANES),
    (PixelFormat::Nv21, "NV21", &NV_PLANES),
];

impl PixelFormat {
    /// Number of enumerated formats.
    pub const COUNT: usize = 8;

    /// Every format, in id order.
    pub const ALL: [PixelFormat; Self::COUNT] = [
        Self::Gray8,
        Self::Bgr888,
        Self::Bgra8888,
        Self::Rgb888,
        Self::Rgba8888,
        Self::J420,
        Self::Nv12,
        Self::Nv21,
    ];

    /// Format id (0-7).
    #[inline]
    pub const fn id(self) -> u8 {
        self as u8
    }

    /// Look up a format by id.
    pub const fn from_id(id: u8) -> Option<Self> {
        if (id as usize) < Self::COUNT {
            Some(FORMATS[id as usize].0)
        } else {
            None
        }
    }

    /// Human-readable name (`"GRAY"`, `"BGR"`, ...).
    #[inline]
    pub const fn name(self) -> &'static str {
        FORMATS[self as usize].1
    }

    /// Geometry of each plane, first plane first.
    #[inline]
    pub const fn planes(self) -> &'static [PlaneSpec] {
        FORMATS[self as usize].2
    }

    /// Number of planes (1-3).
    #[inline]
    pub const fn plane_count(self) -> usize {
        self.planes().len()
    }

    /// Packed code for this format.
    pub const fn code(self) -> FormatCode {
        let planes = self.planes();
        let mut bits = [0u8; MAX_PLANES];
        let mut i = 0;
        while i < planes.len() {
            bits[i] = planes[i].bits_per_pixel;
            i += 1;
        }
        FormatCode::new(self.id(), bits[0], bits[1], bits[2])
    }

    /// Whether this is one of the 4:2:0 YUV layouts.
    #[inline]
    pub const fn is_yuv(self) -> bool {
        matches!(self, Self::J420 | Self::Nv12 | Self::Nv21)
    }

    /// Size in bytes of plane `index`, or 0 if the format has no such plane.
    pub fn plane_size(self, index: usize, width: u32, height: u32) -> usize {
        self.planes()
            .get(index)
            .map_or(0, |spec| spec.size(width, height))
    }

    /// Sum of all plane sizes.
    pub fn image_size(self, width: u32, height: u32) -> usize {
        self.planes().iter().map(|p| p.size(width, height)).sum()
    }

    /// Overflow-checked [`image_size`](Self::image_size).
    pub fn checked_image_size(self, width: u32, height: u32) -> Option<usize> {
        self.planes().iter().try_fold(0usize, |total, p| {
            total.checked_add(p.checked_size(width, height)?)
        })
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// FormatCode
// ---------------------------------------------------------------------------

/// Packed 32-bit format code: id plus per-plane bits per pixel.
///
/// Codes can carry ids no [`PixelFormat`] has; those report
/// [`UNKNOWN_FORMAT_NAME`] and convert to nothing.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FormatCode(u32);

impl FormatCode {
    /// Pack an id and the three plane depths.
    #[inline]
    pub const fn new(id: u8, y_bits: u8, u_bits: u8, v_bits: u8) -> Self {
        Self(y_bits as u32 | (u_bits as u32) << 8 | (v_bits as u32) << 16 | (id as u32) << 24)
    }

    /// Wrap a raw code.
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Raw packed value.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn id(self) -> u8 {
        (self.0 >> 24) as u8
    }

    #[inline]
    pub const fn y_bits(self) -> u8 {
        self.0 as u8
    }

    #[inline]
    pub const fn u_bits(self) -> u8 {
        (self.0 >> 8) as u8
    }

    #[inline]
    pub const fn v_bits(self) -> u8 {
        (self.0 >> 16) as u8
    }

    /// The format this code's id names, if any.
    #[inline]
    pub const fn format(self) -> Option<PixelFormat> {
        PixelFormat::from_id(self.id())
    }

    /// Format name, or [`UNKNOWN_FORMAT_NAME`] for an unknown id.
    pub const fn name(self) -> &'static str {
        match self.format() {
            Some(format) => format.name(),
            None => UNKNOWN_FORMAT_NAME,
        }
    }
}

impl From<PixelFormat> for FormatCode {
    fn from(format: PixelFormat) -> Self {
        format.code()
    }
}

impl TryFrom<FormatCode> for PixelFormat {
    type Error = FormatCode;

    /// Resolves by id alone; the bit depths are not cross-checked.
    fn try_from(code: FormatCode) -> Result<Self, FormatCode> {
        code.format().ok_or(code)
    }
}

impl fmt::Debug for FormatCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "FormatCode({} id={} bpp={}/{}/{})",
            self.name(),
            self.id(),
            self.y_bits(),
            self.u_bits(),
            self.v_bits()
        )
    }
}
