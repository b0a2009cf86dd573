//! Pixel kernels behind the conversion table.
//!
//! Row kernels see one row of a single-plane source and the matching row of
//! the destination. Channel reshuffles go to `garb`; gray expansion and luma
//! extraction are done here. Plane kernels see whole images and handle the
//! YUV layouts.

use crate::{Image, ImageView, KernelError};

/// Full-range luma: `(77 R + 150 G + 29 B + 128) >> 8`.
///
/// The weights sum to 256, so `luma(v, v, v) == v` for every `v`.
#[inline]
pub const fn luma(r: u8, g: u8, b: u8) -> u8 {
    ((77 * r as u32 + 150 * g as u32 + 29 * b as u32 + 128) >> 8) as u8
}

// ---------------------------------------------------------------------------
// Row kernels
// ---------------------------------------------------------------------------

macro_rules! swizzle {
    ($(#[$attr:meta])* $name:ident => $garb:path) => {
        $(#[$attr])*
        pub(super) fn $name(src: &[u8], dst: &mut [u8]) -> Result<(), KernelError> {
            $garb(src, dst).map_err(|_| KernelError::RowSize)
        }
    };
}

swizzle!(
    /// 3 bytes/px, R and B exchanged (RGB↔BGR).
    swap_rb3 => garb::bytes::rgb_to_bgr
);
swizzle!(
    /// 4 bytes/px, R and B exchanged (RGBA↔BGRA).
    swap_rb4 => garb::bytes::rgba_to_bgra
);
swizzle!(
    /// 3 → 4 bytes/px, order kept, alpha 255.
    add_alpha => garb::bytes::rgb_to_rgba
);
swizzle!(
    /// 3 → 4 bytes/px, R and B exchanged, alpha 255.
    swap_rb_add_alpha => garb::bytes::rgb_to_bgra
);
swizzle!(
    /// 4 → 3 bytes/px, order kept, alpha dropped.
    drop_alpha => garb::bytes::rgba_to_rgb
);
swizzle!(
    /// 4 → 3 bytes/px, R and B exchanged, alpha dropped.
    swap_rb_drop_alpha => garb::bytes::bgra_to_rgb
);
swizzle!(
    /// Gray → 4 bytes/px, every color channel set to the gray value, alpha 255.
    gray_to_4 => garb::bytes::gray_to_rgba
);

/// Gray → 3 bytes/px with every channel set to the gray value.
pub(super) fn gray_to_3(src: &[u8], dst: &mut [u8]) -> Result<(), KernelError> {
    if dst.len() != src.len() * 3 {
        return Err(KernelError::RowSize);
    }
    for (px, &v) in dst.chunks_exact_mut(3).zip(src) {
        px.fill(v);
    }
    Ok(())
}

/// Color → gray. `R` and `B` are the red and blue byte positions within a
/// `BPP`-byte pixel; green is always at 1.
pub(super) fn to_luma<const BPP: usize, const R: usize, const B: usize>(
    src: &[u8],
    dst: &mut [u8],
) -> Result<(), KernelError> {
    if src.len() != dst.len() * BPP {
        return Err(KernelError::RowSize);
    }
    for (y, px) in dst.iter_mut().zip(src.chunks_exact(BPP)) {
        *y = luma(px[R], px[1], px[B]);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Plane kernels
// ---------------------------------------------------------------------------

/// Chroma value for a colorless pixel.
const NEUTRAL_CHROMA: u8 = 128;

fn copy_luma(src: &ImageView<'_>, dst: &mut Image) -> Result<(), KernelError> {
    let src_y = src.plane(0).ok_or(KernelError::MissingPlane(0))?;
    let mut dst_y = dst.plane_mut(0).ok_or(KernelError::MissingPlane(0))?;
    if src_y.rows() != dst_y.rows() || src_y.row_bytes() != dst_y.row_bytes() {
        return Err(KernelError::RowSize);
    }
    dst_y.copy_from(&src_y);
    Ok(())
}

/// Gray → J420 / NV12 / NV21: luma copied, chroma neutral.
pub(super) fn gray_to_yuv(src: &ImageView<'_>, dst: &mut Image) -> Result<(), KernelError> {
    copy_luma(src, dst)?;
    // Every byte past luma, including the tail odd sizes leave after the
    // last whole chroma row.
    let luma_size = dst.format().plane_size(0, dst.width(), dst.height());
    dst.as_bytes_mut()[luma_size..].fill(NEUTRAL_CHROMA);
    Ok(())
}

/// J420 / NV12 / NV21 → gray: the luma plane is the gray image.
pub(super) fn yuv_to_gray(src: &ImageView<'_>, dst: &mut Image) -> Result<(), KernelError> {
    copy_luma(src, dst)
}
