//! Format conversion.
//!
//! Every (source, destination) pair maps to one [`Routine`] in a static 8x8
//! table indexed by format id. The table is built at compile time and never
//! mutated, so conversions can run from any number of threads at once.
//!
//! |        | GRAY | BGR | BGRA | RGB | RGBA | J420 | NV12 | NV21 |
//! |--------|------|-----|------|-----|------|------|------|------|
//! | GRAY   | =    | k   | k    | k   | k    | p    | p    | p    |
//! | BGR    | k    | =   | k    | k   | k    |      |      |      |
//! | BGRA   | k    | k   | =    | k   | k    |      |      |      |
//! | RGB    | k    | k   | k    | =   | k    |      |      |      |
//! | RGBA   | k    | k   | k    | k   | =    |      |      |      |
//! | J420   | p    |     |      |     |      | =    |      |      |
//! | NV12   | p    |     |      |     |      |      | =    |      |
//! | NV21   | p    |     |      |     |      |      |      | =    |
//!
//! `=` copies, `k` runs a row kernel, `p` a plane kernel; blank cells are
//! unsupported.

mod kernels;

pub use kernels::luma;

use crate::{FormatCode, Image, ImageError, ImageView, KernelError, PixelFormat};

type RowKernel = fn(&[u8], &mut [u8]) -> Result<(), KernelError>;
type PlaneKernel = fn(&ImageView<'_>, &mut Image) -> Result<(), KernelError>;

#[derive(Clone, Copy)]
enum Routine {
    Identity,
    Unsupported,
    Rows(RowKernel),
    Planes(PlaneKernel),
}

/// How a conversion between two formats is carried out.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConversionKind {
    /// Same format; the result is a deep copy.
    Identity,
    /// A dedicated kernel converts the pixels.
    Direct,
    /// No kernel exists for this pair.
    Unsupported,
}

const N: usize = PixelFormat::COUNT;

type Table = [[Routine; N]; N];

const fn set(table: &mut Table, from: PixelFormat, to: PixelFormat, routine: Routine) {
    table[from as usize][to as usize] = routine;
}

const fn build_table() -> Table {
    use PixelFormat::{Bgr888, Bgra8888, Gray8, J420, Nv12, Nv21, Rgb888, Rgba8888};
    use Routine::{Planes, Rows};

    let mut table = [[Routine::Unsupported; N]; N];
    let mut i = 0;
    while i < N {
        table[i][i] = Routine::Identity;
        i += 1;
    }

    set(&mut table, Gray8, Bgr888, Rows(kernels::gray_to_3));
    set(&mut table, Gray8, Rgb888, Rows(kernels::gray_to_3));
    set(&mut table, Gray8, Bgra8888, Rows(kernels::gray_to_4));
    set(&mut table, Gray8, Rgba8888, Rows(kernels::gray_to_4));
    set(&mut table, Gray8, J420, Planes(kernels::gray_to_yuv));
    set(&mut table, Gray8, Nv12, Planes(kernels::gray_to_yuv));
    set(&mut table, Gray8, Nv21, Planes(kernels::gray_to_yuv));

    set(&mut table, Bgr888, Gray8, Rows(kernels::to_luma::<3, 2, 0>));
    set(&mut table, Bgr888, Bgra8888, Rows(kernels::add_alpha));
    set(&mut table, Bgr888, Rgb888, Rows(kernels::swap_rb3));
    set(&mut table, Bgr888, Rgba8888, Rows(kernels::swap_rb_add_alpha));

    set(&mut table, Bgra8888, Gray8, Rows(kernels::to_luma::<4, 2, 0>));
    set(&mut table, Bgra8888, Bgr888, Rows(kernels::drop_alpha));
    set(&mut table, Bgra8888, Rgb888, Rows(kernels::swap_rb_drop_alpha));
    set(&mut table, Bgra8888, Rgba8888, Rows(kernels::swap_rb4));

    set(&mut table, Rgb888, Gray8, Rows(kernels::to_luma::<3, 0, 2>));
    set(&mut table, Rgb888, Bgr888, Rows(kernels::swap_rb3));
    set(&mut table, Rgb888, Bgra8888, Rows(kernels::swap_rb_add_alpha));
    set(&mut table, Rgb888, Rgba8888, Rows(kernels::add_alpha));

    set(&mut table, Rgba8888, Gray8, Rows(kernels::to_luma::<4, 0, 2>));
    set(&mut table, Rgba8888, Bgr888, Rows(kernels::swap_rb_drop_alpha));
    set(&mut table, Rgba8888, Bgra8888, Rows(kernels::swap_rb4));
    set(&mut table, Rgba8888, Rgb888, Rows(kernels::drop_alpha));

    set(&mut table, J420, Gray8, Planes(kernels::yuv_to_gray));
    set(&mut table, Nv12, Gray8, Planes(kernels::yuv_to_gray));
    set(&mut table, Nv21, Gray8, Planes(kernels::yuv_to_gray));

    table
}

static CONVERSIONS: Table = build_table();

#[inline]
fn routine(from: PixelFormat, to: PixelFormat) -> Routine {
    CONVERSIONS[from as usize][to as usize]
}

impl PixelFormat {
    /// How converting from `self` to `to` is carried out.
    pub fn conversion_kind(self, to: PixelFormat) -> ConversionKind {
        match routine(self, to) {
            Routine::Identity => ConversionKind::Identity,
            Routine::Unsupported => ConversionKind::Unsupported,
            Routine::Rows(_) | Routine::Planes(_) => ConversionKind::Direct,
        }
    }
}

fn unsupported(from: &'static str, to: &'static str) -> ImageError {
    tracing::error!(from, to, "unsupported conversion");
    ImageError::UnsupportedConversion { from, to }
}

/// Apply a row kernel to every row of the single-plane source.
fn run_rows(kernel: RowKernel, src: &ImageView<'_>, dst: &mut Image) -> Result<(), KernelError> {
    let src_plane = src.plane(0).ok_or(KernelError::MissingPlane(0))?;
    let mut dst_plane = dst.plane_mut(0).ok_or(KernelError::MissingPlane(0))?;
    if src_plane.row_bytes() == 0 {
        return Ok(());
    }
    for y in 0..src_plane.rows() {
        kernel(src_plane.row(y), dst_plane.row_mut(y))?;
    }
    Ok(())
}

fn run(
    src: &ImageView<'_>,
    to: PixelFormat,
    kernel: impl FnOnce(&ImageView<'_>, &mut Image) -> Result<(), KernelError>,
) -> Result<Image, ImageError> {
    let from = src.format();
    let mut dst = Image::new(src.width(), src.height(), to, src.orientation())?;
    if let Err(source) = kernel(src, &mut dst) {
        tracing::error!(from = from.name(), to = to.name(), %source, "conversion failed");
        return Err(ImageError::Conversion {
            from: from.name(),
            to: to.name(),
            source,
        });
    }
    tracing::debug!(
        from = from.name(),
        to = to.name(),
        width = src.width(),
        height = src.height(),
        "converted"
    );
    Ok(dst)
}

/// Convert `src` into a new image of format `to`.
///
/// The source is only read. The result is tightly packed, has the source's
/// width, height and orientation, and is the only allocation made.
///
/// # Errors
///
/// [`ImageError::UnsupportedConversion`] if the table has no routine for the
/// pair, [`ImageError::Allocation`] if the destination cannot be allocated,
/// or [`ImageError::Conversion`] if a kernel rejects the data.
pub fn convert(src: &ImageView<'_>, to: PixelFormat) -> Result<Image, ImageError> {
    match routine(src.format(), to) {
        Routine::Identity => src.to_image(),
        Routine::Unsupported => Err(unsupported(src.format().name(), to.name())),
        Routine::Rows(kernel) => run(src, to, |src, dst| run_rows(kernel, src, dst)),
        Routine::Planes(kernel) => run(src, to, kernel),
    }
}

/// [`convert`] addressed by a raw format code. Codes whose id names no
/// format are unsupported.
pub fn convert_code(src: &ImageView<'_>, to: FormatCode) -> Result<Image, ImageError> {
    match to.format() {
        Some(format) => convert(src, format),
        None => Err(unsupported(src.format().name(), to.name())),
    }
}

impl ImageView<'_> {
    /// See [`convert`](crate::convert()).
    pub fn convert(&self, to: PixelFormat) -> Result<Image, ImageError> {
        convert(self, to)
    }
}

impl Image {
    /// See [`convert`](crate::convert()).
    pub fn convert(&self, to: PixelFormat) -> Result<Image, ImageError> {
        convert(&self.as_view(), to)
    }

    /// Convert this image to `to`, replacing its contents.
    ///
    /// R↔B swaps between same-sized formats (RGB↔BGR, RGBA↔BGRA) rewrite
    /// the existing storage. Everything else converts into a new buffer that
    /// then replaces this one. On error the image is left unchanged.
    pub fn convert_in_place(&mut self, to: PixelFormat) -> Result<(), ImageError> {
        use PixelFormat::{Bgr888, Bgra8888, Rgb888, Rgba8888};

        let from = self.format();
        let swap: fn(&mut [u8]) -> Result<(), garb::SizeError> = match (from, to) {
            _ if from == to => return Ok(()),
            (Rgb888, Bgr888) | (Bgr888, Rgb888) => garb::bytes::rgb_to_bgr_inplace,
            (Rgba8888, Bgra8888) | (Bgra8888, Rgba8888) => garb::bytes::rgba_to_bgra_inplace,
            _ => {
                let converted = self.convert(to)?;
                *self = converted;
                return Ok(());
            }
        };

        if let Some(mut plane) = self.plane_mut(0)
            && plane.row_bytes() > 0
        {
            for y in 0..plane.rows() {
                // Rows are whole pixels, so the swap cannot be rejected.
                swap(plane.row_mut(y)).map_err(|_| ImageError::Conversion {
                    from: from.name(),
                    to: to.name(),
                    source: KernelError::RowSize,
                })?;
            }
        }
        let (width, height, orientation) = (self.width(), self.height(), self.orientation());
        self.reshape(width, height, to, orientation);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Orientation;
    use alloc::vec;
    use alloc::vec::Vec;

    fn image_from(format: PixelFormat, width: u32, height: u32, bytes: &[u8]) -> Image {
        Image::from_vec(bytes.to_vec(), width, height, format, Orientation::Normal).unwrap()
    }

    #[test]
    fn table_shape() {
        use ConversionKind::{Direct as D, Identity as I, Unsupported as U};
        let expected = [
            [I, D, D, D, D, D, D, D],
            [D, I, D, D, D, U, U, U],
            [D, D, I, D, D, U, U, U],
            [D, D, D, I, D, U, U, U],
            [D, D, D, D, I, U, U, U],
            [D, U, U, U, U, I, U, U],
            [D, U, U, U, U, U, I, U],
            [D, U, U, U, U, U, U, I],
        ];
        for from in PixelFormat::ALL {
            for to in PixelFormat::ALL {
                assert_eq!(
                    from.conversion_kind(to),
                    expected[from.id() as usize][to.id() as usize],
                    "{from} -> {to}"
                );
            }
        }
    }

    #[test]
    fn identity_is_a_deep_copy() {
        let src = image_from(PixelFormat::Nv21, 2, 2, &[1, 2, 3, 4, 5, 6]);
        let out = src.convert(PixelFormat::Nv21).unwrap();
        assert_eq!(out, src);
        assert_eq!(out.capacity(), out.size());
    }

    #[test]
    fn gray_to_bgr_and_back() {
        let gray: Vec<u8> = (0..16).map(|i| i * 16).collect();
        let src = image_from(PixelFormat::Gray8, 4, 4, &gray);
        let bgr = src.convert(PixelFormat::Bgr888).unwrap();
        assert_eq!(bgr.size(), 48);
        assert_eq!(bgr.capacity(), 48);
        assert_eq!(&bgr.as_bytes()[..6], &[0, 0, 0, 16, 16, 16]);

        let back = bgr.convert(PixelFormat::Gray8).unwrap();
        assert_eq!(back.as_bytes(), src.as_bytes());
        assert_eq!(back, src);
    }

    #[test]
    fn bgr_rgb_involution() {
        let bytes: Vec<u8> = (0..36).collect();
        let bgr = image_from(PixelFormat::Bgr888, 3, 4, &bytes);
        let rgb = bgr.convert(PixelFormat::Rgb888).unwrap();
        assert_eq!(&rgb.as_bytes()[..3], &[2, 1, 0]);
        assert_eq!(rgb.convert(PixelFormat::Bgr888).unwrap(), bgr);
    }

    #[test]
    fn alpha_conversions() {
        let rgb = image_from(PixelFormat::Rgb888, 2, 1, &[10, 20, 30, 40, 50, 60]);
        let bgra = rgb.convert(PixelFormat::Bgra8888).unwrap();
        assert_eq!(bgra.as_bytes(), &[30, 20, 10, 255, 60, 50, 40, 255]);
        let rgba = bgra.convert(PixelFormat::Rgba8888).unwrap();
        assert_eq!(rgba.as_bytes(), &[10, 20, 30, 255, 40, 50, 60, 255]);
        let bgr = rgba.convert(PixelFormat::Bgr888).unwrap();
        assert_eq!(bgr.as_bytes(), &[30, 20, 10, 60, 50, 40]);
        let gray = rgba.convert(PixelFormat::Gray8).unwrap();
        assert_eq!(gray.as_bytes(), &[luma(10, 20, 30), luma(40, 50, 60)]);
        let gray_from_bgra = bgra.convert(PixelFormat::Gray8).unwrap();
        assert_eq!(gray_from_bgra, gray);
    }

    #[test]
    fn gray_to_yuv_has_neutral_chroma() {
        let src = image_from(PixelFormat::Gray8, 2, 2, &[1, 2, 3, 4]);
        for format in [PixelFormat::J420, PixelFormat::Nv12, PixelFormat::Nv21] {
            let yuv = src.convert(format).unwrap();
            assert_eq!(&yuv.as_bytes()[..4], &[1, 2, 3, 4]);
            assert!(yuv.as_bytes()[4..].iter().all(|&b| b == 128), "{format}");
            assert_eq!(yuv.convert(PixelFormat::Gray8).unwrap(), src);
        }
    }

    #[test]
    fn odd_sized_yuv_chroma_is_fully_neutral() {
        let src = image_from(PixelFormat::Gray8, 3, 3, &[7; 9]);
        for format in [PixelFormat::J420, PixelFormat::Nv12, PixelFormat::Nv21] {
            let yuv = src.convert(format).unwrap();
            assert!(yuv.as_bytes()[9..].iter().all(|&b| b == 128), "{format}");
        }
    }

    #[test]
    fn failing_kernel_reports_the_pair() {
        let src = image_from(PixelFormat::Gray8, 2, 1, &[1, 2]);
        let result = run(&src.as_view(), PixelFormat::Rgb888, |_, _| Err(KernelError::RowSize));
        assert!(matches!(
            result,
            Err(ImageError::Conversion {
                from: "GRAY",
                to: "RGB",
                source: KernelError::RowSize,
            })
        ));
    }

    #[test]
    fn unsupported_pairs() {
        let src = Image::new(4, 4, PixelFormat::J420, Orientation::Normal).unwrap();
        let err = src.convert(PixelFormat::Nv12).unwrap_err();
        assert!(matches!(
            err,
            ImageError::UnsupportedConversion {
                from: "J420",
                to: "NV12"
            }
        ));
        let rgb = Image::new(2, 2, PixelFormat::Rgb888, Orientation::Normal).unwrap();
        assert!(rgb.convert(PixelFormat::Nv21).is_err());
    }

    #[test]
    fn unknown_code_is_unsupported() {
        let src = Image::new(2, 2, PixelFormat::Gray8, Orientation::Normal).unwrap();
        let err = convert_code(&src.as_view(), FormatCode::new(12, 8, 0, 0)).unwrap_err();
        assert!(matches!(
            err,
            ImageError::UnsupportedConversion {
                from: "GRAY",
                to: "Unknown Pixel Format"
            }
        ));
        let ok = convert_code(&src.as_view(), PixelFormat::Rgba8888.code()).unwrap();
        assert_eq!(ok.format(), PixelFormat::Rgba8888);
    }

    #[test]
    fn orientation_is_carried() {
        let src = Image::new(3, 2, PixelFormat::Rgb888, Orientation::Transverse).unwrap();
        for to in PixelFormat::ALL {
            if let Ok(out) = src.convert(to) {
                assert_eq!(out.orientation(), Orientation::Transverse);
                assert_eq!((out.width(), out.height()), (3, 2));
            }
        }
    }

    #[test]
    fn converts_strided_regions() {
        let bytes: Vec<u8> = (0..48).collect();
        let src = image_from(PixelFormat::Rgb888, 4, 4, &bytes);
        let roi = src.region(1, 1, 2, 2);
        let bgr = roi.convert(PixelFormat::Bgr888).unwrap();
        assert_eq!(bgr.as_bytes(), &[17, 16, 15, 20, 19, 18, 29, 28, 27, 32, 31, 30]);
    }

    #[test]
    fn zero_sized_images_convert() {
        let src = Image::new(0, 3, PixelFormat::Gray8, Orientation::Normal).unwrap();
        let out = src.convert(PixelFormat::Rgba8888).unwrap();
        assert_eq!(out.size(), 0);
        assert_eq!(out.height(), 3);
    }

    #[test]
    fn in_place_swaps_reuse_storage() {
        let mut img = Image::from_vec(
            vec![1, 2, 3, 4, 5, 6, 7, 8, 0, 0],
            2,
            1,
            PixelFormat::Rgba8888,
            Orientation::Normal,
        )
        .unwrap();
        img.convert_in_place(PixelFormat::Bgra8888).unwrap();
        assert_eq!(img.format(), PixelFormat::Bgra8888);
        assert_eq!(img.capacity(), 10);
        assert_eq!(img.as_bytes(), &[3, 2, 1, 4, 7, 6, 5, 8]);

        img.convert_in_place(PixelFormat::Gray8).unwrap();
        assert_eq!(img.format(), PixelFormat::Gray8);
        assert_eq!(img.capacity(), 2);
    }

    #[test]
    fn failed_in_place_leaves_image_untouched() {
        let mut img = image_from(PixelFormat::Nv12, 2, 2, &[1, 2, 3, 4, 5, 6]);
        let before = img.clone();
        assert!(img.convert_in_place(PixelFormat::Rgb888).is_err());
        assert_eq!(img, before);
    }
}
