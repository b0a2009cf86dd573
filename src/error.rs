use crate::PixelFormat;

/// Errors from buffer allocation, wrapping and conversion.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ImageError {
    #[error("failed to allocate {bytes} bytes of pixel storage")]
    Allocation { bytes: usize },

    #[error("dimensions too large: {width}x{height} {format}")]
    DimensionsTooLarge {
        width: u32,
        height: u32,
        format: PixelFormat,
    },

    #[error("buffer too small: need {needed} bytes, got {actual}")]
    BufferTooSmall { needed: usize, actual: usize },

    #[error("plane {plane} stride {stride} is smaller than its {row_bytes}-byte rows")]
    StrideTooSmall {
        plane: usize,
        stride: usize,
        row_bytes: usize,
    },

    #[error("unsupported conversion: {from} => {to}")]
    UnsupportedConversion {
        from: &'static str,
        to: &'static str,
    },

    #[error("{from} => {to} conversion failed: {source}")]
    Conversion {
        from: &'static str,
        to: &'static str,
        #[source]
        source: KernelError,
    },
}

/// Failure reported by a pixel kernel.
///
/// Kernels only fail when the buffers they are handed disagree with the
/// geometry they were asked to process.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum KernelError {
    #[error("row length does not match the pixel geometry")]
    RowSize,

    #[error("plane {0} is missing")]
    MissingPlane(usize),
}
