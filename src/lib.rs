//! In-memory images in eight fixed pixel layouts.
//!
//! - [`PixelFormat`] / [`FormatCode`]: layout descriptors (`GRAY`, `BGR`,
//!   `BGRA`, `RGB`, `RGBA`, `J420`, `NV12`, `NV21`) and their packed form
//! - [`Image`]: owning buffer, planes packed back to back
//! - [`ImageView`]: borrowed view, including zero-copy sub-regions
//! - [`convert()`]: table-driven conversion between formats
//! - [`CodecRegistry`]: decode and encode files (binary PNM built in)
//! - [`Limits`]: resource limits applied before decoding allocates
//!
//! ```
//! use zenplanes::{Image, Orientation, PixelFormat};
//!
//! let gray = Image::new(4, 4, PixelFormat::Gray8, Orientation::Normal)?;
//! let bgr = gray.convert(PixelFormat::Bgr888)?;
//! assert_eq!(bgr.size(), 48);
//!
//! let corner = bgr.region(2, 2, 2, 2);
//! assert_eq!(corner.capacity(), 0);
//! assert_eq!(corner.to_image()?.size(), 12);
//! # Ok::<(), zenplanes::ImageError>(())
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

mod codec;
mod convert;
mod error;
mod format;
mod image;
mod limits;
mod orientation;
mod view;

#[cfg(feature = "std")]
pub use codec::{imread, imwrite};
pub use codec::{CodecError, CodecRegistry, ImageDecoder, ImageEncoder, PnmDecoder, PnmEncoder};
pub use convert::{ConversionKind, convert, convert_code, luma};
pub use error::{ImageError, KernelError};
pub use format::{FormatCode, MAX_PLANES, PixelFormat, PlaneSpec, UNKNOWN_FORMAT_NAME};
pub use image::Image;
pub use limits::{LimitExceeded, Limits};
pub use orientation::{InvalidOrientation, Orientation};
pub use view::{ImageView, PlaneSlice, PlaneSliceMut};

// Re-exports for codec implementors and users.
pub use enough::{Stop, StopReason, Unstoppable};
pub use imgref::{Img, ImgRef};
pub use rgb;
