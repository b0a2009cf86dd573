//! Resource limits applied before pixel storage is allocated.
//!
//! [`Limits`] caps what a decoder may allocate. [`LimitExceeded`] is returned
//! when a check fails. Check right after the header is parsed, before any
//! pixel work.

use crate::PixelFormat;

/// Resource limits for decode operations.
///
/// All fields default to `None` (no limit).
///
/// ```
/// use zenplanes::Limits;
///
/// let limits = Limits::none()
///     .with_max_pixels(16_000_000)
///     .with_max_memory(256 * 1024 * 1024);
/// assert!(limits.has_any());
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[non_exhaustive]
pub struct Limits {
    /// Maximum image width in pixels.
    pub max_width: Option<u32>,
    /// Maximum image height in pixels.
    pub max_height: Option<u32>,
    /// Maximum total pixels (width × height).
    pub max_pixels: Option<u64>,
    /// Maximum pixel storage in bytes.
    pub max_memory_bytes: Option<u64>,
}

impl Limits {
    /// No limits (all fields `None`).
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_max_width(mut self, width: u32) -> Self {
        self.max_width = Some(width);
        self
    }

    pub fn with_max_height(mut self, height: u32) -> Self {
        self.max_height = Some(height);
        self
    }

    pub fn with_max_pixels(mut self, max: u64) -> Self {
        self.max_pixels = Some(max);
        self
    }

    pub fn with_max_memory(mut self, bytes: u64) -> Self {
        self.max_memory_bytes = Some(bytes);
        self
    }

    /// Whether any limits are set.
    pub fn has_any(&self) -> bool {
        self.max_width.is_some()
            || self.max_height.is_some()
            || self.max_pixels.is_some()
            || self.max_memory_bytes.is_some()
    }

    /// Check dimensions against `max_width`, `max_height` and `max_pixels`.
    pub fn check_dimensions(&self, width: u32, height: u32) -> Result<(), LimitExceeded> {
        if let Some(max) = self.max_width
            && width > max
        {
            return Err(LimitExceeded::Width { actual: width, max });
        }
        if let Some(max) = self.max_height
            && height > max
        {
            return Err(LimitExceeded::Height {
                actual: height,
                max,
            });
        }
        if let Some(max) = self.max_pixels {
            let pixels = u64::from(width) * u64::from(height);
            if pixels > max {
                return Err(LimitExceeded::Pixels {
                    actual: pixels,
                    max,
                });
            }
        }
        Ok(())
    }

    /// Check a byte count against `max_memory_bytes`.
    pub fn check_memory(&self, bytes: u64) -> Result<(), LimitExceeded> {
        if let Some(max) = self.max_memory_bytes
            && bytes > max
        {
            return Err(LimitExceeded::Memory { actual: bytes, max });
        }
        Ok(())
    }

    /// Check dimensions, then the storage an image of that shape needs.
    pub fn check_image(
        &self,
        width: u32,
        height: u32,
        format: PixelFormat,
    ) -> Result<(), LimitExceeded> {
        self.check_dimensions(width, height)?;
        let bytes = format
            .checked_image_size(width, height)
            .map_or(u64::MAX, |size| size as u64);
        self.check_memory(bytes)
    }
}

/// A resource limit was exceeded.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum LimitExceeded {
    #[error("width {actual} exceeds limit {max}")]
    Width { actual: u32, max: u32 },

    #[error("height {actual} exceeds limit {max}")]
    Height { actual: u32, max: u32 },

    #[error("pixel count {actual} exceeds limit {max}")]
    Pixels { actual: u64, max: u64 },

    #[error("memory {actual} bytes exceeds limit {max}")]
    Memory { actual: u64, max: u64 },
}
