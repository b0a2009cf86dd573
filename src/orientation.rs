//! EXIF orientation carried alongside pixel data.

use core::fmt;

/// EXIF orientation tag (TIFF tag 274), values 1-8.
///
/// Every buffer records the orientation it was created or decoded with.
/// Conversions, copies and views pass it through untouched; no operation in
/// this crate transforms pixels according to it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Orientation {
    /// Stored upright.
    #[default]
    Normal = 1,
    /// Mirrored left-right.
    FlipHorizontal = 2,
    /// Rotated 180 degrees.
    Rotate180 = 3,
    /// Mirrored top-bottom.
    FlipVertical = 4,
    /// Mirrored left-right, then rotated 270 degrees clockwise.
    Transpose = 5,
    /// Rotated 90 degrees clockwise.
    Rotate90 = 6,
    /// Mirrored left-right, then rotated 90 degrees clockwise.
    Transverse = 7,
    /// Rotated 270 degrees clockwise.
    Rotate270 = 8,
}

/// An EXIF orientation value outside 1-8.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[error("invalid EXIF orientation {0}")]
pub struct InvalidOrientation(pub u16);

impl Orientation {
    /// Create from an EXIF value, falling back to [`Normal`](Self::Normal)
    /// for anything outside 1-8.
    pub fn from_exif(value: u16) -> Self {
        Self::try_from(value).unwrap_or_default()
    }

    /// EXIF tag value (1-8).
    #[inline]
    pub fn exif_value(self) -> u16 {
        self as u16
    }

    /// True for the four orientations that involve a quarter turn.
    pub fn swaps_dimensions(self) -> bool {
        self as u8 >= Self::Transpose as u8
    }

    /// True for the orientations that include a mirror.
    pub fn is_mirrored(self) -> bool {
        matches!(
            self,
            Self::FlipHorizontal | Self::FlipVertical | Self::Transpose | Self::Transverse
        )
    }

    #[inline]
    pub fn is_identity(self) -> bool {
        self == Self::Normal
    }
}

impl TryFrom<u16> for Orientation {
    type Error = InvalidOrientation;

    fn try_from(value: u16) -> Result<Self, InvalidOrientation> {
        Ok(match value {
            1 => Self::Normal,
            2 => Self::FlipHorizontal,
            3 => Self::Rotate180,
            4 => Self::FlipVertical,
            5 => Self::Transpose,
            6 => Self::Rotate90,
            7 => Self::Transverse,
            8 => Self::Rotate270,
            other => return Err(InvalidOrientation(other)),
        })
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.exif_value())
    }
}
