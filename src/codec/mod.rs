//! Decoding and encoding files.
//!
//! A [`CodecRegistry`] holds an ordered list of decoders, chosen by the
//! signature bytes at the start of the data, and an ordered list of encoders,
//! chosen by file extension. The first match wins. Only PNM ships built in;
//! other formats plug in through [`ImageDecoder`] and [`ImageEncoder`].

mod pnm;

pub use pnm::{PnmDecoder, PnmEncoder};

use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;

use enough::{Stop, StopReason};

use crate::{Image, ImageError, ImageView, LimitExceeded, Limits, PixelFormat};

/// Errors from decoding and encoding.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum CodecError {
    #[error("no decoder recognizes the data")]
    UnrecognizedFormat,

    #[error("no encoder for extension {0:?}")]
    NoEncoder(String),

    #[error("invalid header: {0}")]
    InvalidHeader(String),

    #[error("unsupported format variant: {0}")]
    UnsupportedVariant(String),

    #[error("cannot encode {0} images")]
    UnsupportedFormat(PixelFormat),

    #[error("unexpected end of input")]
    UnexpectedEof,

    #[error(transparent)]
    Limit(#[from] LimitExceeded),

    #[error(transparent)]
    Image(#[from] ImageError),

    #[error("operation cancelled")]
    Cancelled(StopReason),

    #[cfg(feature = "std")]
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<StopReason> for CodecError {
    fn from(r: StopReason) -> Self {
        CodecError::Cancelled(r)
    }
}

/// Turns encoded bytes into an [`Image`].
pub trait ImageDecoder: Send + Sync {
    /// Short codec name for logs.
    fn name(&self) -> &'static str;

    /// Number of leading bytes [`check_signature`](Self::check_signature)
    /// needs to see.
    fn signature_len(&self) -> usize;

    /// Whether `header` (exactly [`signature_len`](Self::signature_len)
    /// bytes) starts data this decoder understands.
    fn check_signature(&self, header: &[u8]) -> bool;

    /// Decode `data`. Dimensions and storage are checked against `limits`
    /// before anything is allocated.
    fn decode(&self, data: &[u8], limits: &Limits, stop: &dyn Stop) -> Result<Image, CodecError>;
}

/// Turns an image into encoded bytes.
pub trait ImageEncoder: Send + Sync {
    fn name(&self) -> &'static str;

    /// Lower-case file extensions, without the dot.
    fn extensions(&self) -> &'static [&'static str];

    fn encode(&self, image: &ImageView<'_>, stop: &dyn Stop) -> Result<Vec<u8>, CodecError>;
}

/// Ordered decoder and encoder lists plus the limits applied while decoding.
pub struct CodecRegistry {
    decoders: Vec<Box<dyn ImageDecoder>>,
    encoders: Vec<Box<dyn ImageEncoder>>,
    limits: Limits,
}

impl CodecRegistry {
    /// A registry with the built-in PNM codecs.
    pub fn new() -> Self {
        Self::empty()
            .with_decoder(PnmDecoder)
            .with_encoder(PnmEncoder::new())
            .with_encoder(PnmEncoder::pam())
    }

    /// A registry with no codecs.
    pub fn empty() -> Self {
        Self {
            decoders: Vec::new(),
            encoders: Vec::new(),
            limits: Limits::none(),
        }
    }

    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_decoder(mut self, decoder: impl ImageDecoder + 'static) -> Self {
        self.register_decoder(decoder);
        self
    }

    pub fn with_encoder(mut self, encoder: impl ImageEncoder + 'static) -> Self {
        self.register_encoder(encoder);
        self
    }

    /// Append a decoder. Earlier decoders are tried first.
    pub fn register_decoder(&mut self, decoder: impl ImageDecoder + 'static) {
        self.decoders.push(Box::new(decoder));
    }

    /// Append an encoder. Earlier encoders win ties on extension.
    pub fn register_encoder(&mut self, encoder: impl ImageEncoder + 'static) {
        self.encoders.push(Box::new(encoder));
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// First decoder whose signature matches the start of `data`.
    pub fn find_decoder(&self, data: &[u8]) -> Option<&dyn ImageDecoder> {
        self.decoders
            .iter()
            .find(|d| {
                data.get(..d.signature_len())
                    .is_some_and(|header| d.check_signature(header))
            })
            .map(|d| &**d)
    }

    /// First encoder that claims `extension`. A leading dot and letter case
    /// are ignored.
    pub fn find_encoder(&self, extension: &str) -> Option<&dyn ImageEncoder> {
        let extension = extension.strip_prefix('.').unwrap_or(extension);
        self.encoders
            .iter()
            .find(|e| {
                e.extensions()
                    .iter()
                    .any(|known| known.eq_ignore_ascii_case(extension))
            })
            .map(|e| &**e)
    }

    /// Decode with the first decoder whose signature matches.
    pub fn decode(&self, data: &[u8], stop: &dyn Stop) -> Result<Image, CodecError> {
        let decoder = self
            .find_decoder(data)
            .ok_or(CodecError::UnrecognizedFormat)?;
        tracing::debug!(codec = decoder.name(), bytes = data.len(), "decoding");
        decoder.decode(data, &self.limits, stop)
    }

    /// Encode with the first encoder registered for `extension`.
    pub fn encode(
        &self,
        extension: &str,
        image: &ImageView<'_>,
        stop: &dyn Stop,
    ) -> Result<Vec<u8>, CodecError> {
        let encoder = self
            .find_encoder(extension)
            .ok_or_else(|| CodecError::NoEncoder(extension.into()))?;
        tracing::debug!(
            codec = encoder.name(),
            format = image.format().name(),
            width = image.width(),
            height = image.height(),
            "encoding"
        );
        encoder.encode(image, stop)
    }
}

#[cfg(feature = "std")]
impl CodecRegistry {
    /// Read and decode a file.
    pub fn read(&self, path: impl AsRef<std::path::Path>) -> Result<Image, CodecError> {
        let data = std::fs::read(path)?;
        self.decode(&data, &enough::Unstoppable)
    }

    /// Encode `image` with the encoder for the path's extension and write it.
    pub fn write(
        &self,
        path: impl AsRef<std::path::Path>,
        image: &ImageView<'_>,
    ) -> Result<(), CodecError> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        let bytes = self.encode(extension, image, &enough::Unstoppable)?;
        std::fs::write(path, bytes)?;
        Ok(())
    }
}

impl Default for CodecRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for CodecRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let decoders: Vec<_> = self.decoders.iter().map(|d| d.name()).collect();
        let encoders: Vec<_> = self.encoders.iter().map(|e| e.name()).collect();
        f.debug_struct("CodecRegistry")
            .field("decoders", &decoders)
            .field("encoders", &encoders)
            .field("limits", &self.limits)
            .finish()
    }
}

/// Read an image file with the built-in codecs.
#[cfg(feature = "std")]
pub fn imread(path: impl AsRef<std::path::Path>) -> Result<Image, CodecError> {
    CodecRegistry::default().read(path)
}

/// Write an image file with the built-in codecs, picked by extension.
#[cfg(feature = "std")]
pub fn imwrite(path: impl AsRef<std::path::Path>, image: &ImageView<'_>) -> Result<(), CodecError> {
    CodecRegistry::default().write(path, image)
}
