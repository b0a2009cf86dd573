//! Binary PNM: P5 (PGM), P6 (PPM) and P7 (PAM), 8 bits per sample.

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use enough::Stop;

use super::{CodecError, ImageDecoder, ImageEncoder};
use crate::{Image, ImageView, Limits, Orientation, PixelFormat};

/// Rows copied between cancellation checks.
const ROWS_PER_CHECK: usize = 16;

/// Parsed header (internal).
#[derive(Debug, PartialEq, Eq)]
struct PnmHeader {
    width: u32,
    height: u32,
    format: PixelFormat,
    data_offset: usize,
}

// ---------------------------------------------------------------------------
// Header parsing
// ---------------------------------------------------------------------------

struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn skip_whitespace_and_comments(&mut self) {
        while let Some(&c) = self.data.get(self.pos) {
            if c == b'#' {
                while let Some(&c) = self.data.get(self.pos) {
                    self.pos += 1;
                    if c == b'\n' {
                        break;
                    }
                }
            } else if c.is_ascii_whitespace() {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn number(&mut self, what: &str) -> Result<u32, CodecError> {
        self.skip_whitespace_and_comments();
        let start = self.pos;
        while self.data.get(self.pos).is_some_and(u8::is_ascii_digit) {
            self.pos += 1;
        }
        if start == self.pos {
            return Err(if self.pos >= self.data.len() {
                CodecError::UnexpectedEof
            } else {
                CodecError::InvalidHeader(format!("expected {what}"))
            });
        }
        parse_u32(&self.data[start..self.pos], what)
    }

    /// Next line without its terminator, or `None` at end of input.
    fn line(&mut self) -> Option<&'a [u8]> {
        let data = self.data;
        let rest = data.get(self.pos..).filter(|r| !r.is_empty())?;
        let len = rest.iter().position(|&c| c == b'\n');
        self.pos += len.map_or(rest.len(), |n| n + 1);
        Some(&rest[..len.unwrap_or(rest.len())])
    }
}

fn parse_u32(digits: &[u8], what: &str) -> Result<u32, CodecError> {
    core::str::from_utf8(digits)
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| CodecError::InvalidHeader(format!("{what} out of range")))
}

fn parse_header(data: &[u8]) -> Result<PnmHeader, CodecError> {
    let magic = data.get(..2).ok_or(CodecError::UnexpectedEof)?;
    let mut cursor = Cursor { data, pos: 2 };
    let (width, height, maxval, format) = match magic {
        b"P5" | b"P6" => {
            let width = cursor.number("width")?;
            let height = cursor.number("height")?;
            let maxval = cursor.number("maxval")?;
            // exactly one whitespace byte separates the header from the pixels
            match data.get(cursor.pos) {
                Some(c) if c.is_ascii_whitespace() => cursor.pos += 1,
                Some(_) => {
                    return Err(CodecError::InvalidHeader(
                        "missing whitespace after maxval".into(),
                    ));
                }
                None => return Err(CodecError::UnexpectedEof),
            }
            let format = if magic == b"P5" {
                PixelFormat::Gray8
            } else {
                PixelFormat::Rgb888
            };
            (width, height, maxval, format)
        }
        b"P7" => parse_pam(&mut cursor)?,
        _ => return Err(CodecError::UnrecognizedFormat),
    };

    if width == 0 || height == 0 {
        return Err(CodecError::InvalidHeader(format!(
            "zero dimension {width}x{height}"
        )));
    }
    if maxval != 255 {
        return Err(CodecError::UnsupportedVariant(format!(
            "maxval {maxval} (only 255 is supported)"
        )));
    }

    Ok(PnmHeader {
        width,
        height,
        format,
        data_offset: cursor.pos,
    })
}

fn parse_pam(cursor: &mut Cursor<'_>) -> Result<(u32, u32, u32, PixelFormat), CodecError> {
    let mut width = None;
    let mut height = None;
    let mut depth = None;
    let mut maxval = None;
    let mut tupltype: Option<String> = None;

    loop {
        let line = cursor.line().ok_or(CodecError::UnexpectedEof)?;
        let line = core::str::from_utf8(line)
            .map_err(|_| CodecError::InvalidHeader("non-ASCII PAM header".into()))?
            .trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if line == "ENDHDR" {
            break;
        }
        let (key, value) = line
            .split_once(char::is_whitespace)
            .map(|(k, v)| (k, v.trim()))
            .ok_or_else(|| CodecError::InvalidHeader(format!("malformed PAM line {line:?}")))?;
        match key {
            "WIDTH" => width = Some(parse_u32(value.as_bytes(), "width")?),
            "HEIGHT" => height = Some(parse_u32(value.as_bytes(), "height")?),
            "DEPTH" => depth = Some(parse_u32(value.as_bytes(), "depth")?),
            "MAXVAL" => maxval = Some(parse_u32(value.as_bytes(), "maxval")?),
            "TUPLTYPE" => tupltype = Some(value.into()),
            _ => {
                return Err(CodecError::InvalidHeader(format!(
                    "unknown PAM header field {key:?}"
                )));
            }
        }
    }

    let missing = |field: &str| CodecError::InvalidHeader(format!("PAM header lacks {field}"));
    let width = width.ok_or_else(|| missing("WIDTH"))?;
    let height = height.ok_or_else(|| missing("HEIGHT"))?;
    let depth = depth.ok_or_else(|| missing("DEPTH"))?;
    let maxval = maxval.ok_or_else(|| missing("MAXVAL"))?;

    let format = match (depth, tupltype.as_deref()) {
        (1, None | Some("GRAYSCALE")) => PixelFormat::Gray8,
        (3, None | Some("RGB")) => PixelFormat::Rgb888,
        (4, None | Some("RGB_ALPHA")) => PixelFormat::Rgba8888,
        (depth, tupltype) => {
            return Err(CodecError::UnsupportedVariant(format!(
                "PAM depth {depth} with tuple type {}",
                tupltype.unwrap_or("(none)")
            )));
        }
    };
    Ok((width, height, maxval, format))
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// Decoder for binary P5, P6 and P7 files with a maxval of 255.
///
/// P5 decodes to `GRAY`, P6 to `RGB`, and P7 to `GRAY`, `RGB` or `RGBA`
/// depending on its depth.
#[derive(Clone, Copy, Debug, Default)]
pub struct PnmDecoder;

impl ImageDecoder for PnmDecoder {
    fn name(&self) -> &'static str {
        "pnm"
    }

    fn signature_len(&self) -> usize {
        2
    }

    fn check_signature(&self, header: &[u8]) -> bool {
        matches!(header, b"P5" | b"P6" | b"P7")
    }

    fn decode(&self, data: &[u8], limits: &Limits, stop: &dyn Stop) -> Result<Image, CodecError> {
        let header = parse_header(data)?;
        limits.check_image(header.width, header.height, header.format)?;
        stop.check()?;

        let size = header.format.image_size(header.width, header.height);
        let pixels = header
            .data_offset
            .checked_add(size)
            .and_then(|end| data.get(header.data_offset..end))
            .ok_or(CodecError::UnexpectedEof)?;

        let mut image = Image::new(
            header.width,
            header.height,
            header.format,
            Orientation::Normal,
        )?;
        if let Some(mut plane) = image.plane_mut(0) {
            for (y, row) in pixels.chunks_exact(plane.row_bytes()).enumerate() {
                if y % ROWS_PER_CHECK == 0 {
                    stop.check()?;
                }
                plane.row_mut(y as u32).copy_from_slice(row);
            }
        }
        Ok(image)
    }
}

// ---------------------------------------------------------------------------
// Encoder
// ---------------------------------------------------------------------------

/// Encoder for binary PNM.
///
/// [`PnmEncoder::new`] writes `GRAY` as P5 and `RGB` as P6, falling back to
/// P7 for `RGBA`. [`PnmEncoder::pam`] always writes P7. `BGR` and `BGRA` are
/// converted to `RGB` and `RGBA` first; YUV layouts are rejected.
#[derive(Clone, Copy, Debug, Default)]
pub struct PnmEncoder {
    pam: bool,
}

impl PnmEncoder {
    pub fn new() -> Self {
        Self { pam: false }
    }

    pub fn pam() -> Self {
        Self { pam: true }
    }

    fn header(&self, image: &ImageView<'_>) -> String {
        let (width, height) = (image.width(), image.height());
        let (depth, tupltype) = match image.format() {
            PixelFormat::Gray8 if !self.pam => return format!("P5\n{width} {height}\n255\n"),
            PixelFormat::Rgb888 if !self.pam => return format!("P6\n{width} {height}\n255\n"),
            PixelFormat::Gray8 => (1, "GRAYSCALE"),
            PixelFormat::Rgb888 => (3, "RGB"),
            _ => (4, "RGB_ALPHA"),
        };
        format!(
            "P7\nWIDTH {width}\nHEIGHT {height}\nDEPTH {depth}\n\
             MAXVAL 255\nTUPLTYPE {tupltype}\nENDHDR\n"
        )
    }
}

impl ImageEncoder for PnmEncoder {
    fn name(&self) -> &'static str {
        if self.pam { "pam" } else { "pnm" }
    }

    fn extensions(&self) -> &'static [&'static str] {
        if self.pam {
            &["pam"]
        } else {
            &["pnm", "pgm", "ppm"]
        }
    }

    fn encode(&self, image: &ImageView<'_>, stop: &dyn Stop) -> Result<Vec<u8>, CodecError> {
        let converted = match image.format() {
            PixelFormat::Gray8 | PixelFormat::Rgb888 | PixelFormat::Rgba8888 => None,
            PixelFormat::Bgr888 => Some(image.convert(PixelFormat::Rgb888)?),
            PixelFormat::Bgra8888 => Some(image.convert(PixelFormat::Rgba8888)?),
            other => return Err(CodecError::UnsupportedFormat(other)),
        };
        let image = converted.as_ref().map_or(*image, Image::as_view);

        stop.check()?;
        let header = self.header(&image);
        let mut out = Vec::with_capacity(header.len() + image.size());
        out.extend_from_slice(header.as_bytes());
        if let Some(plane) = image.plane(0) {
            for (y, row) in plane.iter_rows().enumerate() {
                if y % ROWS_PER_CHECK == 0 {
                    stop.check()?;
                }
                out.extend_from_slice(row);
            }
        }
        Ok(out)
    }
}
