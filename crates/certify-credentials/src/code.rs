//! Verification codes: QR codes carrying a verification URL, rendered as
//! PNG images and embedded as `data:` URIs.
//!
//! Encoding is deterministic: the same URL and options always produce the
//! same artifact. Input is never truncated; a URL that does not fit is an
//! error.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::{GrayImage, ImageFormat, Luma};
use qrcode::{Color, EcLevel, QrCode};
use std::io::Cursor;

/// Prefix of every artifact produced by [`VerificationCodeEncoder`].
pub const DATA_URI_PREFIX: &str = "data:image/png;base64,";

/// Default rendered image width in pixels.
pub const DEFAULT_WIDTH: u32 = 300;
/// Default quiet zone around the code, in modules.
pub const DEFAULT_MARGIN: u32 = 1;
/// Largest accepted image width.
pub const MAX_WIDTH: u32 = 2048;
/// Smallest accepted quiet zone. Scanners cannot locate finder patterns
/// that touch the image edge.
pub const MIN_MARGIN: u32 = 1;
/// Largest accepted quiet zone.
pub const MAX_MARGIN: u32 = 16;
/// Fewest pixels per module. Narrower modules do not survive scanning.
pub const MIN_PX_PER_MODULE: u32 = 4;

const DARK: u8 = 0;
const LIGHT: u8 = 255;

/// Verification code encoding errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodingError {
    #[error("verification URL is empty")]
    EmptyInput,

    #[error("unsupported character {0:?} in verification URL")]
    UnsupportedCharacter(char),

    #[error("verification URL of {0} bytes exceeds QR code capacity")]
    CapacityExceeded(usize),

    #[error("invalid code options: {0}")]
    InvalidOptions(String),

    #[error("QR encoding failed: {0}")]
    Qr(String),

    #[error("PNG encoding failed: {0}")]
    Image(String),
}

/// Artifact decoding errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("artifact is not a PNG data URI")]
    NotDataUri,

    #[error("base64 decoding failed: {0}")]
    Base64(String),

    #[error("image decoding failed: {0}")]
    Image(String),

    #[error("no QR code found in image")]
    NoCode,

    #[error("QR decoding failed: {0}")]
    Qr(String),
}

/// Rendering options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeOptions {
    /// Output image width (and height) in pixels. Raised when the code
    /// would otherwise get fewer than [`MIN_PX_PER_MODULE`] pixels per
    /// module.
    pub width: u32,
    /// Light border around the code, in modules.
    pub margin: u32,
}

impl Default for CodeOptions {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            margin: DEFAULT_MARGIN,
        }
    }
}

impl CodeOptions {
    pub fn new(width: u32, margin: u32) -> Result<Self, EncodingError> {
        let options = Self { width, margin };
        options.validate()?;
        Ok(options)
    }

    fn validate(&self) -> Result<(), EncodingError> {
        if self.width > MAX_WIDTH {
            return Err(EncodingError::InvalidOptions(format!(
                "width {} exceeds maximum {}",
                self.width, MAX_WIDTH
            )));
        }
        if !(MIN_MARGIN..=MAX_MARGIN).contains(&self.margin) {
            return Err(EncodingError::InvalidOptions(format!(
                "margin {} outside {}..={}",
                self.margin, MIN_MARGIN, MAX_MARGIN
            )));
        }
        Ok(())
    }
}

/// Renders verification URLs into embeddable QR code images.
#[derive(Debug, Clone, Copy, Default)]
pub struct VerificationCodeEncoder {
    options: CodeOptions,
}

impl VerificationCodeEncoder {
    pub fn new(options: CodeOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> CodeOptions {
        self.options
    }

    /// Encode `url` as a PNG data URI.
    pub fn encode(&self, url: &str) -> Result<String, EncodingError> {
        let png = self.encode_png(url)?;
        Ok(format!("{}{}", DATA_URI_PREFIX, STANDARD.encode(png)))
    }

    /// Encode `url` as raw PNG bytes.
    pub fn encode_png(&self, url: &str) -> Result<Vec<u8>, EncodingError> {
        self.options.validate()?;
        check_charset(url)?;

        let code = QrCode::with_error_correction_level(url.as_bytes(), EcLevel::M).map_err(
            |e| match e {
                qrcode::types::QrError::DataTooLong => EncodingError::CapacityExceeded(url.len()),
                other => EncodingError::Qr(other.to_string()),
            },
        )?;

        let image = render(&code, self.options);
        let mut png = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .map_err(|e| EncodingError::Image(e.to_string()))?;
        Ok(png)
    }
}

/// Printable ASCII only; anything else would not survive a round trip
/// through URL-aware scanners unchanged.
fn check_charset(url: &str) -> Result<(), EncodingError> {
    if url.is_empty() {
        return Err(EncodingError::EmptyInput);
    }
    match url.chars().find(|c| !c.is_ascii_graphic()) {
        Some(c) => Err(EncodingError::UnsupportedCharacter(c)),
        None => Ok(()),
    }
}

/// Draw the module grid (plus quiet zone) at a whole number of pixels
/// per module, centred on a light square of at least `options.width`
/// pixels.
fn render(code: &QrCode, options: CodeOptions) -> GrayImage {
    let modules = code.width() as u32;
    let total = modules + 2 * options.margin;
    let scale = (options.width / total).max(MIN_PX_PER_MODULE);
    let grid = scale * total;
    let size = options.width.max(grid);
    let start = (size - grid) / 2 + options.margin * scale;
    let span = start..start + modules * scale;

    GrayImage::from_fn(size, size, |px, py| {
        let inside = span.contains(&px) && span.contains(&py);
        if inside {
            let mx = ((px - start) / scale) as usize;
            let my = ((py - start) / scale) as usize;
            if code[(mx, my)] == Color::Dark {
                return Luma([DARK]);
            }
        }
        Luma([LIGHT])
    })
}

/// Extract the raw PNG bytes from an artifact.
pub fn artifact_png(artifact: &str) -> Result<Vec<u8>, DecodeError> {
    let payload = artifact
        .strip_prefix(DATA_URI_PREFIX)
        .ok_or(DecodeError::NotDataUri)?;
    STANDARD
        .decode(payload)
        .map_err(|e| DecodeError::Base64(e.to_string()))
}

/// Decode a PNG data URI artifact back into the URL it carries.
pub fn decode_artifact(artifact: &str) -> Result<String, DecodeError> {
    decode_png(&artifact_png(artifact)?)
}

/// Scan a PNG image and return the contents of the first QR code found.
pub fn decode_png(png: &[u8]) -> Result<String, DecodeError> {
    let image = image::load_from_memory(png)
        .map_err(|e| DecodeError::Image(e.to_string()))?
        .to_luma8();

    let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
        image.width() as usize,
        image.height() as usize,
        |x, y| image.get_pixel(x as u32, y as u32).0[0],
    );
    let grids = prepared.detect_grids();
    let grid = grids.first().ok_or(DecodeError::NoCode)?;
    let (_meta, content) = grid
        .decode()
        .map_err(|e| DecodeError::Qr(format!("{:?}", e)))?;
    Ok(content)
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "http://localhost:3000/verify?id=0b5e9f3c-8a44-4d7e-9a3f-2c1d6b7e8f90";

    #[test]
    fn test_encode_round_trip() {
        let encoder = VerificationCodeEncoder::default();
        let artifact = encoder.encode(URL).unwrap();
        assert!(artifact.starts_with(DATA_URI_PREFIX));
        assert_eq!(decode_artifact(&artifact).unwrap(), URL);
    }

    #[test]
    fn test_encode_deterministic() {
        let encoder = VerificationCodeEncoder::default();
        assert_eq!(encoder.encode(URL).unwrap(), encoder.encode(URL).unwrap());
    }

    #[test]
    fn test_image_has_requested_width() {
        let encoder = VerificationCodeEncoder::new(CodeOptions::new(300, 1).unwrap());
        let png = encoder.encode_png(URL).unwrap();
        let image = image::load_from_memory(&png).unwrap();
        assert_eq!(image.width(), 300);
        assert_eq!(image.height(), 300);
    }

    #[test]
    fn test_custom_options_round_trip() {
        let encoder = VerificationCodeEncoder::new(CodeOptions::new(512, 4).unwrap());
        let artifact = encoder.encode(URL).unwrap();
        assert_eq!(decode_artifact(&artifact).unwrap(), URL);
    }

    #[test]
    fn test_tiny_width_grows_to_minimum_scale() {
        let encoder = VerificationCodeEncoder::new(CodeOptions::new(10, 1).unwrap());
        let png = encoder.encode_png(URL).unwrap();
        let modules = QrCode::with_error_correction_level(URL.as_bytes(), EcLevel::M)
            .unwrap()
            .width() as u32;
        let image = image::load_from_memory(&png).unwrap();
        assert_eq!(image.width(), (modules + 2) * MIN_PX_PER_MODULE);
        assert_eq!(decode_png(&png).unwrap(), URL);
    }

    #[test]
    fn test_round_trip_across_widths_and_margins() {
        let mut failures = Vec::new();
        for width in (30..=700).step_by(13) {
            for margin in MIN_MARGIN..=4 {
                let encoder = VerificationCodeEncoder::new(CodeOptions::new(width, margin).unwrap());
                let artifact = encoder.encode(URL).unwrap();
                match decode_artifact(&artifact) {
                    Ok(decoded) if decoded == URL => {}
                    other => failures.push((width, margin, other)),
                }
            }
        }
        assert!(failures.is_empty(), "undecodable artifacts: {:?}", failures);
    }

    #[test]
    fn test_modules_are_whole_pixels() {
        let encoder = VerificationCodeEncoder::new(CodeOptions::new(186, 4).unwrap());
        let png = encoder.encode_png(URL).unwrap();
        let image = image::load_from_memory(&png).unwrap().to_luma8();
        let code = QrCode::with_error_correction_level(URL.as_bytes(), EcLevel::M).unwrap();
        let total = code.width() as u32 + 8;
        let scale = (186 / total).max(MIN_PX_PER_MODULE);
        let start = (image.width() - scale * total) / 2 + 4 * scale;

        // Every pixel of the top-left finder pattern's outer ring is dark.
        for offset in 0..7 * scale {
            assert_eq!(image.get_pixel(start + offset, start).0[0], DARK);
            assert_eq!(image.get_pixel(start, start + offset).0[0], DARK);
        }
        assert_eq!(image.get_pixel(start - 1, start).0[0], LIGHT);
    }

    #[test]
    fn test_corners_are_quiet_zone() {
        let encoder = VerificationCodeEncoder::default();
        let png = encoder.encode_png(URL).unwrap();
        let image = image::load_from_memory(&png).unwrap().to_luma8();
        assert_eq!(image.get_pixel(0, 0).0[0], LIGHT);
        assert_eq!(image.get_pixel(299, 299).0[0], LIGHT);
    }

    #[test]
    fn test_capacity_exceeded() {
        let encoder = VerificationCodeEncoder::default();
        let long = format!("http://example.org/verify?id={}", "a".repeat(4000));
        assert!(matches!(
            encoder.encode(&long),
            Err(EncodingError::CapacityExceeded(n)) if n == long.len()
        ));
    }

    #[test]
    fn test_rejects_non_ascii() {
        let encoder = VerificationCodeEncoder::default();
        assert_eq!(
            encoder.encode("http://example.org/verify?id=é"),
            Err(EncodingError::UnsupportedCharacter('é'))
        );
    }

    #[test]
    fn test_rejects_whitespace() {
        let encoder = VerificationCodeEncoder::default();
        assert_eq!(
            encoder.encode("http://example.org/verify?id=a b"),
            Err(EncodingError::UnsupportedCharacter(' '))
        );
    }

    #[test]
    fn test_rejects_empty() {
        let encoder = VerificationCodeEncoder::default();
        assert_eq!(encoder.encode(""), Err(EncodingError::EmptyInput));
    }

    #[test]
    fn test_invalid_options() {
        assert!(CodeOptions::new(MAX_WIDTH + 1, 1).is_err());
        assert!(CodeOptions::new(300, MAX_MARGIN + 1).is_err());
        assert!(CodeOptions::new(300, 0).is_err());
    }

    #[test]
    fn test_decode_rejects_foreign_uri() {
        assert_eq!(
            decode_artifact("data:text/plain,hello"),
            Err(DecodeError::NotDataUri)
        );
    }

    #[test]
    fn test_decode_rejects_bad_base64() {
        assert!(matches!(
            decode_artifact("data:image/png;base64,!!!"),
            Err(DecodeError::Base64(_))
        ));
    }

    #[test]
    fn test_artifact_png_matches_encode_png() {
        let encoder = VerificationCodeEncoder::default();
        let artifact = encoder.encode(URL).unwrap();
        assert_eq!(artifact_png(&artifact).unwrap(), encoder.encode_png(URL).unwrap());
    }

    #[test]
    fn test_decode_blank_image() {
        let blank = GrayImage::from_pixel(64, 64, Luma([LIGHT]));
        let mut png = Vec::new();
        blank
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .unwrap();
        assert_eq!(decode_png(&png), Err(DecodeError::NoCode));
    }
}
