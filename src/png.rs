//! PNG Header Inspection
//!
//! Reads only the signature and the IHDR chunk. No pixel data is decoded.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub const PNG_SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

const CHUNK_TYPE_OFFSET: usize = 12;
const WIDTH_OFFSET: usize = 16;
const HEIGHT_OFFSET: usize = 20;
const BIT_DEPTH_OFFSET: usize = 24;
const COLOR_TYPE_OFFSET: usize = 25;
/// Signature, chunk length, chunk type and the 13-byte IHDR body.
const MIN_HEADER_LEN: usize = 8 + 4 + 4 + 13;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("file is {0} bytes, too short for a PNG header")]
    TooShort(usize),

    #[error("missing PNG signature")]
    BadSignature,

    #[error("first chunk is {0:?}, expected IHDR")]
    MissingIhdr(String),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ColorType {
    Grayscale,
    Rgb,
    Indexed,
    GrayscaleAlpha,
    Rgba,
    Unknown(u8),
}

impl ColorType {
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            0 => ColorType::Grayscale,
            2 => ColorType::Rgb,
            3 => ColorType::Indexed,
            4 => ColorType::GrayscaleAlpha,
            6 => ColorType::Rgba,
            other => ColorType::Unknown(other),
        }
    }

    pub fn code(self) -> u8 {
        match self {
            ColorType::Grayscale => 0,
            ColorType::Rgb => 2,
            ColorType::Indexed => 3,
            ColorType::GrayscaleAlpha => 4,
            ColorType::Rgba => 6,
            ColorType::Unknown(code) => code,
        }
    }

    pub fn has_alpha(self) -> bool {
        matches!(self, ColorType::GrayscaleAlpha | ColorType::Rgba)
    }
}

impl fmt::Display for ColorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColorType::Grayscale => "grayscale",
            ColorType::Rgb => "RGB",
            ColorType::Indexed => "indexed",
            ColorType::GrayscaleAlpha => "grayscale+alpha",
            ColorType::Rgba => "RGB+alpha",
            ColorType::Unknown(_) => "unknown",
        };
        write!(f, "{} ({})", name, self.code())
    }
}

/// Header facts of one PNG file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageAsset {
    pub path: String,
    pub byte_len: usize,
    pub width: u32,
    pub height: u32,
    pub bit_depth: u8,
    pub color_type: ColorType,
}

fn read_u32_be(bytes: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

/// Parses the signature and IHDR chunk of `bytes`.
///
/// IHDR must be the first chunk, so its fields sit at fixed offsets; the chunk
/// type is checked before any of them are trusted.
pub fn load_png(path: impl Into<String>, bytes: &[u8]) -> Result<ImageAsset, DecodeError> {
    if bytes.len() < PNG_SIGNATURE.len() || bytes[..PNG_SIGNATURE.len()] != PNG_SIGNATURE {
        return Err(DecodeError::BadSignature);
    }
    if bytes.len() < MIN_HEADER_LEN {
        return Err(DecodeError::TooShort(bytes.len()));
    }
    let chunk_type = &bytes[CHUNK_TYPE_OFFSET..CHUNK_TYPE_OFFSET + 4];
    if chunk_type != b"IHDR" {
        return Err(DecodeError::MissingIhdr(
            String::from_utf8_lossy(chunk_type).into_owned(),
        ));
    }

    Ok(ImageAsset {
        path: path.into(),
        byte_len: bytes.len(),
        width: read_u32_be(bytes, WIDTH_OFFSET),
        height: read_u32_be(bytes, HEIGHT_OFFSET),
        bit_depth: bytes[BIT_DEPTH_OFFSET],
        color_type: ColorType::from_byte(bytes[COLOR_TYPE_OFFSET]),
    })
}

/// Builds a minimal PNG header (signature, IHDR, zeroed CRC) for fixtures.
#[doc(hidden)]
pub fn synthetic_png(width: u32, height: u32, color_type: u8) -> Vec<u8> {
    let mut bytes = PNG_SIGNATURE.to_vec();
    bytes.extend_from_slice(&13u32.to_be_bytes());
    bytes.extend_from_slice(b"IHDR");
    bytes.extend_from_slice(&width.to_be_bytes());
    bytes.extend_from_slice(&height.to_be_bytes());
    bytes.extend_from_slice(&[8, color_type, 0, 0, 0]);
    bytes.extend_from_slice(&[0, 0, 0, 0]);
    bytes
}
