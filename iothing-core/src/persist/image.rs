//! Settings image header
//!
//! Image layout on the medium:
//! ```text
//! ┌────────┬─────────┬──────────┬─────────┬─────────┬──────────────┐
//! │ MAGIC  │ VERSION │ RESERVED │ LENGTH  │ CRC     │ PAYLOAD      │
//! │ 4B     │ 1B      │ 1B       │ 2B LE   │ 2B LE   │ LENGTH bytes │
//! └────────┴─────────┴──────────┴─────────┴─────────┴──────────────┘
//! ```
//! - PAYLOAD: the active record stream, copied verbatim
//! - CRC: CRC-16/ARC over the payload

use crc::{Crc, CRC_16_ARC};

/// Magic bytes identifying a settings image
pub const IMAGE_MAGIC: [u8; 4] = *b"IOTS";

/// Current image format version
pub const IMAGE_VERSION: u8 = 1;

/// Header size in bytes
pub const HEADER_LEN: usize = 10;

/// Payload checksum
pub const CRC16: Crc<u16> = Crc::<u16>::new(&CRC_16_ARC);

/// Errors that make an image unusable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ImageError {
    /// Magic bytes missing (erased or foreign data)
    BadMagic,
    /// Written by a different format version
    UnsupportedVersion(u8),
    /// Payload longer than the target buffer or the medium
    TooLarge,
    /// Payload does not match its checksum
    CrcMismatch,
}

impl core::fmt::Display for ImageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ImageError::BadMagic => write!(f, "no settings image"),
            ImageError::UnsupportedVersion(v) => write!(f, "unsupported image version {}", v),
            ImageError::TooLarge => write!(f, "image payload too large"),
            ImageError::CrcMismatch => write!(f, "image checksum mismatch"),
        }
    }
}

/// Fixed-size image header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ImageHeader {
    /// Payload length in bytes
    pub len: u16,
    /// CRC-16/ARC of the payload
    pub crc: u16,
}

impl ImageHeader {
    /// Header describing `payload`
    ///
    /// Returns `None` if the payload does not fit the length field.
    pub fn for_payload(payload: &[u8]) -> Option<Self> {
        let len = u16::try_from(payload.len()).ok()?;
        Some(Self {
            len,
            crc: CRC16.checksum(payload),
        })
    }

    pub fn encode(&self) -> [u8; HEADER_LEN] {
        let mut out = [0u8; HEADER_LEN];
        out[0..4].copy_from_slice(&IMAGE_MAGIC);
        out[4] = IMAGE_VERSION;
        out[5] = 0;
        out[6..8].copy_from_slice(&self.len.to_le_bytes());
        out[8..10].copy_from_slice(&self.crc.to_le_bytes());
        out
    }

    /// Parse and check magic and version
    pub fn decode(bytes: &[u8; HEADER_LEN]) -> Result<Self, ImageError> {
        if bytes[0..4] != IMAGE_MAGIC {
            return Err(ImageError::BadMagic);
        }
        if bytes[4] != IMAGE_VERSION {
            return Err(ImageError::UnsupportedVersion(bytes[4]));
        }
        Ok(Self {
            len: u16::from_le_bytes([bytes[6], bytes[7]]),
            crc: u16::from_le_bytes([bytes[8], bytes[9]]),
        })
    }

    pub fn payload_len(&self) -> usize {
        self.len as usize
    }

    /// Check `payload` against the stored checksum
    pub fn verify(&self, payload: &[u8]) -> Result<(), ImageError> {
        if payload.len() != self.payload_len() {
            return Err(ImageError::TooLarge);
        }
        if CRC16.checksum(payload) != self.crc {
            return Err(ImageError::CrcMismatch);
        }
        Ok(())
    }
}
