//! Captured photos and their encoded raster payloads.

use std::fmt;
use std::sync::Arc;

use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::ModelError;

/// Width:height ratio every photo is shown and exported at.
pub const PHOTO_ASPECT: (u32, u32) = (4, 3);

/// Encoding of a raster payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadFormat {
    Jpeg,
    Png,
    Gif,
    Webp,
    Bmp,
}

impl PayloadFormat {
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Gif => "image/gif",
            Self::Webp => "image/webp",
            Self::Bmp => "image/bmp",
        }
    }

    pub fn from_mime_type(mime: &str) -> Option<Self> {
        match mime.trim().to_ascii_lowercase().as_str() {
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/png" => Some(Self::Png),
            "image/gif" => Some(Self::Gif),
            "image/webp" => Some(Self::Webp),
            "image/bmp" => Some(Self::Bmp),
            _ => None,
        }
    }

    /// Detect the format from the leading magic bytes.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        match bytes {
            [0xFF, 0xD8, 0xFF, ..] => Some(Self::Jpeg),
            [0x89, b'P', b'N', b'G', ..] => Some(Self::Png),
            [b'G', b'I', b'F', b'8', ..] => Some(Self::Gif),
            [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => Some(Self::Webp),
            [b'B', b'M', ..] => Some(Self::Bmp),
            _ => None,
        }
    }
}

/// Encoded pixel data of one captured frame. Cloning shares the buffer.
#[derive(Clone, PartialEq, Eq)]
pub struct RasterPayload {
    format: PayloadFormat,
    bytes: Arc<[u8]>,
}

impl RasterPayload {
    /// Wrap encoded bytes, sniffing their format.
    pub fn from_bytes(bytes: impl Into<Arc<[u8]>>) -> Result<Self, ModelError> {
        let bytes: Arc<[u8]> = bytes.into();
        let format = PayloadFormat::sniff(&bytes).ok_or_else(|| ModelError::InvalidPayload {
            reason: "unrecognized image signature".to_string(),
        })?;
        Ok(Self { format, bytes })
    }

    /// Parse a `data:image/<fmt>;base64,<data>` URL, the form camera
    /// screenshots arrive in.
    pub fn from_data_url(url: &str) -> Result<Self, ModelError> {
        let invalid = |reason: &str| ModelError::InvalidPayload {
            reason: reason.to_string(),
        };
        let rest = url
            .trim()
            .strip_prefix("data:")
            .ok_or_else(|| invalid("missing `data:` scheme"))?;
        let (header, data) = rest
            .split_once(',')
            .ok_or_else(|| invalid("missing `,` separator"))?;
        let mime = header
            .strip_suffix(";base64")
            .ok_or_else(|| invalid("only base64 data URLs are supported"))?;
        let declared =
            PayloadFormat::from_mime_type(mime).ok_or_else(|| invalid("unsupported media type"))?;

        let bytes = base64::engine::general_purpose::STANDARD
            .decode(data.trim())
            .map_err(|e| invalid(&format!("bad base64: {e}")))?;

        let payload = Self::from_bytes(bytes)?;
        if payload.format != declared {
            return Err(invalid(&format!(
                "declared {} but data is {}",
                declared.mime_type(),
                payload.format.mime_type()
            )));
        }
        Ok(payload)
    }

    pub fn to_data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.format.mime_type(),
            base64::engine::general_purpose::STANDARD.encode(&self.bytes)
        )
    }

    pub fn format(&self) -> PayloadFormat {
        self.format
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for RasterPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RasterPayload")
            .field("format", &self.format)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// An immutable captured photo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Photo {
    /// 1-based position in the capture round; also the strip position.
    sequence: usize,
    payload: RasterPayload,
}

impl Photo {
    pub fn new(sequence: usize, payload: RasterPayload) -> Self {
        Self { sequence, payload }
    }

    pub fn sequence(&self) -> usize {
        self.sequence
    }

    pub fn payload(&self) -> &RasterPayload {
        &self.payload
    }
}
