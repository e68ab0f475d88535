//! Inbound image payloads and their decoding to raw bytes.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PayloadError {
    #[error("data URL has no ',' separating header and data")]
    MissingComma,
    #[error("invalid base64 encoding: {0}")]
    InvalidBase64(#[from] base64::DecodeError),
    #[error("image data is empty")]
    EmptyData,
    #[error("image data is too large: {size} bytes (max: {max} bytes)")]
    TooLarge { size: usize, max: usize },
}

/// An image as it arrives at the service boundary.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ImagePayload {
    /// `data:image/png;base64,<data>` text, typically a camera capture.
    DataUrl(String),
    /// Raw file bytes from an upload.
    Bytes(Vec<u8>),
}

impl ImagePayload {
    /// Decodes the payload to raw image bytes, rejecting empty or oversized data.
    pub fn into_bytes(self, max_bytes: usize) -> Result<Vec<u8>, PayloadError> {
        let bytes = match self {
            ImagePayload::DataUrl(text) => decode_data_url(&text)?,
            ImagePayload::Bytes(bytes) => bytes,
        };
        if bytes.is_empty() {
            return Err(PayloadError::EmptyData);
        }
        if bytes.len() > max_bytes {
            return Err(PayloadError::TooLarge {
                size: bytes.len(),
                max: max_bytes,
            });
        }
        Ok(bytes)
    }
}

/// Decodes the base64 section after the first `,` of a data URL.
///
/// Only the part after the comma is inspected, so any media type in the
/// header is accepted.
pub fn decode_data_url(text: &str) -> Result<Vec<u8>, PayloadError> {
    let (_, data) = text.split_once(',').ok_or(PayloadError::MissingComma)?;
    let compact: String = data.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    Ok(STANDARD.decode(compact)?)
}
