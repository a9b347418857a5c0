//! Error types for qrgate.

use thiserror::Error;

/// qrgate error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Uploaded bytes could not be parsed as an image.
    #[error("Image decode error: {0}")]
    ImageDecode(#[source] image::ImageError),

    /// A generated symbol could not be written as PNG.
    #[error("Image encode error: {0}")]
    ImageEncode(#[source] image::ImageError),

    /// The payload could not be turned into a QR symbol (e.g. too long).
    #[error("QR encode error: {0}")]
    QrEncode(String),
}

/// Result type alias for qrgate.
pub type Result<T, E = Error> = std::result::Result<T, E>;
