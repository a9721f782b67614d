use thiserror::Error;

use crate::video::format::PixelFormat;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Unsupported conversion: {src} → {dst}")]
    UnsupportedConversion { src: PixelFormat, dst: PixelFormat },

    #[error("In-place conversion not supported: {src} → {dst}")]
    InPlaceUnsupported { src: PixelFormat, dst: PixelFormat },

    #[error("{what} buffer too small: {actual} < {needed}")]
    BufferTooSmall {
        what: &'static str,
        needed: usize,
        actual: usize,
    },

    #[error("Format mismatch: expected {expected}, got {actual}")]
    FormatMismatch { expected: String, actual: String },

    #[error("Invalid dimensions for {format}: {width}x{height}")]
    InvalidDimensions {
        format: PixelFormat,
        width: u32,
        height: u32,
    },

    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("TOML write error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = AppError::UnsupportedConversion {
            src: PixelFormat::Rgb,
            dst: PixelFormat::Rgb565,
        };
        assert_eq!(err.to_string(), "Unsupported conversion: RGB → RGB565");

        let err = AppError::BufferTooSmall {
            what: "Output",
            needed: 12,
            actual: 4,
        };
        assert_eq!(err.to_string(), "Output buffer too small: 4 < 12");
    }
}
