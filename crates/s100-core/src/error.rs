//! Error types for the S-100 core primitives.

use thiserror::Error;

/// Errors raised by codecs, ciphers, user permits and product identification.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A fixed-width field had the wrong length.
    #[error("{field} must be {expected} characters long, got {actual}")]
    InvalidFieldLength {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A field contained characters outside its alphabet.
    #[error("{field} contains invalid characters")]
    InvalidCharacters { field: &'static str },

    /// The CRC embedded in a user permit does not match the encrypted HW-ID.
    #[error("user permit CRC mismatch: expected {expected}, found {found}")]
    ChecksumMismatch { expected: String, found: String },

    /// Hexadecimal text could not be decoded.
    #[error("invalid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    /// Key material had the wrong size.
    #[error("invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    /// Cipher input was not a whole number of blocks.
    #[error("input length {0} is not a multiple of the cipher block size")]
    InvalidBlockLength(usize),

    /// Cipher initialization, padding or decryption failure.
    #[error("crypto failure: {0}")]
    CryptoFailure(String),

    /// Product specification number outside 100..=999.
    #[error("product specification number out of range: {0}")]
    OutOfRange(i64),

    /// No product specification could be extracted from the text.
    #[error("could not extract S-100 product specification number from: {0}")]
    UnrecognizedProductSpecification(String),

    /// I/O error while streaming.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
