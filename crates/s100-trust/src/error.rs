//! Error types for certificates and signatures.

use thiserror::Error;

/// Errors raised while parsing keys and certificates or checking signatures.
#[derive(Debug, Error)]
pub enum TrustError {
    /// The key is not a DSA key.
    #[error("unsupported key type: {0}")]
    UnsupportedKeyType(String),

    /// A certificate was not issued by the trusted root.
    #[error("trust failure: {0}")]
    TrustFailure(String),

    /// `verify` was called on a signature with no value.
    #[error("no signature value to verify")]
    SignatureNotSet,

    /// A base64 signature or key body could not be decoded.
    #[error("invalid base64: {0}")]
    InvalidSignatureEncoding(#[from] base64::DecodeError),

    /// PEM text without the expected framing.
    #[error("invalid PEM: {0}")]
    InvalidPem(String),

    /// OpenSSL error.
    #[error("OpenSSL error: {0}")]
    OpenSsl(#[from] openssl::error::ErrorStack),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for trust operations.
pub type Result<T> = std::result::Result<T, TrustError>;
