//! Error types for the facade.

use chrono::NaiveDate;
use s100_core::CoreError;
use s100_permits::PermitError;
use s100_trust::TrustError;
use thiserror::Error;

/// Errors that can occur in data server and device workflows.
#[derive(Debug, Error)]
pub enum SecurityError {
    /// Codec, cipher, user permit or product error.
    #[error("core error: {0}")]
    Core(#[from] CoreError),

    /// Permit or permit file error.
    #[error("permit error: {0}")]
    Permit(#[from] PermitError),

    /// Certificate or signature error.
    #[error("trust error: {0}")]
    Trust(#[from] TrustError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The permit file has no permit for the data set.
    #[error("no permit for data set {0}")]
    PermitNotFound(String),

    /// The permit exists but is past its expiry date.
    #[error("permit for {file_name} expired on {expiry}")]
    PermitExpired { file_name: String, expiry: NaiveDate },
}

impl SecurityError {
    /// The core error, whether raised directly or while handling permits.
    pub fn core_error(&self) -> Option<&CoreError> {
        match self {
            SecurityError::Core(e) | SecurityError::Permit(PermitError::Core(e)) => Some(e),
            _ => None,
        }
    }

    /// Data was altered or decrypted with the wrong key: a CRC mismatch,
    /// bad padding or a truncated ciphertext.
    pub fn is_integrity_failure(&self) -> bool {
        matches!(
            self.core_error(),
            Some(
                CoreError::ChecksumMismatch { .. }
                    | CoreError::CryptoFailure(_)
                    | CoreError::InvalidBlockLength(_)
            )
        )
    }

    /// A party could not be authenticated: unknown manufacturer, an HW-ID
    /// that does not decrypt, or a certificate outside the chain.
    pub fn is_trust_failure(&self) -> bool {
        matches!(
            self,
            SecurityError::Permit(PermitError::UnknownManufacturer(_))
                | SecurityError::Permit(PermitError::TrustFailure(_))
                | SecurityError::Trust(TrustError::TrustFailure(_))
                | SecurityError::Trust(TrustError::UnsupportedKeyType(_))
        )
    }

    /// Input did not have the expected shape.
    pub fn is_format_error(&self) -> bool {
        if let Some(core) = self.core_error() {
            return matches!(
                core,
                CoreError::InvalidFieldLength { .. }
                    | CoreError::InvalidCharacters { .. }
                    | CoreError::InvalidHex(_)
                    | CoreError::InvalidKeyLength { .. }
                    | CoreError::OutOfRange(_)
                    | CoreError::UnrecognizedProductSpecification(_)
            );
        }
        matches!(
            self,
            SecurityError::Permit(
                PermitError::MalformedDate { .. }
                    | PermitError::InvalidDateFormat(_)
                    | PermitError::MissingElement(_)
                    | PermitError::MalformedField { .. }
                    | PermitError::MalformedDocument(_)
                    | PermitError::Xml(_)
            ) | SecurityError::Trust(
                TrustError::InvalidPem(_) | TrustError::InvalidSignatureEncoding(_)
            )
        )
    }
}

/// Result type for facade operations.
pub type Result<T> = std::result::Result<T, SecurityError>;
