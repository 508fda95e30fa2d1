//! Error types for permit handling.

use thiserror::Error;

/// Errors that can occur while issuing, reading or writing permits.
#[derive(Debug, Error)]
pub enum PermitError {
    /// The user permit names a manufacturer the registry does not know.
    #[error("unknown manufacturer: M_ID={0}")]
    UnknownManufacturer(String),

    /// The HW-ID could not be recovered from the user permit.
    #[error("trust failure: {0}")]
    TrustFailure(String),

    /// A date field did not match its format.
    #[error("malformed date {value:?}, expected format {format:?}")]
    MalformedDate { value: String, format: String },

    /// A date format string contains an unknown specifier.
    #[error("invalid date format: {0:?}")]
    InvalidDateFormat(String),

    /// A required element is absent from the document.
    #[error("missing element: {0}")]
    MissingElement(&'static str),

    /// An element is present but its content is unusable.
    #[error("malformed {field}: {value:?}")]
    MalformedField { field: &'static str, value: String },

    /// The document ended inside an element.
    #[error("malformed permit file: {0}")]
    MalformedDocument(String),

    /// XML syntax or encoding error.
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Core error (user permit, key material, product specification).
    #[error("core error: {0}")]
    Core(#[from] s100_core::CoreError),
}

/// Result type for permit operations.
pub type Result<T> = std::result::Result<T, PermitError>;
