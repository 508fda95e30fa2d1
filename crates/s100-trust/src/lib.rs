//! # S-100 Trust
//!
//! Certificates, DSA keys and SHA256withDSA signatures linking a scheme
//! administrator (the root) to the data servers it authorizes.
//!
//! ## Key Types
//!
//! - [`Certificate`] - X.509 certificate
//! - [`PublicKey`] / [`PrivateKey`] - DSA keys
//! - [`Signature`] - signature value with single-use sign/verify sessions
//! - [`TrustChain`] - verification against a root certificate
//! - [`CertificateBuilder`] - issues root and data server certificates

pub mod certificate;
pub mod chain;
pub mod error;
pub mod keys;
pub mod signature;

pub use certificate::{Certificate, CertificateBuilder};
pub use chain::TrustChain;
pub use error::{Result, TrustError};
pub use keys::{PrivateKey, PublicKey, DEFAULT_KEY_BITS};
pub use signature::{Signature, SigningSession, VerifyingSession};
