//! # S-100 Core
//!
//! Pure primitives for the IHO S-100 data protection scheme: hex and CRC
//! codecs, the two AES-128/CBC schemes, user permits, manufacturers and
//! product identification.
//!
//! This crate does no file-system or network I/O. Streaming entry points work
//! on caller-supplied readers and writers.
//!
//! ## Key Types
//!
//! - [`SymmetricKey`] - 128-bit AES key, exchanged as 32 hex characters
//! - [`HardwareId`] - device identity, also the key that wraps data keys
//! - [`UserPermit`] - 46-character device identity string with CRC
//! - [`Manufacturer`] - M_ID plus the key that encrypts its devices' HW-IDs
//! - [`ProductSpecification`] - S-100 product number (S-101, S-102, ...)
//!
//! ## Encryption
//!
//! See [`crypto`] for the bulk-data and key-wrap schemes.

pub mod codec;
pub mod crypto;
pub mod error;
pub mod file_name;
pub mod manufacturer;
pub mod product;
pub mod types;
pub mod user_permit;

pub use crypto::{CipherScheme, DataCipher, RandomIvCipher, ZeroIvCipher, BLOCK_SIZE};
pub use error::{CoreError, Result};
pub use manufacturer::Manufacturer;
pub use product::ProductSpecification;
pub use types::{HardwareId, SymmetricKey, KEY_SIZE, KEY_SIZE_ENCODED};
pub use user_permit::{UserPermit, USER_PERMIT_LEN};
