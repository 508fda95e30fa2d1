//! # S-100 Testkit
//!
//! Testing utilities for the S-100 security crates.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: the standard's worked examples, for cross-implementation checks
//! - **Generators**: Proptest strategies for property-based testing
//! - **Fixtures**: devices, manufacturers and a test PKI
//!
//! ## Golden Vectors
//!
//! ```rust
//! use s100_testkit::vectors::verify_all_vectors;
//!
//! for (name, passed) in verify_all_vectors() {
//!     assert!(passed, "{name}");
//! }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use s100_testkit::generators::{hardware_id, permit_from_params, PermitParams};
//!
//! proptest! {
//!     #[test]
//!     fn data_key_unwraps(params: PermitParams, hw_id in hardware_id()) {
//!         let permit = permit_from_params(&params, &hw_id);
//!         prop_assert_eq!(permit.data_key(&hw_id).unwrap(), params.data_key);
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust
//! use s100_testkit::fixtures::DeviceFixture;
//!
//! let device = DeviceFixture::new("ABC123");
//! let (permit_file, keys) = device.permit_file_with(2);
//! assert_eq!(permit_file.len(), keys.len());
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{DeviceFixture, PkiFixture};
pub use generators::{permit_from_params, PermitParams};
pub use vectors::{verify_all_vectors, KeyWrapVector, ProductVector, UserPermitVector};
