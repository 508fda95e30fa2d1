//! # S-100 Security
//!
//! The IHO S-100 data protection scheme: data servers license encrypted
//! data sets to individual devices, and devices decrypt only what they are
//! licensed for.
//!
//! ## Overview
//!
//! - A device's **user permit** carries its hardware id (HW-ID) encrypted
//!   with its manufacturer's key, a CRC and the manufacturer id.
//! - A data server recovers the HW-ID and issues a **permit file** listing,
//!   per data set, the data key wrapped under that HW-ID.
//! - Data sets are encrypted with AES-128/CBC under their data key.
//! - Certificates issued by the scheme administrator let devices check
//!   data server signatures.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use chrono::NaiveDate;
//! use s100_security::core::{HardwareId, Manufacturer, SymmetricKey};
//! use s100_security::permits::ManufacturerRegistry;
//! use s100_security::{DataClient, DataServer, DataServerConfig, PermitGrant};
//!
//! fn example() -> s100_security::Result<()> {
//!     let manufacturer = Manufacturer::new("859868", "AD1DAD797C966EC9F6A55B66ED982815")?;
//!
//!     // Device side
//!     let client = DataClient::new(manufacturer.clone(), HardwareId::random());
//!     let user_permit = client.user_permit()?.encode();
//!
//!     // Data server side
//!     let registry = ManufacturerRegistry::new();
//!     registry.register(manufacturer);
//!     let server = DataServer::new(DataServerConfig::new().name("Example"), registry);
//!
//!     let key = SymmetricKey::generate();
//!     let expiry = NaiveDate::from_ymd_opt(2030, 12, 31).unwrap();
//!     let grants = [PermitGrant::new("101NO0000001.000", 1, expiry, key.clone())];
//!     let permit_file = server.issue_permit_file(&user_permit, &grants)?;
//!
//!     let mut xml = Vec::new();
//!     server.write_permit_file(&permit_file, &mut xml)?;
//!
//!     // Back on the device
//!     let permit_file = client.read_permit_file(&xml[..])?;
//!     assert_eq!(client.data_key(&permit_file, "101NO0000001.000")?, key);
//!     Ok(())
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `s100_security::core` - codecs, ciphers, user permits, product specifications
//! - `s100_security::permits` - data permits, permit files, manufacturer registry
//! - `s100_security::trust` - certificates, DSA keys, signatures

pub mod client;
pub mod config;
pub mod error;
pub mod server;

pub use client::DataClient;
pub use config::DataServerConfig;
pub use error::{Result, SecurityError};
pub use server::{DataServer, PermitGrant};

// Re-export component crates
pub use s100_core as core;
pub use s100_permits as permits;
pub use s100_trust as trust;

// Re-export commonly used types
pub use s100_core::{HardwareId, Manufacturer, ProductSpecification, SymmetricKey, UserPermit};
pub use s100_permits::{DataPermit, ManufacturerRegistry, PermitFile};
pub use s100_trust::{Certificate, Signature, TrustChain};
