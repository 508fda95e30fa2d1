//! # S-100 Permits
//!
//! Data permits and the permit file a data server sends to a device.
//!
//! ## Overview
//!
//! A device presents its user permit (see [`s100_core::UserPermit`]). The data
//! server recovers the HW-ID with the manufacturer key, wraps each licensed
//! data-set key under that HW-ID and collects the results in a
//! [`PermitFile`]. The device reads the permit file back, recovering its own
//! HW-ID the same way, and unwraps the data-set keys it needs.
//!
//! ## Key Types
//!
//! - [`DataPermit`] - one data-set file, its edition, expiry and wrapped key
//! - [`PermitFile`] - all data permits for one device, as `PERMIT.XML`
//! - [`ManufacturerLookup`] - M_ID to manufacturer resolution
//! - [`ManufacturerRegistry`] - thread-safe in-memory lookup
//! - [`DateFormats`] - header and expiry date formats

pub mod data_permit;
pub mod date_format;
pub mod error;
pub mod permit_file;
pub mod registry;
mod xml;

pub use data_permit::DataPermit;
pub use date_format::{DateFormats, EXPIRY_DATE_FORMAT, HEADER_DATE_FORMAT};
pub use error::{PermitError, Result};
pub use permit_file::{PermitFile, PERMIT_FILE_NAME, PERMIT_FILE_VERSION};
pub use registry::{ManufacturerLookup, ManufacturerRegistry};
