//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::sync::OnceLock;

use chrono::{NaiveDate, NaiveDateTime};

use s100_core::{HardwareId, Manufacturer, ProductSpecification, SymmetricKey, UserPermit};
use s100_permits::{ManufacturerRegistry, PermitFile};
use s100_trust::{Certificate, CertificateBuilder, PrivateKey, Signature, TrustChain};

use crate::vectors::user_permit_vectors;

/// A manufacturer, one of its devices and a registry that knows it.
pub struct DeviceFixture {
    pub manufacturer: Manufacturer,
    pub hw_id: HardwareId,
    pub registry: ManufacturerRegistry,
}

impl DeviceFixture {
    /// A device with a random HW-ID and a random manufacturer key.
    pub fn new(m_id: &str) -> Self {
        Self::with(
            Manufacturer::with_key(m_id, SymmetricKey::generate()),
            HardwareId::random(),
        )
    }

    /// The device from the worked example (M_ID `859868`).
    pub fn worked_example() -> Self {
        let v = &user_permit_vectors()[0];
        Self::with(
            Manufacturer::new(v.m_id, v.m_key).expect("worked example M_KEY"),
            HardwareId::from_hex(v.hw_id).expect("worked example HW_ID"),
        )
    }

    fn with(manufacturer: Manufacturer, hw_id: HardwareId) -> Self {
        let registry = ManufacturerRegistry::new();
        registry.register(manufacturer.clone());
        Self {
            manufacturer,
            hw_id,
            registry,
        }
    }

    pub fn user_permit(&self) -> UserPermit {
        self.manufacturer
            .user_permit_for(&self.hw_id)
            .expect("fixture manufacturer id is six characters")
    }

    /// An empty permit file for this device, with a fixed issue date.
    pub fn permit_file(&self) -> PermitFile {
        PermitFile::new(
            Some("Test Data Server".into()),
            self.hw_id.clone(),
            self.user_permit(),
        )
        .with_issue_date(issue_date())
    }

    /// A permit file holding `count` S-101 permits with fresh data keys.
    /// Returns the keys alongside, in file name order.
    pub fn permit_file_with(&self, count: usize) -> (PermitFile, Vec<(String, SymmetricKey)>) {
        let mut file = self.permit_file();
        let mut keys = Vec::with_capacity(count);
        for i in 1..=count {
            let file_name = format!("101NO{i:08}.000");
            let key = SymmetricKey::generate();
            file.issue(file_name.as_str(), 1, expiry(), &key, ProductSpecification::S101);
            keys.push((file_name, key));
        }
        (file, keys)
    }
}

/// Issue date used by fixtures: 2024-03-05 09:15:00.
pub fn issue_date() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 5)
        .and_then(|d| d.and_hms_opt(9, 15, 0))
        .expect("valid date")
}

/// Expiry used by fixtures: 2030-12-31.
pub fn expiry() -> NaiveDate {
    NaiveDate::from_ymd_opt(2030, 12, 31).expect("valid date")
}

/// A scheme administrator root and one data server certificate under it.
pub struct PkiFixture {
    pub root_key: PrivateKey,
    pub root: Certificate,
    pub data_server_key: PrivateKey,
    pub data_server: Certificate,
}

impl PkiFixture {
    /// Shared instance. DSA parameter generation is slow, so it is built once.
    pub fn shared() -> &'static PkiFixture {
        static PKI: OnceLock<PkiFixture> = OnceLock::new();
        PKI.get_or_init(|| PkiFixture::generate().expect("DSA key generation"))
    }

    pub fn generate() -> s100_trust::Result<Self> {
        let root_key = PrivateKey::generate(2048)?;
        let root = CertificateBuilder::new("Test Scheme Administrator")
            .organization("IHO")
            .ca()
            .self_signed(&root_key)?;
        let data_server_key = PrivateKey::generate(2048)?;
        let data_server = CertificateBuilder::new("Test Data Server")
            .organization("Test Hydrographic Office")
            .signed_by(&data_server_key.public_key()?, &root, &root_key)?;
        Ok(Self {
            root_key,
            root,
            data_server_key,
            data_server,
        })
    }

    pub fn trust_chain(&self) -> s100_trust::Result<TrustChain> {
        TrustChain::new(self.root.clone())
    }

    /// Sign `payload` as the data server.
    pub fn sign(&self, payload: &[u8]) -> s100_trust::Result<Signature> {
        let mut session = Signature::init_sign(&self.data_server_key)?;
        session.update(payload)?;
        session.sign()
    }
}
