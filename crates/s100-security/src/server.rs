//! Data server workflow: issue permit files and encrypt data sets.

use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use s100_core::{CipherScheme, HardwareId, ProductSpecification, SymmetricKey, UserPermit};
use s100_permits::{DataPermit, ManufacturerLookup, ManufacturerRegistry, PermitError, PermitFile};

use crate::config::DataServerConfig;
use crate::error::Result;

/// One data set a device is licensed for.
#[derive(Debug, Clone)]
pub struct PermitGrant {
    pub file_name: String,
    pub edition: u32,
    pub expiry: NaiveDate,
    pub data_key: SymmetricKey,
    /// Derived from the file name when not set.
    pub product: Option<ProductSpecification>,
}

impl PermitGrant {
    pub fn new(
        file_name: impl Into<String>,
        edition: u32,
        expiry: NaiveDate,
        data_key: SymmetricKey,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            edition,
            expiry,
            data_key,
            product: None,
        }
    }

    pub fn product(mut self, product: ProductSpecification) -> Self {
        self.product = Some(product);
        self
    }

    /// The explicit product, or the one named by the file name.
    pub fn product_specification(&self) -> Result<ProductSpecification> {
        match self.product {
            Some(product) => Ok(product),
            None => Ok(ProductSpecification::parse(&self.file_name)?),
        }
    }
}

/// Issues permit files for devices whose manufacturers are in `registry`.
#[derive(Debug)]
pub struct DataServer<L = ManufacturerRegistry> {
    config: DataServerConfig,
    registry: L,
}

impl<L: ManufacturerLookup> DataServer<L> {
    pub fn new(config: DataServerConfig, registry: L) -> Self {
        Self { config, registry }
    }

    pub fn config(&self) -> &DataServerConfig {
        &self.config
    }

    pub fn registry(&self) -> &L {
        &self.registry
    }

    /// Recover the plaintext HW-ID from a decoded user permit.
    pub fn hardware_id(&self, user_permit: &UserPermit) -> Result<HardwareId> {
        let m_id = user_permit.m_id();
        let manufacturer = self.registry.manufacturer_for_id(m_id).ok_or_else(|| {
            warn!(m_id, "user permit names an unknown manufacturer");
            PermitError::UnknownManufacturer(m_id.to_string())
        })?;
        let hw_id = manufacturer
            .decrypt_hw_id(user_permit.hw_id_encrypted())
            .map_err(|e| PermitError::TrustFailure(format!("could not decrypt HW_ID: {e}")))?;
        Ok(hw_id)
    }

    /// Build the permit file for the device behind `user_permit`.
    ///
    /// The user permit is decoded and CRC-checked first. Each grant becomes
    /// one data permit; a second grant for the same file name is ignored.
    pub fn issue_permit_file(&self, user_permit: &str, grants: &[PermitGrant]) -> Result<PermitFile> {
        let user_permit = UserPermit::decode(user_permit)?;
        let hw_id = self.hardware_id(&user_permit)?;
        let m_id = user_permit.m_id().to_string();

        let mut file = PermitFile::new(self.config.name.clone(), hw_id, user_permit);
        for grant in grants {
            let permit = DataPermit::issue(
                grant.file_name.as_str(),
                grant.edition,
                grant.expiry,
                &grant.data_key,
                file.hardware_id(),
                grant.product_specification()?,
            );
            if !file.add(permit) {
                debug!(file_name = %grant.file_name, "duplicate grant ignored");
            }
        }

        info!(
            m_id = %m_id,
            products = file.product_specifications().count(),
            permits = file.len(),
            "issued permit file"
        );
        Ok(file)
    }

    /// Serialize `file` with the configured date formats.
    pub fn write_permit_file<W: Write>(&self, file: &PermitFile, out: W) -> Result<()> {
        file.write_to(out, &self.config.date_formats)?;
        Ok(())
    }

    /// Write `file` into `dir` under the configured permit file name.
    pub fn save_permit_file(&self, file: &PermitFile, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let path = dir.as_ref().join(&self.config.permit_file_name);
        let mut out = BufWriter::new(File::create(&path)?);
        self.write_permit_file(file, &mut out)?;
        out.flush()?;
        debug!(path = %path.display(), "saved permit file");
        Ok(path)
    }

    /// Encrypt a data-set file with the bulk-data scheme.
    pub fn encrypt_data_set(
        &self,
        key: &SymmetricKey,
        reader: &mut dyn Read,
        writer: &mut dyn Write,
    ) -> Result<()> {
        CipherScheme::BulkData
            .cipher(key.clone())
            .encrypt_stream(reader, writer)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SecurityError;
    use s100_core::Manufacturer;
    use s100_permits::DateFormats;

    const M_ID: &str = "859868";
    const M_KEY: &str = "AD1DAD797C966EC9F6A55B66ED982815";
    const HW_ID: &str = "3B2B8520ACFC3E96FB4F4537C0C0E426";
    const USER_PERMIT: &str = "AD1DAD797C966EC9F6A55B66ED98281599B3C7B1859868";

    fn server() -> DataServer {
        let registry = ManufacturerRegistry::new();
        registry.register(Manufacturer::new(M_ID, M_KEY).unwrap());
        DataServer::new(DataServerConfig::new().name("Test Data Server"), registry)
    }

    fn expiry() -> NaiveDate {
        NaiveDate::from_ymd_opt(2030, 1, 31).unwrap()
    }

    #[test]
    fn test_issue_recovers_hw_id() {
        let file = server().issue_permit_file(USER_PERMIT, &[]).unwrap();
        assert_eq!(file.hardware_id(), &HardwareId::from_hex(HW_ID).unwrap());
        assert_eq!(file.data_server(), Some("Test Data Server"));
        assert!(file.is_empty());
    }

    #[test]
    fn test_products_derived_from_file_names() {
        let grants = [
            PermitGrant::new("101NO0000001.000", 1, expiry(), SymmetricKey::generate()),
            PermitGrant::new("102NO0000001.h5", 4, expiry(), SymmetricKey::generate()),
            PermitGrant::new("dataset.h5", 1, expiry(), SymmetricKey::generate())
                .product(ProductSpecification::new(104).unwrap()),
        ];
        let file = server().issue_permit_file(USER_PERMIT, &grants).unwrap();
        let products: Vec<u16> = file.product_specifications().map(|p| p.number()).collect();
        assert_eq!(products, [101, 102, 104]);
        assert_eq!(file.find("102NO0000001.h5").unwrap().edition(), Some(4));
    }

    #[test]
    fn test_duplicate_grants_collapse() {
        let key = SymmetricKey::generate();
        let grants = [
            PermitGrant::new("101NO0000001.000", 1, expiry(), key.clone()),
            PermitGrant::new("101NO0000001.000", 2, expiry(), key),
        ];
        let file = server().issue_permit_file(USER_PERMIT, &grants).unwrap();
        assert_eq!(file.len(), 1);
        assert_eq!(file.find("101NO0000001.000").unwrap().edition(), Some(1));
    }

    #[test]
    fn test_unknown_manufacturer() {
        let server = DataServer::new(DataServerConfig::default(), ManufacturerRegistry::new());
        let err = server.issue_permit_file(USER_PERMIT, &[]).unwrap_err();
        assert!(matches!(
            err,
            SecurityError::Permit(PermitError::UnknownManufacturer(ref id)) if id == M_ID
        ));
        assert!(err.is_trust_failure());
    }

    #[test]
    fn test_corrupt_user_permit() {
        let tampered = USER_PERMIT.replace("99B3C7B1", "99B3C7B0");
        let err = server().issue_permit_file(&tampered, &[]).unwrap_err();
        assert!(err.is_integrity_failure());

        let err = server().issue_permit_file(&USER_PERMIT[1..], &[]).unwrap_err();
        assert!(err.is_format_error());
    }

    #[test]
    fn test_unparseable_product_fails() {
        let grants = [PermitGrant::new("dataset.h5", 1, expiry(), SymmetricKey::generate())];
        let err = server().issue_permit_file(USER_PERMIT, &grants).unwrap_err();
        assert!(err.is_format_error());
    }

    #[test]
    fn test_save_uses_configured_name() {
        let dir = tempfile::tempdir().unwrap();
        let registry = ManufacturerRegistry::new();
        registry.register(Manufacturer::new(M_ID, M_KEY).unwrap());
        let server = DataServer::new(
            DataServerConfig::new().permit_file_name("permit-859868.xml"),
            registry,
        );

        let file = server.issue_permit_file(USER_PERMIT, &[]).unwrap();
        let path = server.save_permit_file(&file, dir.path()).unwrap();
        assert_eq!(path, dir.path().join("permit-859868.xml"));

        let read = PermitFile::open(server.registry(), &path).unwrap();
        assert_eq!(read.user_permit().encode(), USER_PERMIT);
    }

    #[test]
    fn test_write_uses_configured_formats() {
        let formats = DateFormats {
            header: "%Y-%m-%d %H:%M:%S".into(),
            expiry: "%Y-%m-%d".into(),
        };
        let registry = ManufacturerRegistry::new();
        registry.register(Manufacturer::new(M_ID, M_KEY).unwrap());
        let server = DataServer::new(DataServerConfig::new().date_formats(formats), registry);

        let grants = [PermitGrant::new("101NO0000001.000", 1, expiry(), SymmetricKey::generate())];
        let file = server.issue_permit_file(USER_PERMIT, &grants).unwrap();
        let mut out = Vec::new();
        server.write_permit_file(&file, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("<expiry>2030-01-31</expiry>"));
    }

    #[test]
    fn test_encrypt_data_set_layout() {
        let key = SymmetricKey::generate();
        let data = b"S-101 cell contents".to_vec();
        let mut out = Vec::new();
        server()
            .encrypt_data_set(&key, &mut &data[..], &mut out)
            .unwrap();
        // Decoy block, then 19 bytes padded to two blocks.
        assert_eq!(out.len(), 48);
        let plain = CipherScheme::BulkData.cipher(key).decrypt(&out).unwrap();
        assert_eq!(plain, data);
    }
}
