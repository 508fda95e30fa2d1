//! Device workflow: present a user permit, read the permit file that comes
//! back and decrypt licensed data sets.

use std::fs::File;
use std::io::{BufRead, BufReader, Read, Write};
use std::path::Path;

use chrono::NaiveDate;
use tracing::{debug, warn};

use s100_core::{CipherScheme, HardwareId, Manufacturer, SymmetricKey, UserPermit};
use s100_permits::{DataPermit, DateFormats, ManufacturerLookup, PermitError, PermitFile};

use crate::error::{Result, SecurityError};

/// A device: its manufacturer and its own HW-ID.
#[derive(Debug, Clone)]
pub struct DataClient {
    manufacturer: Manufacturer,
    hw_id: HardwareId,
    date_formats: DateFormats,
}

impl DataClient {
    pub fn new(manufacturer: Manufacturer, hw_id: HardwareId) -> Self {
        Self {
            manufacturer,
            hw_id,
            date_formats: DateFormats::default(),
        }
    }

    pub fn with_date_formats(mut self, date_formats: DateFormats) -> Self {
        self.date_formats = date_formats;
        self
    }

    pub fn manufacturer(&self) -> &Manufacturer {
        &self.manufacturer
    }

    pub fn hardware_id(&self) -> &HardwareId {
        &self.hw_id
    }

    /// The user permit this device sends to a data server.
    pub fn user_permit(&self) -> Result<UserPermit> {
        Ok(self.manufacturer.user_permit_for(&self.hw_id)?)
    }

    /// Read a permit file and check that it was issued to this device.
    pub fn read_permit_file<R: BufRead>(&self, reader: R) -> Result<PermitFile> {
        let file = PermitFile::read_with_formats(self, reader, &self.date_formats)?;
        if file.hardware_id() != &self.hw_id {
            warn!(
                m_id = file.user_permit().m_id(),
                "permit file was issued to another device"
            );
            return Err(PermitError::TrustFailure(
                "permit file was issued to another device".into(),
            )
            .into());
        }
        Ok(file)
    }

    pub fn open_permit_file(&self, path: impl AsRef<Path>) -> Result<PermitFile> {
        let file = File::open(path.as_ref())?;
        self.read_permit_file(BufReader::new(file))
    }

    /// The permit for `file_name`, checked for completeness and expiry on `date`.
    pub fn valid_permit<'a>(
        &self,
        permit_file: &'a PermitFile,
        file_name: &str,
        date: NaiveDate,
    ) -> Result<&'a DataPermit> {
        let permit = find(permit_file, file_name)?;
        permit.validate()?;
        if !permit.is_valid_on(date) {
            return Err(SecurityError::PermitExpired {
                file_name: file_name.to_string(),
                // validate() guarantees an expiry.
                expiry: permit.expiry().unwrap_or(date),
            });
        }
        Ok(permit)
    }

    /// Unwrap the key for `file_name` with this device's HW-ID.
    pub fn data_key(&self, permit_file: &PermitFile, file_name: &str) -> Result<SymmetricKey> {
        Ok(find(permit_file, file_name)?.data_key(&self.hw_id)?)
    }

    /// Decrypt a data-set file licensed in `permit_file`.
    pub fn decrypt_data_set(
        &self,
        permit_file: &PermitFile,
        file_name: &str,
        reader: &mut dyn Read,
        writer: &mut dyn Write,
    ) -> Result<()> {
        let key = self.data_key(permit_file, file_name)?;
        CipherScheme::BulkData
            .cipher(key)
            .decrypt_stream(reader, writer)?;
        debug!(file_name, "decrypted data set");
        Ok(())
    }
}

/// A device can read only permit files for its own manufacturer.
impl ManufacturerLookup for DataClient {
    fn manufacturer_for_id(&self, m_id: &str) -> Option<Manufacturer> {
        (self.manufacturer.id() == m_id).then(|| self.manufacturer.clone())
    }
}

fn find<'a>(permit_file: &'a PermitFile, file_name: &str) -> Result<&'a DataPermit> {
    permit_file
        .find(file_name)
        .ok_or_else(|| SecurityError::PermitNotFound(file_name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DataServer, DataServerConfig, PermitGrant};
    use s100_permits::ManufacturerRegistry;

    const M_ID: &str = "859868";
    const M_KEY: &str = "AD1DAD797C966EC9F6A55B66ED982815";

    fn manufacturer() -> Manufacturer {
        Manufacturer::new(M_ID, M_KEY).unwrap()
    }

    fn server() -> DataServer {
        let registry = ManufacturerRegistry::new();
        registry.register(manufacturer());
        DataServer::new(DataServerConfig::default(), registry)
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn issue(client: &DataClient, key: &SymmetricKey) -> Vec<u8> {
        let server = server();
        let grants = [PermitGrant::new("101NO0000001.000", 1, date(2030, 6, 30), key.clone())];
        let file = server
            .issue_permit_file(&client.user_permit().unwrap().encode(), &grants)
            .unwrap();
        let mut out = Vec::new();
        server.write_permit_file(&file, &mut out).unwrap();
        out
    }

    #[test]
    fn test_user_permit_encodes_device() {
        let client = DataClient::new(
            manufacturer(),
            HardwareId::from_hex("3B2B8520ACFC3E96FB4F4537C0C0E426").unwrap(),
        );
        assert_eq!(
            client.user_permit().unwrap().encode(),
            "AD1DAD797C966EC9F6A55B66ED98281599B3C7B1859868"
        );
    }

    #[test]
    fn test_read_and_unwrap() {
        let client = DataClient::new(manufacturer(), HardwareId::random());
        let key = SymmetricKey::generate();
        let bytes = issue(&client, &key);

        let file = client.read_permit_file(&bytes[..]).unwrap();
        assert_eq!(client.data_key(&file, "101NO0000001.000").unwrap(), key);
        assert!(matches!(
            client.data_key(&file, "101NO0000002.000"),
            Err(SecurityError::PermitNotFound(_))
        ));
    }

    #[test]
    fn test_other_manufacturer_cannot_read() {
        let client = DataClient::new(manufacturer(), HardwareId::random());
        let bytes = issue(&client, &SymmetricKey::generate());

        let stranger = DataClient::new(
            Manufacturer::new("ABCDEF", M_KEY).unwrap(),
            HardwareId::random(),
        );
        let err = stranger.read_permit_file(&bytes[..]).unwrap_err();
        assert!(matches!(
            err,
            SecurityError::Permit(PermitError::UnknownManufacturer(_))
        ));
    }

    #[test]
    fn test_other_device_cannot_read() {
        let client = DataClient::new(manufacturer(), HardwareId::random());
        let bytes = issue(&client, &SymmetricKey::generate());

        let sibling = DataClient::new(manufacturer(), HardwareId::random());
        let err = sibling.read_permit_file(&bytes[..]).unwrap_err();
        assert!(err.is_trust_failure());
    }

    #[test]
    fn test_valid_permit_expiry() {
        let client = DataClient::new(manufacturer(), HardwareId::random());
        let bytes = issue(&client, &SymmetricKey::generate());
        let file = client.read_permit_file(&bytes[..]).unwrap();

        assert!(client
            .valid_permit(&file, "101NO0000001.000", date(2030, 6, 30))
            .is_ok());
        assert!(matches!(
            client.valid_permit(&file, "101NO0000001.000", date(2030, 7, 1)),
            Err(SecurityError::PermitExpired { expiry, .. }) if expiry == date(2030, 6, 30)
        ));
    }

    #[test]
    fn test_decrypt_data_set() {
        let client = DataClient::new(manufacturer(), HardwareId::random());
        let key = SymmetricKey::generate();
        let file = client.read_permit_file(&issue(&client, &key)[..]).unwrap();

        let data: Vec<u8> = (0..1000u32).map(|i| (i % 251) as u8).collect();
        let mut encrypted = Vec::new();
        server()
            .encrypt_data_set(&key, &mut &data[..], &mut encrypted)
            .unwrap();

        let mut decrypted = Vec::new();
        client
            .decrypt_data_set(&file, "101NO0000001.000", &mut &encrypted[..], &mut decrypted)
            .unwrap();
        assert_eq!(decrypted, data);
    }
}
