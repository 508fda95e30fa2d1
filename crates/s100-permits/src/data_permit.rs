//! Data permits: one licensed data-set file for one device.
//!
//! A data permit carries the data-set key wrapped under the device HW-ID, so
//! only the device holding that HW-ID can recover it.

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};
use std::io::{BufRead, Write};

use chrono::NaiveDate;
use quick_xml::events::{BytesStart, Event};
use quick_xml::{Reader, Writer};
use tracing::trace;

use s100_core::{codec, CoreError, HardwareId, ProductSpecification, SymmetricKey, ZeroIvCipher};
use s100_core::KEY_SIZE_ENCODED;

use crate::date_format::DateFormats;
use crate::error::{PermitError, Result};
use crate::xml;

/// Element names inside a permit entry.
pub(crate) const PERMIT_ELEMENT: &str = "permit";
pub(crate) const LEGACY_PERMIT_ELEMENT: &str = "datasetPermit";
const FILENAME_ELEMENT: &str = "filename";
const EDITION_NUMBER_ELEMENT: &str = "editionNumber";
const EXPIRY_ELEMENT: &str = "expiry";
const ENCRYPTED_KEY_ELEMENT: &str = "encryptedKey";

/// A license record for one data-set file.
///
/// Fields read from a permit file may be absent; nothing is validated while
/// reading. Use [`validate`](Self::validate) before relying on them.
///
/// Equality, hashing and ordering use the file name only.
#[derive(Debug, Clone)]
pub struct DataPermit {
    file_name: Option<String>,
    edition: Option<u32>,
    expiry: Option<NaiveDate>,
    encrypted_data_key: Option<String>,
    product_specification: ProductSpecification,
}

impl DataPermit {
    /// Issue a permit by wrapping `data_key` under `hw_id`.
    pub fn issue(
        file_name: impl Into<String>,
        edition: u32,
        expiry: NaiveDate,
        data_key: &SymmetricKey,
        hw_id: &HardwareId,
        product_specification: ProductSpecification,
    ) -> Self {
        let wrapped = ZeroIvCipher::new(hw_id.wrapping_key()).encrypt_block(data_key.as_bytes());
        Self {
            file_name: Some(file_name.into()),
            edition: Some(edition),
            expiry: Some(expiry),
            encrypted_data_key: Some(codec::to_hex(&wrapped)),
            product_specification,
        }
    }

    /// Issue a permit from hex key material.
    ///
    /// Malformed key material fails with [`CoreError::CryptoFailure`].
    pub fn issue_hex(
        file_name: impl Into<String>,
        edition: u32,
        expiry: NaiveDate,
        data_key_hex: &str,
        hw_id_hex: &str,
        product_specification: ProductSpecification,
    ) -> Result<Self> {
        let crypto_failure =
            |what: &str, e: CoreError| CoreError::CryptoFailure(format!("malformed {what}: {e}"));
        let data_key =
            SymmetricKey::from_hex(data_key_hex).map_err(|e| crypto_failure("data key", e))?;
        let hw_id = HardwareId::from_hex(hw_id_hex).map_err(|e| crypto_failure("HW_ID", e))?;
        Ok(Self::issue(
            file_name,
            edition,
            expiry,
            &data_key,
            &hw_id,
            product_specification,
        ))
    }

    /// Build a permit from already-wrapped key material.
    pub fn from_parts(
        file_name: impl Into<String>,
        edition: u32,
        expiry: NaiveDate,
        encrypted_data_key: impl Into<String>,
        product_specification: ProductSpecification,
    ) -> Self {
        Self {
            file_name: Some(file_name.into()),
            edition: Some(edition),
            expiry: Some(expiry),
            encrypted_data_key: Some(encrypted_data_key.into()),
            product_specification,
        }
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    pub fn edition(&self) -> Option<u32> {
        self.edition
    }

    pub fn expiry(&self) -> Option<NaiveDate> {
        self.expiry
    }

    /// The wrapped data-set key as 32 hex characters.
    pub fn encrypted_data_key(&self) -> Option<&str> {
        self.encrypted_data_key.as_deref()
    }

    pub fn product_specification(&self) -> ProductSpecification {
        self.product_specification
    }

    /// The file name without its suffix, e.g. `101NO0001234` for
    /// `101NO0001234.000`.
    pub fn data_set_id(&self) -> Option<&str> {
        self.file_name.as_deref().map(codec::file_name_without_suffix)
    }

    /// Unwrap the data-set key with the device HW-ID.
    pub fn data_key(&self, hw_id: &HardwareId) -> Result<SymmetricKey> {
        let encrypted = self
            .encrypted_data_key
            .as_deref()
            .ok_or(PermitError::MissingElement(ENCRYPTED_KEY_ELEMENT))?;
        let wrapped = SymmetricKey::from_hex(encrypted)?;
        let plain = ZeroIvCipher::new(hw_id.wrapping_key()).decrypt_block(wrapped.as_bytes());
        Ok(SymmetricKey::from_bytes(plain))
    }

    /// Whether the permit is still valid on `date`. The expiry day is included.
    pub fn is_valid_on(&self, date: NaiveDate) -> bool {
        self.expiry.map_or(false, |expiry| date <= expiry)
    }

    /// Check that every field is present and the key is 32 hex characters.
    pub fn validate(&self) -> Result<()> {
        if self.file_name.is_none() {
            return Err(PermitError::MissingElement(FILENAME_ELEMENT));
        }
        if self.edition.is_none() {
            return Err(PermitError::MissingElement(EDITION_NUMBER_ELEMENT));
        }
        if self.expiry.is_none() {
            return Err(PermitError::MissingElement(EXPIRY_ELEMENT));
        }
        let key = self
            .encrypted_data_key
            .as_deref()
            .ok_or(PermitError::MissingElement(ENCRYPTED_KEY_ELEMENT))?;
        if key.len() != KEY_SIZE_ENCODED || !codec::is_hex(key) {
            return Err(PermitError::MalformedField {
                field: ENCRYPTED_KEY_ELEMENT,
                value: key.to_string(),
            });
        }
        Ok(())
    }

    /// Read a permit entry whose start tag was just consumed.
    ///
    /// Child elements may come in any order; unknown ones are skipped.
    pub(crate) fn read_xml<R: BufRead>(
        product_specification: ProductSpecification,
        formats: &DateFormats,
        reader: &mut Reader<R>,
        buf: &mut Vec<u8>,
    ) -> Result<Self> {
        let mut permit = Self {
            file_name: None,
            edition: None,
            expiry: None,
            encrypted_data_key: None,
            product_specification,
        };

        loop {
            let event = reader.read_event_into(buf)?;
            let name = match event {
                Event::Start(e) => Some(e.local_name().as_ref().to_vec()),
                Event::End(_) => break,
                Event::Eof => {
                    return Err(PermitError::MalformedDocument(
                        "unexpected end of document inside a permit".into(),
                    ))
                }
                _ => None,
            };
            buf.clear();
            let Some(name) = name else { continue };

            match name.as_slice() {
                b"filename" => permit.file_name = Some(xml::read_text(reader, buf)?),
                b"editionNumber" => {
                    let text = xml::read_text(reader, buf)?;
                    let edition = text.trim().parse().map_err(|_| PermitError::MalformedField {
                        field: EDITION_NUMBER_ELEMENT,
                        value: text.clone(),
                    })?;
                    permit.edition = Some(edition);
                }
                b"expiry" => {
                    let text = xml::read_text(reader, buf)?;
                    permit.expiry = Some(formats.parse_expiry(&text)?);
                }
                b"encryptedKey" => {
                    permit.encrypted_data_key = Some(xml::read_text(reader, buf)?.trim().to_string())
                }
                other => {
                    trace!(element = %String::from_utf8_lossy(other), "skipping unknown permit element");
                    xml::skip_element(reader, buf)?;
                }
            }
        }
        buf.clear();

        Ok(permit)
    }

    /// Write this permit as a `permit` element. Absent fields are left out.
    pub(crate) fn write_xml<W: Write>(
        &self,
        writer: &mut Writer<W>,
        formats: &DateFormats,
    ) -> Result<()> {
        xml::write_start(writer, BytesStart::new(PERMIT_ELEMENT))?;

        if let Some(file_name) = &self.file_name {
            xml::write_text_element(writer, FILENAME_ELEMENT, file_name)?;
        }
        if let Some(edition) = self.edition {
            xml::write_text_element(writer, EDITION_NUMBER_ELEMENT, &edition.to_string())?;
        }
        if let Some(expiry) = &self.expiry {
            xml::write_text_element(writer, EXPIRY_ELEMENT, &formats.format_expiry(expiry)?)?;
        }
        if let Some(key) = &self.encrypted_data_key {
            xml::write_text_element(writer, ENCRYPTED_KEY_ELEMENT, key)?;
        }

        xml::write_end(writer, PERMIT_ELEMENT)
    }
}

impl PartialEq for DataPermit {
    fn eq(&self, other: &Self) -> bool {
        self.file_name == other.file_name
    }
}

impl Eq for DataPermit {}

impl Hash for DataPermit {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.file_name.hash(state);
    }
}

impl PartialOrd for DataPermit {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DataPermit {
    fn cmp(&self, other: &Self) -> Ordering {
        self.file_name.cmp(&other.file_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HW_ID: &str = "AB40384B45B54596201114FE99042201";
    const DATA_KEY: &str = "1C81DFAB4053D04803FFDC87EF92FDD1";
    const WRAPPED: &str = "172019407CDA6B8C1F545CCDB11B7297";

    fn expiry() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 30).unwrap()
    }

    fn parse(xml_text: &str) -> Result<DataPermit> {
        let mut reader = Reader::from_reader(xml_text.as_bytes());
        reader.trim_text(true);
        let mut buf = Vec::new();
        // Consume the permit start tag.
        loop {
            if let Event::Start(_) = reader.read_event_into(&mut buf)? {
                break;
            }
            buf.clear();
        }
        buf.clear();
        DataPermit::read_xml(
            ProductSpecification::S101,
            &DateFormats::default(),
            &mut reader,
            &mut buf,
        )
    }

    #[test]
    fn test_issue_vector() {
        let permit = DataPermit::issue_hex(
            "101NO00012345.000",
            3,
            expiry(),
            DATA_KEY,
            HW_ID,
            ProductSpecification::S101,
        )
        .unwrap();
        assert_eq!(permit.encrypted_data_key(), Some(WRAPPED));
        assert_eq!(permit.data_set_id(), Some("101NO00012345"));

        let hw_id = HardwareId::from_hex(HW_ID).unwrap();
        assert_eq!(permit.data_key(&hw_id).unwrap().to_hex(), DATA_KEY);
    }

    #[test]
    fn test_issue_hex_rejects_bad_key_material() {
        let result =
            DataPermit::issue_hex("f.000", 1, expiry(), "1C81", HW_ID, ProductSpecification::S101);
        assert!(matches!(
            result,
            Err(PermitError::Core(CoreError::CryptoFailure(_)))
        ));
    }

    #[test]
    fn test_identity_is_file_name() {
        let a = DataPermit::from_parts("A.000", 1, expiry(), WRAPPED, ProductSpecification::S101);
        let a2 = DataPermit::from_parts("A.000", 9, expiry(), DATA_KEY, ProductSpecification::S101);
        let b = DataPermit::from_parts("B.000", 1, expiry(), WRAPPED, ProductSpecification::S101);
        assert_eq!(a, a2);
        assert!(a < b);
    }

    #[test]
    fn test_read_fields_in_any_order() {
        let permit = parse(
            "<permit>\
               <encryptedKey>172019407CDA6B8C1F545CCDB11B7297</encryptedKey>\
               <expiry>20250630</expiry>\
               <filename>101NO00012345.000</filename>\
               <editionNumber>3</editionNumber>\
             </permit>",
        )
        .unwrap();
        assert_eq!(permit.file_name(), Some("101NO00012345.000"));
        assert_eq!(permit.edition(), Some(3));
        assert_eq!(permit.expiry(), Some(expiry()));
        assert_eq!(permit.encrypted_data_key(), Some(WRAPPED));
        assert!(permit.validate().is_ok());
    }

    #[test]
    fn test_read_leaves_missing_fields_absent() {
        let permit = parse("<permit><filename>x.000</filename><note>hi</note></permit>").unwrap();
        assert_eq!(permit.file_name(), Some("x.000"));
        assert_eq!(permit.edition(), None);
        assert_eq!(permit.expiry(), None);
        assert!(matches!(
            permit.validate(),
            Err(PermitError::MissingElement("editionNumber"))
        ));
    }

    #[test]
    fn test_read_bad_date_fails() {
        assert!(matches!(
            parse("<permit><expiry>30.06.2025</expiry></permit>"),
            Err(PermitError::MalformedDate { .. })
        ));
    }

    #[test]
    fn test_read_bad_edition_fails() {
        assert!(matches!(
            parse("<permit><editionNumber>three</editionNumber></permit>"),
            Err(PermitError::MalformedField { .. })
        ));
    }

    #[test]
    fn test_write_skips_absent_fields() {
        let permit = parse("<permit><filename>x.000</filename></permit>").unwrap();
        let mut writer = Writer::new(Vec::new());
        permit
            .write_xml(&mut writer, &DateFormats::default())
            .unwrap();
        assert_eq!(
            String::from_utf8(writer.into_inner()).unwrap(),
            "<permit><filename>x.000</filename></permit>"
        );
    }

    #[test]
    fn test_validity_window() {
        let permit = DataPermit::from_parts("A.000", 1, expiry(), WRAPPED, ProductSpecification::S101);
        assert!(permit.is_valid_on(expiry()));
        assert!(!permit.is_valid_on(expiry().succ_opt().unwrap()));
    }

    #[test]
    fn test_validate_rejects_short_key() {
        let permit = DataPermit::from_parts("A.000", 1, expiry(), "ABCD", ProductSpecification::S101);
        assert!(matches!(
            permit.validate(),
            Err(PermitError::MalformedField { .. })
        ));
    }
}
