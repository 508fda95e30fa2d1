//! The permit file (`PERMIT.XML`): all data permits issued to one device.
//!
//! ```text
//! <permit>
//!   <header>
//!     <date>20240305 03:04:05</date>
//!     <dataserver>...</dataserver>        (optional)
//!     <version>1.0.0</version>
//!     <userpermit>46 characters</userpermit>
//!   </header>
//!   <products>
//!     <product id="S-101">
//!       <permit>...</permit>               (one per data-set file)
//!     </product>
//!   </products>
//! </permit>
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate, NaiveDateTime};
use quick_xml::events::{BytesDecl, BytesStart, Event};
use quick_xml::{Reader, Writer};
use tracing::{debug, trace, warn};

use s100_core::{HardwareId, ProductSpecification, SymmetricKey, UserPermit};

use crate::data_permit::{DataPermit, LEGACY_PERMIT_ELEMENT, PERMIT_ELEMENT};
use crate::date_format::DateFormats;
use crate::error::{PermitError, Result};
use crate::registry::ManufacturerLookup;
use crate::xml;

/// Canonical file name of a permit file.
pub const PERMIT_FILE_NAME: &str = "PERMIT.XML";

/// Protocol version written to the header.
pub const PERMIT_FILE_VERSION: &str = "1.0.0";

const ROOT_ELEMENT: &str = "permit";
const HEADER_ELEMENT: &str = "header";
const DATE_ELEMENT: &str = "date";
const DATASERVER_ELEMENT: &str = "dataserver";
const VERSION_ELEMENT: &str = "version";
const USERPERMIT_ELEMENT: &str = "userpermit";
const PRODUCTS_ELEMENT: &str = "products";
const PRODUCT_ELEMENT: &str = "product";
const ID_ATTRIBUTE: &str = "id";

/// Data permits for one device, grouped by product specification.
///
/// Products are kept in numeric order and permits within a product in file
/// name order, so serialization is deterministic. A permit whose file name is
/// already present under the same product is not added again.
#[derive(Debug, Clone)]
pub struct PermitFile {
    issue_date: NaiveDateTime,
    data_server: Option<String>,
    user_permit: UserPermit,
    hw_id: HardwareId,
    permits: BTreeMap<ProductSpecification, BTreeSet<DataPermit>>,
}

impl PermitFile {
    /// Start an empty permit file for a device, dated now.
    pub fn new(data_server: Option<String>, hw_id: HardwareId, user_permit: UserPermit) -> Self {
        Self {
            issue_date: Local::now().naive_local(),
            data_server,
            user_permit,
            hw_id,
            permits: BTreeMap::new(),
        }
    }

    pub fn with_issue_date(mut self, issue_date: NaiveDateTime) -> Self {
        self.issue_date = issue_date;
        self
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Reading
    // ─────────────────────────────────────────────────────────────────────────

    /// Read a permit file and recover the device HW-ID.
    ///
    /// The user permit in the header is decoded and CRC-checked, its
    /// manufacturer looked up in `lookup`, and the HW-ID decrypted with the
    /// manufacturer key.
    pub fn read_from<L, R>(lookup: &L, reader: R) -> Result<Self>
    where
        L: ManufacturerLookup + ?Sized,
        R: BufRead,
    {
        Self::read_with_formats(lookup, reader, &DateFormats::default())
    }

    pub fn read_with_formats<L, R>(lookup: &L, reader: R, formats: &DateFormats) -> Result<Self>
    where
        L: ManufacturerLookup + ?Sized,
        R: BufRead,
    {
        let mut reader = Reader::from_reader(reader);
        reader.trim_text(true);
        let mut buf = Vec::new();

        let mut issue_date = None;
        let mut user_permit = None;
        let mut data_server = None;
        let mut current_product: Option<ProductSpecification> = None;
        let mut permits: BTreeMap<ProductSpecification, BTreeSet<DataPermit>> = BTreeMap::new();

        loop {
            let event = reader.read_event_into(&mut buf)?;
            let start = match event {
                Event::Start(e) => {
                    let name = e.local_name().as_ref().to_vec();
                    let product_id = if name == PRODUCT_ELEMENT.as_bytes() {
                        let attr = e.try_get_attribute(ID_ATTRIBUTE)?;
                        Some(match attr {
                            Some(a) => a.unescape_value()?.into_owned(),
                            None => return Err(PermitError::MissingElement("product id")),
                        })
                    } else {
                        None
                    };
                    Some((name, product_id))
                }
                Event::End(e) => {
                    if e.local_name().as_ref() == PRODUCT_ELEMENT.as_bytes() {
                        current_product = None;
                    }
                    None
                }
                Event::Eof => break,
                _ => None,
            };
            buf.clear();
            let Some((name, product_id)) = start else { continue };

            match name.as_slice() {
                b"date" => {
                    let text = xml::read_text(&mut reader, &mut buf)?;
                    issue_date = Some(formats.parse_header(&text)?);
                }
                b"userpermit" => {
                    let text = xml::read_text(&mut reader, &mut buf)?;
                    user_permit = Some(UserPermit::decode(text.trim())?);
                }
                b"dataserver" => data_server = Some(xml::read_text(&mut reader, &mut buf)?),
                b"version" => {
                    let version = xml::read_text(&mut reader, &mut buf)?;
                    trace!(%version, "permit file version");
                }
                b"product" => {
                    let id = product_id.unwrap_or_default();
                    current_product = Some(ProductSpecification::parse(&id)?);
                }
                n if n == PERMIT_ELEMENT.as_bytes() || n == LEGACY_PERMIT_ELEMENT.as_bytes() => {
                    // The root element is also called `permit`; entries only
                    // count inside a product.
                    if let Some(product) = current_product {
                        let permit =
                            DataPermit::read_xml(product, formats, &mut reader, &mut buf)?;
                        let file_name = permit.file_name().map(str::to_string);
                        if !permits.entry(product).or_default().insert(permit) {
                            warn!(
                                product = %product,
                                file_name = file_name.as_deref().unwrap_or("<none>"),
                                "dropping permit entry with a file name already present"
                            );
                        }
                    }
                }
                _ => {}
            }
        }

        let issue_date = issue_date.ok_or(PermitError::MissingElement(DATE_ELEMENT))?;
        let user_permit = user_permit.ok_or(PermitError::MissingElement(USERPERMIT_ELEMENT))?;

        let m_id = user_permit.m_id();
        let manufacturer = lookup.manufacturer_for_id(m_id).ok_or_else(|| {
            warn!(m_id, "permit file names an unknown manufacturer");
            PermitError::UnknownManufacturer(m_id.to_string())
        })?;
        let hw_id = manufacturer
            .decrypt_hw_id(user_permit.hw_id_encrypted())
            .map_err(|e| {
                PermitError::TrustFailure(format!("could not decrypt HW_ID from user permit: {e}"))
            })?;

        let file = Self {
            issue_date,
            data_server,
            user_permit,
            hw_id,
            permits,
        };
        debug!(
            m_id = file.user_permit.m_id(),
            products = file.permits.len(),
            permits = file.len(),
            "read permit file"
        );
        Ok(file)
    }

    pub fn from_bytes<L: ManufacturerLookup + ?Sized>(lookup: &L, bytes: &[u8]) -> Result<Self> {
        Self::read_from(lookup, bytes)
    }

    /// Read a permit file from disk.
    pub fn open<L: ManufacturerLookup + ?Sized>(lookup: &L, path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        Self::read_from(lookup, BufReader::new(file))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Writing
    // ─────────────────────────────────────────────────────────────────────────

    /// Serialize as UTF-8 XML.
    pub fn write_to<W: Write>(&self, out: W, formats: &DateFormats) -> Result<()> {
        let mut writer = Writer::new(out);
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;

        xml::write_start(&mut writer, BytesStart::new(ROOT_ELEMENT))?;

        xml::write_start(&mut writer, BytesStart::new(HEADER_ELEMENT))?;
        xml::write_text_element(
            &mut writer,
            DATE_ELEMENT,
            &formats.format_header(&self.issue_date)?,
        )?;
        if let Some(data_server) = &self.data_server {
            xml::write_text_element(&mut writer, DATASERVER_ELEMENT, data_server)?;
        }
        xml::write_text_element(&mut writer, VERSION_ELEMENT, PERMIT_FILE_VERSION)?;
        xml::write_text_element(&mut writer, USERPERMIT_ELEMENT, &self.user_permit.encode())?;
        xml::write_end(&mut writer, HEADER_ELEMENT)?;

        xml::write_start(&mut writer, BytesStart::new(PRODUCTS_ELEMENT))?;
        for (product, permits) in &self.permits {
            let name = product.name();
            let mut start = BytesStart::new(PRODUCT_ELEMENT);
            start.push_attribute((ID_ATTRIBUTE, name.as_str()));
            xml::write_start(&mut writer, start)?;
            for permit in permits {
                permit.write_xml(&mut writer, formats)?;
            }
            xml::write_end(&mut writer, PRODUCT_ELEMENT)?;
        }
        xml::write_end(&mut writer, PRODUCTS_ELEMENT)?;

        xml::write_end(&mut writer, ROOT_ELEMENT)?;
        writer.into_inner().flush()?;
        Ok(())
    }

    pub fn to_bytes(&self, formats: &DateFormats) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.write_to(&mut out, formats)?;
        Ok(out)
    }

    /// Write `PERMIT.XML` into `dir`, returning its path.
    pub fn save(&self, dir: impl AsRef<Path>, formats: &DateFormats) -> Result<PathBuf> {
        let path = dir.as_ref().join(PERMIT_FILE_NAME);
        let file = File::create(&path)?;
        self.write_to(BufWriter::new(file), formats)?;
        Ok(path)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Permits
    // ─────────────────────────────────────────────────────────────────────────

    /// Add a permit under its product specification.
    ///
    /// Returns false if a permit for the same file name is already there.
    pub fn add(&mut self, permit: DataPermit) -> bool {
        self.permits
            .entry(permit.product_specification())
            .or_default()
            .insert(permit)
    }

    pub fn add_all<I: IntoIterator<Item = DataPermit>>(&mut self, permits: I) {
        for permit in permits {
            self.add(permit);
        }
    }

    /// Issue a permit for this file's device and add it.
    pub fn issue(
        &mut self,
        file_name: impl Into<String>,
        edition: u32,
        expiry: NaiveDate,
        data_key: &SymmetricKey,
        product_specification: ProductSpecification,
    ) -> bool {
        let permit = DataPermit::issue(
            file_name,
            edition,
            expiry,
            data_key,
            &self.hw_id,
            product_specification,
        );
        self.add(permit)
    }

    /// Permits for one product specification, in file name order.
    pub fn get(
        &self,
        product_specification: ProductSpecification,
    ) -> impl Iterator<Item = &DataPermit> + '_ {
        self.permits
            .get(&product_specification)
            .into_iter()
            .flat_map(|set| set.iter())
    }

    /// All permits, by product specification then file name.
    pub fn all(&self) -> impl Iterator<Item = &DataPermit> + '_ {
        self.permits.values().flat_map(|set| set.iter())
    }

    /// The product specifications that have permits.
    pub fn product_specifications(&self) -> impl Iterator<Item = ProductSpecification> + '_ {
        self.permits.keys().copied()
    }

    /// Find a permit by data-set file name.
    pub fn find(&self, file_name: &str) -> Option<&DataPermit> {
        self.all().find(|p| p.file_name() == Some(file_name))
    }

    pub fn len(&self) -> usize {
        self.permits.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Header
    // ─────────────────────────────────────────────────────────────────────────

    pub fn issue_date(&self) -> NaiveDateTime {
        self.issue_date
    }

    pub fn data_server(&self) -> Option<&str> {
        self.data_server.as_deref()
    }

    pub fn user_permit(&self) -> &UserPermit {
        &self.user_permit
    }

    /// The plaintext HW-ID. Held in memory only, never serialized.
    pub fn hardware_id(&self) -> &HardwareId {
        &self.hw_id
    }
}
