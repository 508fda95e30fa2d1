//! Proptest generators for property-based testing.

use chrono::NaiveDate;
use proptest::prelude::*;

use s100_core::{HardwareId, Manufacturer, ProductSpecification, SymmetricKey};
use s100_permits::DataPermit;

/// Generate a random data key.
pub fn symmetric_key() -> impl Strategy<Value = SymmetricKey> {
    any::<[u8; 16]>().prop_map(SymmetricKey::from_bytes)
}

/// Generate a random HW-ID.
pub fn hardware_id() -> impl Strategy<Value = HardwareId> {
    any::<[u8; 16]>().prop_map(HardwareId::from_bytes)
}

/// Generate a six-character manufacturer id.
pub fn m_id() -> impl Strategy<Value = String> {
    "[A-Z0-9]{6}".prop_map(String::from)
}

/// Generate a manufacturer with a random key.
pub fn manufacturer() -> impl Strategy<Value = Manufacturer> {
    (m_id(), symmetric_key()).prop_map(|(id, key)| Manufacturer::with_key(id, key))
}

/// Generate a product specification in the valid range.
pub fn product_specification() -> impl Strategy<Value = ProductSpecification> {
    (ProductSpecification::MIN..=ProductSpecification::MAX)
        .prop_filter_map("in range", |n| ProductSpecification::new(n).ok())
}

/// Generate a data-set file name in the numeric convention, e.g.
/// `101NO00001234.000`.
pub fn data_set_file_name(product: ProductSpecification) -> impl Strategy<Value = String> {
    ("[A-Z]{2}", 0u32..100_000_000, 0u16..1000)
        .prop_map(move |(producer, serial, update)| {
            format!("{}{producer}{serial:08}.{update:03}", product.number())
        })
}

/// Generate an expiry date between 2000 and 2099.
pub fn expiry_date() -> impl Strategy<Value = NaiveDate> {
    (2000i32..2100, 1u32..=12, 1u32..=28)
        .prop_filter_map("valid date", |(y, m, d)| NaiveDate::from_ymd_opt(y, m, d))
}

/// Generate payload bytes of specified max length.
pub fn payload(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..=max_len)
}

/// Parameters for issuing one data permit.
#[derive(Debug, Clone)]
pub struct PermitParams {
    pub file_name: String,
    pub edition: u32,
    pub expiry: NaiveDate,
    pub data_key: SymmetricKey,
    pub product: ProductSpecification,
}

impl Arbitrary for PermitParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        product_specification()
            .prop_flat_map(|product| {
                (
                    data_set_file_name(product),
                    1u32..10_000,
                    expiry_date(),
                    symmetric_key(),
                    Just(product),
                )
            })
            .prop_map(|(file_name, edition, expiry, data_key, product)| PermitParams {
                file_name,
                edition,
                expiry,
                data_key,
                product,
            })
            .boxed()
    }
}

/// Issue the permit described by `params` for `hw_id`.
pub fn permit_from_params(params: &PermitParams, hw_id: &HardwareId) -> DataPermit {
    DataPermit::issue(
        params.file_name.as_str(),
        params.edition,
        params.expiry,
        &params.data_key,
        hw_id,
        params.product,
    )
}
