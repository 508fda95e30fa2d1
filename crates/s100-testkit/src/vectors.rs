//! Golden vectors from the standard's worked examples.
//!
//! Any implementation of the scheme must reproduce these exactly.

use serde::Serialize;

use s100_core::{codec, HardwareId, Manufacturer, ProductSpecification, UserPermit, ZeroIvCipher};

/// A device identity and the user permit its manufacturer builds for it.
#[derive(Debug, Clone, Serialize)]
pub struct UserPermitVector {
    pub name: &'static str,
    /// Manufacturer id (M_ID).
    pub m_id: &'static str,
    /// Manufacturer key (M_KEY), hex.
    pub m_key: &'static str,
    /// Plaintext HW-ID, hex.
    pub hw_id: &'static str,
    /// HW-ID under M_KEY, hex.
    pub hw_id_encrypted: &'static str,
    /// CRC-32 of the encrypted HW-ID text.
    pub crc: &'static str,
    pub user_permit: &'static str,
}

/// A data key wrapped under a HW-ID.
#[derive(Debug, Clone, Serialize)]
pub struct KeyWrapVector {
    pub name: &'static str,
    pub hw_id: &'static str,
    pub data_key: &'static str,
    pub encrypted_data_key: &'static str,
}

/// Free-form text and the product specification it names, if any.
#[derive(Debug, Clone, Serialize)]
pub struct ProductVector {
    pub input: &'static str,
    pub number: Option<u16>,
}

pub fn user_permit_vectors() -> Vec<UserPermitVector> {
    vec![
        UserPermitVector {
            name: "manufacturer 859868",
            m_id: "859868",
            m_key: "AD1DAD797C966EC9F6A55B66ED982815",
            hw_id: "3B2B8520ACFC3E96FB4F4537C0C0E426",
            hw_id_encrypted: "AD1DAD797C966EC9F6A55B66ED982815",
            crc: "99B3C7B1",
            user_permit: "AD1DAD797C966EC9F6A55B66ED98281599B3C7B1859868",
        },
        UserPermitVector {
            name: "manufacturer 859868, CRC with leading zeros",
            m_id: "859868",
            m_key: "AD1DAD797C966EC9F6A55B66ED982815",
            hw_id: "3B2B8520ACFC3E96FB4F4537C0C0E474",
            hw_id_encrypted: "2FB780F71BEDD5B8544386DA27473E7E",
            crc: "00CD028B",
            user_permit: "2FB780F71BEDD5B8544386DA27473E7E00CD028B859868",
        },
    ]
}

pub fn key_wrap_vectors() -> Vec<KeyWrapVector> {
    vec![KeyWrapVector {
        name: "data key for 101 cell",
        hw_id: "AB40384B45B54596201114FE99042201",
        data_key: "1C81DFAB4053D04803FFDC87EF92FDD1",
        encrypted_data_key: "172019407CDA6B8C1F545CCDB11B7297",
    }]
}

pub fn product_vectors() -> Vec<ProductVector> {
    vec![
        ProductVector { input: "101", number: Some(101) },
        ProductVector { input: "S101", number: Some(101) },
        ProductVector { input: "S-102", number: Some(102) },
        ProductVector { input: "101NO0000001.000", number: Some(101) },
        ProductVector { input: "S102NOabc.h5", number: Some(102) },
        ProductVector { input: "Bathymetry S-102 and tides S-104", number: Some(104) },
        ProductVector { input: "1000", number: None },
        ProductVector { input: "S-99", number: None },
        ProductVector { input: "chart", number: None },
    ]
}

/// Check one user permit vector in both directions.
pub fn check_user_permit(v: &UserPermitVector) -> bool {
    let Ok(manufacturer) = Manufacturer::new(v.m_id, v.m_key) else {
        return false;
    };
    let Ok(hw_id) = HardwareId::from_hex(v.hw_id) else {
        return false;
    };
    let (Ok(built), Ok(decoded)) = (
        manufacturer.user_permit_for(&hw_id),
        UserPermit::decode(v.user_permit),
    ) else {
        return false;
    };
    built.encode() == v.user_permit
        && built.hw_id_encrypted() == v.hw_id_encrypted
        && built.encrypted_hw_id_crc() == v.crc
        && decoded == built
        && manufacturer.decrypt_hw_id(decoded.hw_id_encrypted()).ok() == Some(hw_id)
}

/// Check one key wrap vector in both directions.
pub fn check_key_wrap(v: &KeyWrapVector) -> bool {
    let (Ok(hw_id), Ok(data_key)) = (
        HardwareId::from_hex(v.hw_id),
        codec::from_hex_array::<16>(v.data_key),
    ) else {
        return false;
    };
    let cipher = ZeroIvCipher::new(hw_id.wrapping_key());
    let wrapped = cipher.encrypt_block(&data_key);
    codec::to_hex(&wrapped) == v.encrypted_data_key && cipher.decrypt_block(&wrapped) == data_key
}

pub fn check_product(v: &ProductVector) -> bool {
    ProductSpecification::try_parse(v.input).map(|p| p.number()) == v.number
}

/// Run every vector. Returns `(name, passed)` pairs.
pub fn verify_all_vectors() -> Vec<(String, bool)> {
    let permits = user_permit_vectors()
        .into_iter()
        .map(|v| (format!("user permit: {}", v.name), check_user_permit(&v)));
    let wraps = key_wrap_vectors()
        .into_iter()
        .map(|v| (format!("key wrap: {}", v.name), check_key_wrap(&v)));
    let products = product_vectors()
        .into_iter()
        .map(|v| (format!("product: {}", v.input), check_product(&v)));
    permits.chain(wraps).chain(products).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_vectors_pass() {
        for (name, passed) in verify_all_vectors() {
            assert!(passed, "vector '{name}' failed");
        }
    }

    #[test]
    fn test_crc_is_of_encrypted_hw_id_text() {
        for v in user_permit_vectors() {
            assert_eq!(codec::crc32_field(v.hw_id_encrypted.as_bytes()), v.crc);
        }
    }

    #[test]
    fn test_corrupted_vector_fails() {
        let mut v = key_wrap_vectors().remove(0);
        v.encrypted_data_key = "172019407CDA6B8C1F545CCDB11B7298";
        assert!(!check_key_wrap(&v));
    }

    #[test]
    fn test_vectors_serialize() {
        let json = serde_json::to_value(user_permit_vectors()).unwrap();
        assert_eq!(json[0]["crc"], "99B3C7B1");
    }
}
