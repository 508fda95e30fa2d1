//! The 46-character user permit a device presents to a data server.
//!
//! Layout: `[0..32]` encrypted HW-ID (hex), `[32..40]` CRC-32 of those 32
//! ASCII characters (uppercase hex), `[40..46]` manufacturer id.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::codec;
use crate::error::{CoreError, Result};
use crate::types::{HardwareId, KEY_SIZE_ENCODED};

/// Length of an encoded user permit.
pub const USER_PERMIT_LEN: usize = 46;

/// Length of the CRC field.
pub const CRC_LEN: usize = 8;

/// Length of a manufacturer id.
pub const M_ID_LEN: usize = 6;

const CRC_START: usize = KEY_SIZE_ENCODED;
const M_ID_START: usize = CRC_START + CRC_LEN;

/// A decoded user permit. The CRC is always derived, never stored.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct UserPermit {
    hw_id_encrypted: String,
    m_id: String,
}

impl UserPermit {
    /// Build from an encrypted HW-ID (32 hex characters) and manufacturer id
    /// (6 characters).
    pub fn new(hw_id_encrypted: impl Into<String>, m_id: impl Into<String>) -> Result<Self> {
        let hw_id_encrypted = hw_id_encrypted.into();
        let m_id = m_id.into();

        check_hw_id(&hw_id_encrypted)?;
        if m_id.chars().count() != M_ID_LEN {
            return Err(CoreError::InvalidFieldLength {
                field: "M_ID",
                expected: M_ID_LEN,
                actual: m_id.chars().count(),
            });
        }
        if !m_id.is_ascii() {
            return Err(CoreError::InvalidCharacters { field: "M_ID" });
        }

        Ok(Self {
            hw_id_encrypted,
            m_id,
        })
    }

    /// Parse and integrity-check a 46-character user permit string.
    pub fn decode(permit: &str) -> Result<Self> {
        if !permit.is_ascii() {
            return Err(CoreError::InvalidCharacters {
                field: "user permit",
            });
        }
        if permit.len() != USER_PERMIT_LEN {
            return Err(CoreError::InvalidFieldLength {
                field: "user permit",
                expected: USER_PERMIT_LEN,
                actual: permit.len(),
            });
        }

        let hw_id_encrypted = &permit[..CRC_START];
        let found = &permit[CRC_START..M_ID_START];
        let m_id = &permit[M_ID_START..];

        let expected = codec::crc32_field(hw_id_encrypted.as_bytes());
        if found != expected {
            return Err(CoreError::ChecksumMismatch {
                expected,
                found: found.to_string(),
            });
        }

        check_hw_id(hw_id_encrypted)?;

        Ok(Self {
            hw_id_encrypted: hw_id_encrypted.to_string(),
            m_id: m_id.to_string(),
        })
    }

    /// The encrypted HW-ID as 32 hex characters.
    pub fn hw_id_encrypted(&self) -> &str {
        &self.hw_id_encrypted
    }

    /// The manufacturer id.
    pub fn m_id(&self) -> &str {
        &self.m_id
    }

    /// CRC-32 of the encrypted HW-ID, as it appears in the encoded permit.
    pub fn encrypted_hw_id_crc(&self) -> String {
        codec::crc32_field(self.hw_id_encrypted.as_bytes())
    }

    /// The 46-character encoded form.
    pub fn encode(&self) -> String {
        let mut s = String::with_capacity(USER_PERMIT_LEN);
        s.push_str(&self.hw_id_encrypted);
        s.push_str(&self.encrypted_hw_id_crc());
        s.push_str(&self.m_id);
        s
    }

    /// A fresh random HW-ID as 32 hex characters, for device enrollment.
    pub fn random_hardware_id() -> String {
        HardwareId::random().to_hex()
    }
}

fn check_hw_id(hw_id_encrypted: &str) -> Result<()> {
    if hw_id_encrypted.len() != KEY_SIZE_ENCODED {
        return Err(CoreError::InvalidFieldLength {
            field: "encrypted HW_ID",
            expected: KEY_SIZE_ENCODED,
            actual: hw_id_encrypted.chars().count(),
        });
    }
    if !codec::is_hex(hw_id_encrypted) {
        return Err(CoreError::InvalidCharacters {
            field: "encrypted HW_ID",
        });
    }
    Ok(())
}

impl fmt::Display for UserPermit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl fmt::Debug for UserPermit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UserPermit({})", self.encode())
    }
}

impl FromStr for UserPermit {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::decode(s)
    }
}

impl Serialize for UserPermit {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.encode())
    }
}

impl<'de> Deserialize<'de> for UserPermit {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::decode(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENCODED: &str = "AD1DAD797C966EC9F6A55B66ED98281599B3C7B1859868";

    #[test]
    fn test_encode_worked_example() {
        let permit = UserPermit::new("AD1DAD797C966EC9F6A55B66ED982815", "859868").unwrap();
        assert_eq!(permit.encrypted_hw_id_crc(), "99B3C7B1");
        assert_eq!(permit.encode(), ENCODED);
        assert_eq!(permit.to_string().len(), USER_PERMIT_LEN);
    }

    #[test]
    fn test_decode_worked_example() {
        let permit = UserPermit::decode(ENCODED).unwrap();
        assert_eq!(permit.hw_id_encrypted(), "AD1DAD797C966EC9F6A55B66ED982815");
        assert_eq!(permit.m_id(), "859868");
        assert_eq!(ENCODED.parse::<UserPermit>().unwrap(), permit);
    }

    #[test]
    fn test_every_crc_flip_is_detected() {
        for i in CRC_START..M_ID_START {
            let mut bytes = ENCODED.as_bytes().to_vec();
            bytes[i] = if bytes[i] == b'0' { b'1' } else { b'0' };
            let tampered = String::from_utf8(bytes).unwrap();
            assert!(
                matches!(
                    UserPermit::decode(&tampered),
                    Err(CoreError::ChecksumMismatch { .. })
                ),
                "position {i}"
            );
        }
    }

    #[test]
    fn test_hw_id_tampering_is_detected() {
        let tampered = ENCODED.replacen("AD1D", "AD1E", 1);
        assert!(matches!(
            UserPermit::decode(&tampered),
            Err(CoreError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn test_crc_is_case_sensitive() {
        let lower = ENCODED.replace("99B3C7B1", "99b3c7b1");
        assert!(matches!(
            UserPermit::decode(&lower),
            Err(CoreError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn test_field_lengths() {
        assert!(matches!(
            UserPermit::decode(&ENCODED[..45]),
            Err(CoreError::InvalidFieldLength { expected: 46, .. })
        ));
        assert!(matches!(
            UserPermit::new("AD1DAD", "859868"),
            Err(CoreError::InvalidFieldLength { expected: 32, .. })
        ));
        assert!(matches!(
            UserPermit::new("AD1DAD797C966EC9F6A55B66ED982815", "85986"),
            Err(CoreError::InvalidFieldLength { expected: 6, .. })
        ));
    }

    #[test]
    fn test_non_ascii_is_rejected_before_length() {
        // 46 characters, 47 bytes.
        let permit = format!("É{}", &ENCODED[1..]);
        assert_eq!(permit.chars().count(), USER_PERMIT_LEN);
        assert!(matches!(
            UserPermit::decode(&permit),
            Err(CoreError::InvalidCharacters { field: "user permit" })
        ));
    }

    #[test]
    fn test_crc_keeps_leading_zeros() {
        let permit = UserPermit::new("2FB780F71BEDD5B8544386DA27473E7E", "859868").unwrap();
        assert_eq!(permit.encrypted_hw_id_crc(), "00CD028B");
        let encoded = permit.encode();
        assert_eq!(encoded, "2FB780F71BEDD5B8544386DA27473E7E00CD028B859868");
        assert_eq!(UserPermit::decode(&encoded).unwrap(), permit);

        // The unpadded form does not fill the CRC slot.
        let unpadded = "2FB780F71BEDD5B8544386DA27473E7ECD028B859868";
        assert!(matches!(
            UserPermit::decode(unpadded),
            Err(CoreError::InvalidFieldLength { actual: 44, .. })
        ));
    }

    #[test]
    fn test_non_hex_hw_id_is_rejected() {
        assert!(matches!(
            UserPermit::new("XD1DAD797C966EC9F6A55B66ED982815", "859868"),
            Err(CoreError::InvalidCharacters { .. })
        ));
    }

    #[test]
    fn test_random_hardware_id() {
        let a = UserPermit::random_hardware_id();
        assert_eq!(a.len(), 32);
        assert!(codec::is_hex(&a));
        assert_ne!(a, UserPermit::random_hardware_id());
    }

    #[test]
    fn test_serde_as_string() {
        let permit = UserPermit::decode(ENCODED).unwrap();
        let json = serde_json::to_string(&permit).unwrap();
        assert_eq!(json, format!("\"{ENCODED}\""));
        let back: UserPermit = serde_json::from_str(&json).unwrap();
        assert_eq!(back, permit);
    }
}
