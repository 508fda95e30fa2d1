//! Manufacturers and their HW-ID encryption keys.

use std::fmt;

use crate::codec;
use crate::crypto::{DataCipher, ZeroIvCipher};
use crate::error::Result;
use crate::types::{HardwareId, SymmetricKey};
use crate::user_permit::UserPermit;

/// A device manufacturer, identified by its M_ID and holding the M_KEY that
/// encrypts HW-IDs of its devices.
#[derive(Clone, PartialEq, Eq)]
pub struct Manufacturer {
    id: String,
    key: SymmetricKey,
}

impl Manufacturer {
    /// Create from an id and a 32-character hex key.
    pub fn new(id: impl Into<String>, key_hex: &str) -> Result<Self> {
        Ok(Self::with_key(id, SymmetricKey::from_hex(key_hex)?))
    }

    pub fn with_key(id: impl Into<String>, key: SymmetricKey) -> Self {
        Self { id: id.into(), key }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    fn cipher(&self) -> ZeroIvCipher {
        ZeroIvCipher::new(self.key.clone())
    }

    /// Encrypt hex text under the manufacturer key, returning hex.
    pub fn encrypt(&self, plaintext_hex: &str) -> Result<String> {
        let data = codec::from_hex(plaintext_hex)?;
        Ok(codec::to_hex(&self.cipher().encrypt(&data)?))
    }

    /// Decrypt hex text under the manufacturer key, returning hex.
    pub fn decrypt(&self, ciphertext_hex: &str) -> Result<String> {
        let data = codec::from_hex(ciphertext_hex)?;
        Ok(codec::to_hex(&self.cipher().decrypt(&data)?))
    }

    /// Encrypt a HW-ID to the 32 hex characters carried in a user permit.
    pub fn encrypt_hw_id(&self, hw_id: &HardwareId) -> String {
        codec::to_hex(&self.cipher().encrypt_block(hw_id.as_bytes()))
    }

    /// Recover the plaintext HW-ID from its encrypted hex form.
    pub fn decrypt_hw_id(&self, hw_id_encrypted: &str) -> Result<HardwareId> {
        let encrypted = HardwareId::from_hex(hw_id_encrypted)?;
        let plain = self.cipher().decrypt_block(encrypted.as_bytes());
        Ok(HardwareId::from_bytes(plain))
    }

    /// The user permit for one of this manufacturer's devices.
    pub fn user_permit_for(&self, hw_id: &HardwareId) -> Result<UserPermit> {
        UserPermit::new(self.encrypt_hw_id(hw_id), self.id.clone())
    }
}

impl fmt::Debug for Manufacturer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Manufacturer")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;

    fn manufacturer() -> Manufacturer {
        Manufacturer::new("859868", "AD1DAD797C966EC9F6A55B66ED982815").unwrap()
    }

    #[test]
    fn test_hex_encrypt_vector() {
        let m = manufacturer();
        let encrypted = m.encrypt("3B2B8520ACFC3E96FB4F4537C0C0E426").unwrap();
        assert_eq!(encrypted, "AD1DAD797C966EC9F6A55B66ED982815");
        assert_eq!(m.decrypt(&encrypted).unwrap(), "3B2B8520ACFC3E96FB4F4537C0C0E426");
    }

    #[test]
    fn test_user_permit_for_device() {
        let m = manufacturer();
        let hw_id = HardwareId::from_hex("3B2B8520ACFC3E96FB4F4537C0C0E426").unwrap();
        let permit = m.user_permit_for(&hw_id).unwrap();
        assert_eq!(
            permit.encode(),
            "AD1DAD797C966EC9F6A55B66ED98281599B3C7B1859868"
        );
        assert_eq!(m.decrypt_hw_id(permit.hw_id_encrypted()).unwrap(), hw_id);
    }

    #[test]
    fn test_invalid_key() {
        assert!(matches!(
            Manufacturer::new("859868", "AD1D"),
            Err(CoreError::InvalidKeyLength { .. })
        ));
    }

    #[test]
    fn test_hex_encrypt_rejects_partial_block() {
        assert!(matches!(
            manufacturer().encrypt("0011"),
            Err(CoreError::InvalidBlockLength(2))
        ));
    }

    #[test]
    fn test_debug_hides_key() {
        let debug = format!("{:?}", manufacturer());
        assert!(debug.contains("859868"));
        assert!(!debug.contains("AD1DAD"));
    }
}
