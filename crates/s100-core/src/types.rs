//! Strong type definitions for S-100 key material.
//!
//! Keys and hardware identifiers are newtypes so that a HW-ID can never be
//! passed where a manufacturer key is expected without an explicit conversion.

use std::fmt;

use rand::rngs::OsRng;
use rand::RngCore;

use crate::codec;
use crate::error::{CoreError, Result};

/// Size of an AES-128 key in bytes.
pub const KEY_SIZE: usize = 16;

/// Length of a hex-encoded AES-128 key.
pub const KEY_SIZE_ENCODED: usize = KEY_SIZE * 2;

/// A 128-bit AES key, exchanged as 32 uppercase hex characters.
#[derive(Clone, PartialEq, Eq)]
pub struct SymmetricKey([u8; KEY_SIZE]);

impl SymmetricKey {
    /// Generate a new random key from the OS CSPRNG.
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_SIZE];
        OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }

    /// Import a key from its 32-character hex form.
    pub fn from_hex(s: &str) -> Result<Self> {
        if s.len() != KEY_SIZE_ENCODED {
            return Err(CoreError::InvalidKeyLength {
                expected: KEY_SIZE_ENCODED,
                actual: s.len(),
            });
        }
        Ok(Self(codec::from_hex_array(s)?))
    }

    /// Export as 32 uppercase hex characters.
    pub fn to_hex(&self) -> String {
        codec::to_hex(&self.0)
    }
}

impl fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SymmetricKey(..)")
    }
}

impl From<[u8; KEY_SIZE]> for SymmetricKey {
    fn from(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }
}

impl TryFrom<&[u8]> for SymmetricKey {
    type Error = CoreError;

    fn try_from(slice: &[u8]) -> Result<Self> {
        let arr: [u8; KEY_SIZE] = slice.try_into().map_err(|_| CoreError::InvalidKeyLength {
            expected: KEY_SIZE,
            actual: slice.len(),
        })?;
        Ok(Self(arr))
    }
}

/// A 16-byte device hardware identifier.
///
/// The plaintext HW-ID doubles as the key under which data keys are wrapped,
/// so it is only ever carried encrypted outside the device and the data server.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct HardwareId([u8; KEY_SIZE]);

impl HardwareId {
    /// Create a random HW-ID for device enrollment.
    ///
    /// A HW-ID is a self-identification value rather than a secret chosen by
    /// an attacker, so the thread-local generator is sufficient here.
    pub fn random() -> Self {
        let mut bytes = [0u8; KEY_SIZE];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }

    /// Parse from 32 hex characters.
    pub fn from_hex(s: &str) -> Result<Self> {
        if s.len() != KEY_SIZE_ENCODED {
            return Err(CoreError::InvalidFieldLength {
                field: "HW_ID",
                expected: KEY_SIZE_ENCODED,
                actual: s.len(),
            });
        }
        Ok(Self(codec::from_hex_array(s)?))
    }

    /// Convert to 32 uppercase hex characters.
    pub fn to_hex(&self) -> String {
        codec::to_hex(&self.0)
    }

    /// The key used to wrap data keys for this device.
    pub fn wrapping_key(&self) -> SymmetricKey {
        SymmetricKey(self.0)
    }
}

impl fmt::Debug for HardwareId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("HardwareId(..)")
    }
}

impl From<[u8; KEY_SIZE]> for HardwareId {
    fn from(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }
}
