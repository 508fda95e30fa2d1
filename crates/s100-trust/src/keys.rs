//! DSA public and private keys.
//!
//! S-100 signs with SHA256withDSA, so only DSA keys are accepted.

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use openssl::dsa::Dsa;
use openssl::pkey::{HasPublic, Id, PKey, PKeyRef, Private, Public};

use crate::error::{Result, TrustError};

const PEM_BEGIN: &str = "-----BEGIN PUBLIC KEY-----\r\n";
const PEM_END: &str = "\r\n-----END PUBLIC KEY-----\r\n";

/// Default modulus size for generated keys.
pub const DEFAULT_KEY_BITS: u32 = 2048;

fn require_dsa<T>(key: &PKeyRef<T>) -> Result<()> {
    if key.id() == Id::DSA {
        Ok(())
    } else {
        Err(TrustError::UnsupportedKeyType(format!(
            "expected DSA, got key type id {}",
            key.id().as_raw()
        )))
    }
}

/// A DSA public key.
#[derive(Clone)]
pub struct PublicKey {
    key: PKey<Public>,
}

impl PublicKey {
    /// Wrap an OpenSSL key, rejecting anything but DSA.
    pub fn from_pkey(key: PKey<Public>) -> Result<Self> {
        require_dsa(&key)?;
        Ok(Self { key })
    }

    /// Parse a DER SubjectPublicKeyInfo.
    pub fn from_der(der: &[u8]) -> Result<Self> {
        Self::from_pkey(PKey::public_key_from_der(der)?)
    }

    /// Parse PEM text.
    ///
    /// Accepts both the single-line CRLF framing produced by
    /// [`to_pem`](Self::to_pem) and ordinary wrapped PEM.
    pub fn from_pem(pem: &str) -> Result<Self> {
        let mut lines = pem.lines().map(str::trim).filter(|l| !l.is_empty());
        match lines.next() {
            Some(l) if l == PEM_BEGIN.trim() => {}
            _ => return Err(TrustError::InvalidPem("missing BEGIN PUBLIC KEY".into())),
        }

        let mut body = String::new();
        let mut closed = false;
        for line in lines {
            if line == PEM_END.trim() {
                closed = true;
                break;
            }
            body.push_str(line);
        }
        if !closed {
            return Err(TrustError::InvalidPem("missing END PUBLIC KEY".into()));
        }

        Self::from_der(&STANDARD.decode(body)?)
    }

    /// DER SubjectPublicKeyInfo.
    pub fn to_der(&self) -> Result<Vec<u8>> {
        Ok(self.key.public_key_to_der()?)
    }

    /// PEM with the body on a single line and CRLF line ends.
    pub fn to_pem(&self) -> Result<String> {
        let body = STANDARD.encode(self.to_der()?);
        Ok(format!("{PEM_BEGIN}{body}{PEM_END}"))
    }

    pub(crate) fn pkey(&self) -> &PKeyRef<Public> {
        &self.key
    }
}

impl PartialEq for PublicKey {
    fn eq(&self, other: &Self) -> bool {
        self.key.public_eq(&other.key)
    }
}

impl Eq for PublicKey {}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey(DSA, {} bits)", self.key.bits())
    }
}

/// A DSA private key, used by data servers and scheme administrators.
#[derive(Clone)]
pub struct PrivateKey {
    key: PKey<Private>,
}

impl PrivateKey {
    /// Generate a fresh DSA key with new domain parameters.
    pub fn generate(bits: u32) -> Result<Self> {
        let dsa = Dsa::generate(bits)?;
        Ok(Self {
            key: PKey::from_dsa(dsa)?,
        })
    }

    /// Parse PEM (PKCS#8 or traditional DSA).
    pub fn from_pem(pem: &[u8]) -> Result<Self> {
        let key = PKey::private_key_from_pem(pem)?;
        require_dsa(&key)?;
        Ok(Self { key })
    }

    /// PKCS#8 PEM.
    pub fn to_pem(&self) -> Result<Vec<u8>> {
        Ok(self.key.private_key_to_pem_pkcs8()?)
    }

    pub fn public_key(&self) -> Result<PublicKey> {
        public_of(&self.key)
    }

    pub(crate) fn pkey(&self) -> &PKeyRef<Private> {
        &self.key
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PrivateKey(DSA, {} bits)", self.key.bits())
    }
}

pub(crate) fn public_of<T: HasPublic>(key: &PKeyRef<T>) -> Result<PublicKey> {
    PublicKey::from_der(&key.public_key_to_der()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_keys;
    use openssl::rsa::Rsa;

    #[test]
    fn test_pem_framing() {
        let key = test_keys::root().public_key().unwrap();
        let pem = key.to_pem().unwrap();
        assert!(pem.starts_with("-----BEGIN PUBLIC KEY-----\r\n"));
        assert!(pem.ends_with("\r\n-----END PUBLIC KEY-----\r\n"));
        // Body is a single line between the BEGIN and END markers.
        assert_eq!(pem.matches("\r\n").count(), 3);
        assert_eq!(pem.lines().count(), 3);
        assert_eq!(PublicKey::from_pem(&pem).unwrap(), key);
    }

    #[test]
    fn test_from_wrapped_pem() {
        let key = test_keys::root().public_key().unwrap();
        let openssl_pem = String::from_utf8(key.pkey().public_key_to_pem().unwrap()).unwrap();
        assert_eq!(PublicKey::from_pem(&openssl_pem).unwrap(), key);
    }

    #[test]
    fn test_bad_pem() {
        assert!(matches!(
            PublicKey::from_pem("hello"),
            Err(TrustError::InvalidPem(_))
        ));
        assert!(matches!(
            PublicKey::from_pem("-----BEGIN PUBLIC KEY-----\r\nAAAA"),
            Err(TrustError::InvalidPem(_))
        ));
        assert!(matches!(
            PublicKey::from_pem("-----BEGIN PUBLIC KEY-----\r\n!!!\r\n-----END PUBLIC KEY-----\r\n"),
            Err(TrustError::InvalidSignatureEncoding(_))
        ));
    }

    #[test]
    fn test_rsa_is_rejected() {
        let rsa = PKey::from_rsa(Rsa::generate(2048).unwrap()).unwrap();
        let der = rsa.public_key_to_der().unwrap();
        assert!(matches!(
            PublicKey::from_der(&der),
            Err(TrustError::UnsupportedKeyType(_))
        ));

        let pem = rsa.private_key_to_pem_pkcs8().unwrap();
        assert!(matches!(
            PrivateKey::from_pem(&pem),
            Err(TrustError::UnsupportedKeyType(_))
        ));
    }

    #[test]
    fn test_private_key_pem_roundtrip() {
        let key = test_keys::root();
        let back = PrivateKey::from_pem(&key.to_pem().unwrap()).unwrap();
        assert_eq!(back.public_key().unwrap(), key.public_key().unwrap());
    }

    #[test]
    fn test_debug_shows_no_key_material() {
        let debug = format!("{:?}", test_keys::root());
        assert!(debug.starts_with("PrivateKey(DSA"));
    }
}
