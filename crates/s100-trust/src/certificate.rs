//! X.509 certificates.

use std::fmt;

use openssl::asn1::Asn1Time;
use openssl::bn::{BigNum, MsbOption};
use openssl::hash::MessageDigest;
use openssl::nid::Nid;
use openssl::pkey::{HasPublic, PKeyRef};
use openssl::x509::extension::{BasicConstraints, KeyUsage};
use openssl::x509::{X509Name, X509NameRef, X509};

use crate::error::{Result, TrustError};
use crate::keys::{PrivateKey, PublicKey};

const X509_VERSION_3: i32 = 2;

/// A parsed X.509 certificate.
#[derive(Clone)]
pub struct Certificate {
    x509: X509,
}

impl Certificate {
    /// Parse DER bytes.
    pub fn from_der(der: &[u8]) -> Result<Self> {
        Ok(Self {
            x509: X509::from_der(der)?,
        })
    }

    /// Parse a PEM `CERTIFICATE` block.
    pub fn from_pem(pem: &[u8]) -> Result<Self> {
        Ok(Self {
            x509: X509::from_pem(pem)?,
        })
    }

    pub fn to_der(&self) -> Result<Vec<u8>> {
        Ok(self.x509.to_der()?)
    }

    /// PEM text of the certificate.
    pub fn to_pem(&self) -> Result<String> {
        let pem = self.x509.to_pem()?;
        String::from_utf8(pem).map_err(|e| TrustError::InvalidPem(e.to_string()))
    }

    /// The subject public key. Fails unless it is a DSA key.
    pub fn public_key(&self) -> Result<PublicKey> {
        PublicKey::from_pkey(self.x509.public_key()?)
    }

    /// Subject CN, if present and valid UTF-8.
    pub fn subject_common_name(&self) -> Option<String> {
        self.x509
            .subject_name()
            .entries_by_nid(Nid::COMMONNAME)
            .next()
            .and_then(|entry| entry.data().to_string().ok())
    }

    /// Whether this certificate's signature verifies under `issuer_key`.
    pub fn is_signed_by(&self, issuer_key: &PublicKey) -> Result<bool> {
        Ok(self.x509.verify(issuer_key.pkey())?)
    }

    pub(crate) fn subject_name(&self) -> &X509NameRef {
        self.x509.subject_name()
    }
}

impl PartialEq for Certificate {
    fn eq(&self, other: &Self) -> bool {
        match (self.to_der(), other.to_der()) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Debug for Certificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Certificate")
            .field("subject", &self.subject_common_name())
            .finish_non_exhaustive()
    }
}

/// Issues DSA certificates signed with SHA-256: self-signed roots for a scheme
/// administrator, and data server certificates under such a root.
#[derive(Debug, Clone)]
pub struct CertificateBuilder {
    common_name: String,
    organization: Option<String>,
    validity_days: u32,
    ca: bool,
}

impl CertificateBuilder {
    pub fn new(common_name: impl Into<String>) -> Self {
        Self {
            common_name: common_name.into(),
            organization: None,
            validity_days: 365,
            ca: false,
        }
    }

    pub fn organization(mut self, organization: impl Into<String>) -> Self {
        self.organization = Some(organization.into());
        self
    }

    pub fn validity_days(mut self, days: u32) -> Self {
        self.validity_days = days;
        self
    }

    /// Mark the certificate as a CA (basic constraints, key cert sign).
    pub fn ca(mut self) -> Self {
        self.ca = true;
        self
    }

    /// A self-signed certificate for `key`.
    pub fn self_signed(&self, key: &PrivateKey) -> Result<Certificate> {
        self.build(key.pkey(), None, key)
    }

    /// A certificate for `subject_key`, issued by `issuer`.
    pub fn signed_by(
        &self,
        subject_key: &PublicKey,
        issuer: &Certificate,
        issuer_key: &PrivateKey,
    ) -> Result<Certificate> {
        self.build(subject_key.pkey(), Some(issuer.subject_name()), issuer_key)
    }

    fn build<T: HasPublic>(
        &self,
        subject_key: &PKeyRef<T>,
        issuer_name: Option<&X509NameRef>,
        signing_key: &PrivateKey,
    ) -> Result<Certificate> {
        let mut builder = X509::builder()?;
        builder.set_version(X509_VERSION_3)?;

        let mut serial = BigNum::new()?;
        serial.rand(128, MsbOption::MAYBE_ZERO, false)?;
        let serial = serial.to_asn1_integer()?;
        builder.set_serial_number(&serial)?;

        let mut name = X509Name::builder()?;
        name.append_entry_by_nid(Nid::COMMONNAME, &self.common_name)?;
        if let Some(org) = &self.organization {
            name.append_entry_by_nid(Nid::ORGANIZATIONNAME, org)?;
        }
        let name = name.build();
        builder.set_subject_name(&name)?;
        builder.set_issuer_name(issuer_name.unwrap_or(&name))?;

        let not_before = Asn1Time::days_from_now(0)?;
        let not_after = Asn1Time::days_from_now(self.validity_days)?;
        builder.set_not_before(&not_before)?;
        builder.set_not_after(&not_after)?;
        builder.set_pubkey(subject_key)?;

        if self.ca {
            builder.append_extension(BasicConstraints::new().critical().ca().build()?)?;
            builder.append_extension(
                KeyUsage::new()
                    .critical()
                    .key_cert_sign()
                    .digital_signature()
                    .build()?,
            )?;
        } else {
            builder.append_extension(KeyUsage::new().critical().digital_signature().build()?)?;
        }

        builder.sign(signing_key.pkey(), MessageDigest::sha256())?;
        Ok(Certificate {
            x509: builder.build(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_keys;

    #[test]
    fn test_der_and_pem_roundtrip() {
        let cert = test_keys::root_certificate();
        let from_der = Certificate::from_der(&cert.to_der().unwrap()).unwrap();
        assert_eq!(from_der, *cert);

        let pem = cert.to_pem().unwrap();
        assert!(pem.starts_with("-----BEGIN CERTIFICATE-----"));
        let from_pem = Certificate::from_pem(pem.as_bytes()).unwrap();
        assert_eq!(from_pem, *cert);
    }

    #[test]
    fn test_subject_and_key() {
        let cert = test_keys::data_server_certificate();
        assert_eq!(cert.subject_common_name().as_deref(), Some("Test Data Server"));
        assert_eq!(
            cert.public_key().unwrap(),
            test_keys::data_server().public_key().unwrap()
        );
    }

    #[test]
    fn test_signed_by_issuer_only() {
        let root_key = test_keys::root().public_key().unwrap();
        let server_key = test_keys::data_server().public_key().unwrap();
        let cert = test_keys::data_server_certificate();

        assert!(cert.is_signed_by(&root_key).unwrap());
        assert!(test_keys::root_certificate().is_signed_by(&root_key).unwrap());
        assert!(!cert.is_signed_by(&server_key).unwrap_or(false));
    }

    #[test]
    fn test_garbage_der_fails() {
        assert!(matches!(
            Certificate::from_der(b"not a certificate"),
            Err(TrustError::OpenSsl(_))
        ));
    }
}
