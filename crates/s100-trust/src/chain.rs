//! Root of trust: the scheme administrator certificate.

use tracing::{debug, warn};

use crate::certificate::Certificate;
use crate::error::{Result, TrustError};
use crate::keys::PublicKey;
use crate::signature::Signature;

/// Verifies data server certificates and signed payloads against a root.
#[derive(Debug, Clone)]
pub struct TrustChain {
    root: Certificate,
    root_key: PublicKey,
}

impl TrustChain {
    /// Trust `root`. Its public key must be DSA.
    pub fn new(root: Certificate) -> Result<Self> {
        let root_key = root.public_key()?;
        Ok(Self { root, root_key })
    }

    pub fn root(&self) -> &Certificate {
        &self.root
    }

    pub fn root_key(&self) -> &PublicKey {
        &self.root_key
    }

    /// Check that `certificate` was issued by the root and return its key.
    pub fn verify_data_server(&self, certificate: &Certificate) -> Result<PublicKey> {
        let subject = certificate.subject_common_name();
        // OpenSSL reports a signature over another key type as an error;
        // either way the certificate is not trusted.
        let trusted = certificate.is_signed_by(&self.root_key).unwrap_or(false);
        if !trusted {
            warn!(subject = ?subject, "data server certificate not signed by root");
            return Err(TrustError::TrustFailure(format!(
                "certificate {} is not signed by the root",
                subject.as_deref().unwrap_or("<no CN>")
            )));
        }
        debug!(subject = ?subject, "data server certificate verified");
        certificate.public_key()
    }

    /// Verify `payload` against `signature` made by the data server holding
    /// `certificate`.
    ///
    /// An untrusted certificate is an error; a signature mismatch is `Ok(false)`.
    pub fn verify_signed_payload(
        &self,
        certificate: &Certificate,
        payload: &[u8],
        signature: &Signature,
    ) -> Result<bool> {
        let key = self.verify_data_server(certificate)?;
        let mut session = signature.init_verify(&key)?;
        session.update(payload)?;
        session.verify()
    }
}
