//! SHA256withDSA signatures.
//!
//! Signing and verifying happen in single-use sessions:
//!
//! ```rust,no_run
//! # use s100_trust::{PrivateKey, Signature};
//! # fn example(key: &PrivateKey) -> s100_trust::Result<()> {
//! let mut session = Signature::init_sign(key)?;
//! session.update(b"payload")?;
//! let signature = session.sign()?;
//!
//! let public = key.public_key()?;
//! let mut check = signature.init_verify(&public)?;
//! check.update(b"payload")?;
//! assert!(check.verify()?);
//! # Ok(())
//! # }
//! ```
//!
//! A session that never receives `update` signs or verifies the empty message.

use std::fmt;
use std::io;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use openssl::hash::MessageDigest;
use openssl::sign::{Signer, Verifier};

use crate::error::{Result, TrustError};
use crate::keys::{PrivateKey, PublicKey};

/// A signature value, possibly not yet computed.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Signature {
    value: Option<Vec<u8>>,
}

impl Signature {
    /// A signature with no value yet.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { value: Some(bytes) }
    }

    /// Parse the base64 interchange form.
    pub fn from_base64(text: &str) -> Result<Self> {
        Ok(Self::from_bytes(STANDARD.decode(text.trim())?))
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        self.value.as_deref()
    }

    pub fn is_set(&self) -> bool {
        self.value.is_some()
    }

    /// Base64 interchange form.
    pub fn to_base64(&self) -> Result<String> {
        self.value
            .as_deref()
            .map(|v| STANDARD.encode(v))
            .ok_or(TrustError::SignatureNotSet)
    }

    /// Start signing with `key`.
    pub fn init_sign(key: &PrivateKey) -> Result<SigningSession<'_>> {
        Ok(SigningSession {
            signer: Signer::new(MessageDigest::sha256(), key.pkey())?,
        })
    }

    /// Start verifying this signature against `key`.
    pub fn init_verify<'a>(&'a self, key: &'a PublicKey) -> Result<VerifyingSession<'a>> {
        Ok(VerifyingSession {
            verifier: Verifier::new(MessageDigest::sha256(), key.pkey())?,
            value: self.value.as_deref(),
        })
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(v) => write!(f, "Signature({} bytes)", v.len()),
            None => f.write_str("Signature(unset)"),
        }
    }
}

/// An in-progress signature. Consumed by [`sign`](Self::sign).
pub struct SigningSession<'a> {
    signer: Signer<'a>,
}

impl SigningSession<'_> {
    /// Feed message bytes, in order.
    pub fn update(&mut self, data: &[u8]) -> Result<()> {
        self.signer.update(data)?;
        Ok(())
    }

    pub fn sign(self) -> Result<Signature> {
        Ok(Signature::from_bytes(self.signer.sign_to_vec()?))
    }
}

impl io::Write for SigningSession<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::Write::write(&mut self.signer, buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// An in-progress verification. Consumed by [`verify`](Self::verify).
pub struct VerifyingSession<'a> {
    verifier: Verifier<'a>,
    value: Option<&'a [u8]>,
}

impl VerifyingSession<'_> {
    /// Feed message bytes, in order.
    pub fn update(&mut self, data: &[u8]) -> Result<()> {
        self.verifier.update(data)?;
        Ok(())
    }

    /// Whether the signature matches the bytes fed so far.
    pub fn verify(self) -> Result<bool> {
        let value = self.value.ok_or(TrustError::SignatureNotSet)?;
        Ok(self.verifier.verify(value)?)
    }
}

impl io::Write for VerifyingSession<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::Write::write(&mut self.verifier, buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
