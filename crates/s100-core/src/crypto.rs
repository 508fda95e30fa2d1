//! AES-128/CBC encryption schemes.
//!
//! Two configurations share the same cipher and key type:
//!
//! - [`RandomIvCipher`] encrypts data-set files. A random IV and one random
//!   decoy block are used on encryption; neither is stored. Decryption runs
//!   with a zero IV and throws the first plaintext block away, which absorbs
//!   whatever IV the encrypter used. PKCS#7 padding.
//! - [`ZeroIvCipher`] wraps keys: zero IV, no padding, whole blocks only.
//!
//! Each call builds its own CBC state, so a cipher value can be shared freely.

use std::io::{self, Read, Write};

use aes::Aes128;
use cbc::cipher::{generic_array::GenericArray, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::types::{SymmetricKey, KEY_SIZE};

type Aes128CbcEnc = cbc::Encryptor<Aes128>;
type Aes128CbcDec = cbc::Decryptor<Aes128>;

/// AES block size in bytes.
pub const BLOCK_SIZE: usize = 16;

const ZERO_IV: [u8; BLOCK_SIZE] = [0u8; BLOCK_SIZE];

/// Encrypt/decrypt capability shared by both schemes.
///
/// The stream variants read the input to completion and write output block by
/// block. The byte variants are built on top of them.
pub trait DataCipher {
    /// Encrypt everything readable from `input` into `output`.
    fn encrypt_stream(&self, input: &mut dyn Read, output: &mut dyn Write) -> Result<()>;

    /// Decrypt everything readable from `input` into `output`.
    fn decrypt_stream(&self, input: &mut dyn Read, output: &mut dyn Write) -> Result<()>;

    /// Encrypt a byte slice.
    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(plaintext.len() + 2 * BLOCK_SIZE);
        self.encrypt_stream(&mut &plaintext[..], &mut out)?;
        Ok(out)
    }

    /// Decrypt a byte slice.
    fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(ciphertext.len());
        self.decrypt_stream(&mut &ciphertext[..], &mut out)?;
        Ok(out)
    }
}

/// Selects one of the two encryption schemes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CipherScheme {
    /// Random IV, decoy block, PKCS#7 padding. Used for data-set files.
    BulkData,
    /// Zero IV, no padding. Used for HW-IDs and data keys.
    KeyWrap,
}

impl CipherScheme {
    /// Build the cipher for this scheme under `key`.
    pub fn cipher(self, key: SymmetricKey) -> Box<dyn DataCipher + Send + Sync> {
        match self {
            CipherScheme::BulkData => Box::new(RandomIvCipher::new(key)),
            CipherScheme::KeyWrap => Box::new(ZeroIvCipher::new(key)),
        }
    }
}

/// Bulk-data scheme: random IV plus a discarded decoy block.
#[derive(Debug, Clone)]
pub struct RandomIvCipher {
    key: SymmetricKey,
}

impl RandomIvCipher {
    pub fn new(key: SymmetricKey) -> Self {
        Self { key }
    }
}

impl DataCipher for RandomIvCipher {
    fn encrypt_stream(&self, input: &mut dyn Read, output: &mut dyn Write) -> Result<()> {
        let mut iv = [0u8; BLOCK_SIZE];
        let mut block = [0u8; BLOCK_SIZE];
        OsRng.fill_bytes(&mut iv);
        OsRng.fill_bytes(&mut block);

        let mut enc = Aes128CbcEnc::new(self.key.as_bytes().into(), &iv.into());

        enc.encrypt_block_mut(GenericArray::from_mut_slice(&mut block));
        output.write_all(&block)?;

        loop {
            let n = read_block(input, &mut block)?;
            if n < BLOCK_SIZE {
                // PKCS#7: a short (or empty) final block carries the pad length
                // in every pad byte.
                let pad = (BLOCK_SIZE - n) as u8;
                block[n..].fill(pad);
                enc.encrypt_block_mut(GenericArray::from_mut_slice(&mut block));
                output.write_all(&block)?;
                break;
            }
            enc.encrypt_block_mut(GenericArray::from_mut_slice(&mut block));
            output.write_all(&block)?;
        }

        output.flush()?;
        Ok(())
    }

    fn decrypt_stream(&self, input: &mut dyn Read, output: &mut dyn Write) -> Result<()> {
        let mut dec = Aes128CbcDec::new(self.key.as_bytes().into(), &ZERO_IV.into());
        let mut block = [0u8; BLOCK_SIZE];
        let mut pending: Option<[u8; BLOCK_SIZE]> = None;
        let mut total = 0usize;
        let mut skipped_decoy = false;

        loop {
            let n = read_block(input, &mut block)?;
            total += n;
            if n == 0 {
                break;
            }
            if n < BLOCK_SIZE {
                return Err(CoreError::InvalidBlockLength(total + drain(input)?));
            }

            dec.decrypt_block_mut(GenericArray::from_mut_slice(&mut block));
            if !skipped_decoy {
                skipped_decoy = true;
                continue;
            }
            // Hold one block back: the last one carries the padding.
            if let Some(prev) = pending.replace(block) {
                output.write_all(&prev)?;
            }
        }

        let last = pending.ok_or_else(|| {
            CoreError::CryptoFailure(format!(
                "ciphertext of {total} bytes is too short for the bulk-data scheme"
            ))
        })?;
        let keep = strip_padding(&last)?;
        output.write_all(&last[..keep])?;
        output.flush()?;
        Ok(())
    }
}

/// Key-wrap scheme: zero IV, no padding.
#[derive(Debug, Clone)]
pub struct ZeroIvCipher {
    key: SymmetricKey,
}

impl ZeroIvCipher {
    pub fn new(key: SymmetricKey) -> Self {
        Self { key }
    }

    /// Wrap exactly one key-sized block.
    pub fn encrypt_block(&self, plaintext: &[u8; KEY_SIZE]) -> [u8; KEY_SIZE] {
        let mut block = *plaintext;
        let mut enc = Aes128CbcEnc::new(self.key.as_bytes().into(), &ZERO_IV.into());
        enc.encrypt_block_mut(GenericArray::from_mut_slice(&mut block));
        block
    }

    /// Unwrap exactly one key-sized block.
    pub fn decrypt_block(&self, ciphertext: &[u8; KEY_SIZE]) -> [u8; KEY_SIZE] {
        let mut block = *ciphertext;
        let mut dec = Aes128CbcDec::new(self.key.as_bytes().into(), &ZERO_IV.into());
        dec.decrypt_block_mut(GenericArray::from_mut_slice(&mut block));
        block
    }
}

impl DataCipher for ZeroIvCipher {
    fn encrypt_stream(&self, input: &mut dyn Read, output: &mut dyn Write) -> Result<()> {
        let mut enc = Aes128CbcEnc::new(self.key.as_bytes().into(), &ZERO_IV.into());
        for_each_block(input, |block| {
            enc.encrypt_block_mut(GenericArray::from_mut_slice(block.as_mut_slice()));
            output.write_all(block)
        })?;
        output.flush()?;
        Ok(())
    }

    fn decrypt_stream(&self, input: &mut dyn Read, output: &mut dyn Write) -> Result<()> {
        let mut dec = Aes128CbcDec::new(self.key.as_bytes().into(), &ZERO_IV.into());
        for_each_block(input, |block| {
            dec.decrypt_block_mut(GenericArray::from_mut_slice(block.as_mut_slice()));
            output.write_all(block)
        })?;
        output.flush()?;
        Ok(())
    }
}

/// Run `f` over every whole block of `input`; a trailing partial block fails.
fn for_each_block<F>(input: &mut dyn Read, mut f: F) -> Result<()>
where
    F: FnMut(&mut [u8; BLOCK_SIZE]) -> io::Result<()>,
{
    let mut block = [0u8; BLOCK_SIZE];
    let mut total = 0usize;
    loop {
        let n = read_block(input, &mut block)?;
        total += n;
        match n {
            0 => return Ok(()),
            BLOCK_SIZE => f(&mut block)?,
            _ => return Err(CoreError::InvalidBlockLength(total + drain(input)?)),
        }
    }
}

/// Fill `buf` from `input`, returning fewer bytes only at end of stream.
fn read_block(input: &mut dyn Read, buf: &mut [u8; BLOCK_SIZE]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < BLOCK_SIZE {
        match input.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Count the bytes left in `input` so length errors report the full size.
fn drain(input: &mut dyn Read) -> io::Result<usize> {
    let n = io::copy(input, &mut io::sink())?;
    Ok(n as usize)
}

/// Validate PKCS#7 padding on the final block and return the data length.
fn strip_padding(block: &[u8; BLOCK_SIZE]) -> Result<usize> {
    let pad = block[BLOCK_SIZE - 1] as usize;
    if pad == 0 || pad > BLOCK_SIZE {
        return Err(CoreError::CryptoFailure("invalid padding".into()));
    }
    if block[BLOCK_SIZE - pad..].iter().any(|&b| b as usize != pad) {
        return Err(CoreError::CryptoFailure("invalid padding".into()));
    }
    Ok(BLOCK_SIZE - pad)
}
