//! Symmetric cipher dispatch for keystore decryption
//!
//! The cipher is named by the document (`crypto.cipher`) rather than assumed.
//! AES-128-CTR is the only cipher V3 wallets emit, so it is the only variant
//! implemented; CTR mode provides confidentiality without padding.

use aes::Aes128;
use cipher::{KeyIvInit, StreamCipher};
use ctr::Ctr128BE;
use secrecy::{ExposeSecretMut, SecretBox};
use serde::{Deserialize, Serialize};

use super::error::{KeystoreError, KeystoreResult};
use super::hex_util::decode_hex;
use crate::secure::SecretBytes;

/// Cipher identifier for AES-128-CTR
pub const CIPHER_AES_128_CTR: &str = "aes-128-ctr";

/// IV (initialization vector) length for AES-128-CTR
pub const IV_LENGTH: usize = 16;

/// AES-128 key length
pub const AES_KEY_LENGTH: usize = 16;

/// Type alias for AES-128-CTR cipher
type Aes128Ctr = Ctr128BE<Aes128>;

/// Supported symmetric ciphers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cipher {
    Aes128Ctr,
}

impl Cipher {
    /// Resolve the document's `cipher` string
    pub fn from_name(name: &str) -> KeystoreResult<Self> {
        match name {
            CIPHER_AES_128_CTR => Ok(Cipher::Aes128Ctr),
            other => Err(KeystoreError::UnsupportedCipher(other.to_string())),
        }
    }

    /// The `cipher` identifier
    pub fn name(&self) -> &'static str {
        match self {
            Cipher::Aes128Ctr => CIPHER_AES_128_CTR,
        }
    }

    /// Required IV length for this cipher
    pub fn iv_len(&self) -> usize {
        match self {
            Cipher::Aes128Ctr => IV_LENGTH,
        }
    }

    /// Decrypt `ciphertext` with the given key and IV
    pub fn decrypt(&self, key: &[u8], iv: &[u8], ciphertext: &[u8]) -> KeystoreResult<SecretBytes> {
        match self {
            Cipher::Aes128Ctr => decrypt_secret(ciphertext, key, iv),
        }
    }
}

/// Cipher parameters (`crypto.cipherparams`)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CipherParams {
    /// Initialization vector as hex string
    pub iv: String,
}

impl CipherParams {
    /// Get the IV bytes
    pub fn iv(&self) -> KeystoreResult<Vec<u8>> {
        decode_hex(&self.iv).map_err(|e| KeystoreError::HexError(format!("invalid IV hex: {}", e)))
    }

    /// Validate the parameters for the given cipher
    pub fn validate(&self, cipher: Cipher) -> KeystoreResult<()> {
        let iv_bytes = decode_hex(&self.iv)
            .map_err(|e| KeystoreError::InvalidCipherParams(format!("invalid IV hex: {}", e)))?;

        if iv_bytes.len() != cipher.iv_len() {
            return Err(KeystoreError::InvalidCipherParams(format!(
                "IV must be {} bytes, got {}",
                cipher.iv_len(),
                iv_bytes.len()
            )));
        }

        Ok(())
    }
}

fn aes_128_ctr(key: &[u8], iv: &[u8]) -> KeystoreResult<Aes128Ctr> {
    if key.len() < AES_KEY_LENGTH {
        return Err(KeystoreError::InvalidCipherParams(format!(
            "key must be at least {} bytes, got {}",
            AES_KEY_LENGTH,
            key.len()
        )));
    }

    if iv.len() != IV_LENGTH {
        return Err(KeystoreError::InvalidCipherParams(format!(
            "IV must be {} bytes, got {}",
            IV_LENGTH,
            iv.len()
        )));
    }

    Aes128Ctr::new_from_slices(&key[..AES_KEY_LENGTH], iv)
        .map_err(|e| KeystoreError::InvalidCipherParams(e.to_string()))
}

/// Decrypt secret data using AES-128-CTR
///
/// # Arguments
///
/// * `ciphertext` - The encrypted data
/// * `decryption_key` - The first 16 bytes of the derived key
/// * `iv` - 16-byte initialization vector
///
/// # Returns
///
/// Decrypted secret as SecretBytes
pub fn decrypt_secret(
    ciphertext: &[u8],
    decryption_key: &[u8],
    iv: &[u8],
) -> KeystoreResult<SecretBytes> {
    let mut cipher = aes_128_ctr(decryption_key, iv)?;

    let mut plaintext: SecretBytes = SecretBox::new(Box::new(ciphertext.to_vec()));
    cipher.apply_keystream(plaintext.expose_secret_mut());

    Ok(plaintext)
}

/// Encrypt secret data using AES-128-CTR
#[cfg(any(test, feature = "test-utils"))]
pub(crate) fn encrypt_secret(
    secret: &[u8],
    encryption_key: &[u8],
    iv: &[u8],
) -> KeystoreResult<Vec<u8>> {
    let mut cipher = aes_128_ctr(encryption_key, iv)?;

    let mut ciphertext = secret.to_vec();
    cipher.apply_keystream(&mut ciphertext);

    Ok(ciphertext)
}
