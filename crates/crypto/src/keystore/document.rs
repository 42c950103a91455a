//! V3 keystore document parsing and unlocking
//!
//! This module ties the KDF, MAC and cipher modules together: parse the JSON
//! document, check the version, derive the key, authenticate, decrypt and
//! pad the result into a [`Seed`].

use std::fs;
use std::path::Path;

use alloy_primitives::Address;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::cipher::{Cipher, CipherParams};
use super::error::{KeystoreError, KeystoreResult};
use super::hex_util::decode_hex;
use super::kdf::{KdfParams, UnlockPolicy};
use super::mac::verify_mac;
use crate::secure::{Seed, SEED_SIZE};

/// The only keystore version this crate unlocks
pub const KEYSTORE_VERSION: u64 = 3;

/// On-disk shape of a V3 keystore
#[derive(Debug, Deserialize)]
struct RawDocument {
    version: u64,
    #[serde(alias = "Crypto")]
    crypto: RawCrypto,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    address: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawCrypto {
    cipher: String,
    ciphertext: String,
    cipherparams: CipherParams,
    kdf: String,
    kdfparams: serde_json::Value,
    mac: String,
}

/// Parsed V3 keystore
///
/// Immutable once parsed. The document holds no secret material: the
/// ciphertext is only useful together with the password.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeystoreDocument {
    /// Schema version (always 3 for a parsed document)
    pub version: u64,
    /// Crypto parameters (KDF + cipher + MAC)
    pub crypto: CryptoParams,
    /// Optional UUID
    pub id: Option<String>,
    /// Optional declared address (hex, no checksum guarantee)
    pub address: Option<String>,
}

/// The `crypto` section of a V3 keystore
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CryptoParams {
    /// Key derivation function and its parameters
    pub kdf: KdfParams,
    /// Cipher identifier, resolved at unlock time
    pub cipher: String,
    /// Cipher parameters
    pub cipherparams: CipherParams,
    /// Encrypted seed
    pub ciphertext: Vec<u8>,
    /// keccak256(derived_key[16:32] || ciphertext)
    pub mac: Vec<u8>,
}

/// Non-secret description of a keystore, for display
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct KeystoreSummary {
    pub version: u64,
    pub id: Option<String>,
    pub address: Option<String>,
    pub kdf: String,
    pub kdf_cost: String,
    pub cipher: String,
    pub ciphertext_len: usize,
}

impl KeystoreDocument {
    /// Parse a keystore from raw file bytes.
    ///
    /// The version is checked before anything else so that documents of
    /// other versions fail with [`KeystoreError::UnsupportedVersion`]
    /// whatever the rest of their shape.
    pub fn from_slice(bytes: &[u8]) -> KeystoreResult<Self> {
        let value: serde_json::Value = serde_json::from_slice(bytes)?;

        let version = value
            .get("version")
            .ok_or_else(|| KeystoreError::InvalidDocument("missing version".to_string()))?
            .as_u64()
            .ok_or_else(|| {
                KeystoreError::InvalidDocument("version must be an unsigned integer".to_string())
            })?;

        if version != KEYSTORE_VERSION {
            return Err(KeystoreError::UnsupportedVersion(version));
        }

        let raw: RawDocument = serde_json::from_value(value)?;
        Self::from_raw(raw)
    }

    /// Parse a keystore from a JSON string
    pub fn from_json(json: &str) -> KeystoreResult<Self> {
        Self::from_slice(json.as_bytes())
    }

    /// Load a keystore from a file
    pub fn load<P: AsRef<Path>>(path: P) -> KeystoreResult<Self> {
        let contents = fs::read(path)?;
        Self::from_slice(&contents)
    }

    fn from_raw(raw: RawDocument) -> KeystoreResult<Self> {
        let RawDocument {
            version,
            crypto,
            id,
            address,
        } = raw;

        let kdf = KdfParams::from_json(&crypto.kdf, &crypto.kdfparams)?;

        let ciphertext = decode_hex(&crypto.ciphertext)
            .map_err(|e| KeystoreError::HexError(format!("invalid ciphertext hex: {}", e)))?;
        let mac = decode_hex(&crypto.mac)
            .map_err(|e| KeystoreError::HexError(format!("invalid mac hex: {}", e)))?;

        Ok(Self {
            version,
            crypto: CryptoParams {
                kdf,
                cipher: crypto.cipher,
                cipherparams: crypto.cipherparams,
                ciphertext,
                mac,
            },
            id,
            address,
        })
    }

    /// Decrypt the keystore with the default [`UnlockPolicy`]
    pub fn unlock(&self, password: &[u8]) -> KeystoreResult<Seed> {
        self.unlock_with_policy(password, &UnlockPolicy::default())
    }

    /// Decrypt the keystore and return the 32-byte seed
    ///
    /// All document checks run before key derivation, so every error other
    /// than [`KeystoreError::AuthenticationFailed`] is independent of the
    /// password.
    pub fn unlock_with_policy(
        &self,
        password: &[u8],
        policy: &UnlockPolicy,
    ) -> KeystoreResult<Seed> {
        if self.version != KEYSTORE_VERSION {
            return Err(KeystoreError::UnsupportedVersion(self.version));
        }

        let crypto = &self.crypto;
        crypto.kdf.validate(policy)?;
        let cipher = Cipher::from_name(&crypto.cipher)?;
        crypto.cipherparams.validate(cipher)?;
        let iv = crypto.cipherparams.iv()?;

        debug!(kdf = crypto.kdf.name(), cipher = cipher.name(), "unlocking keystore");

        // Derive key from password
        let derived_key = crypto.kdf.derive_key(password)?;

        // Verify MAC before decrypting
        if let Err(err) = verify_mac(&derived_key, &crypto.ciphertext, &crypto.mac) {
            warn!("keystore authentication failed");
            return Err(err);
        }

        let plaintext = cipher.decrypt(derived_key.encryption_key(), &iv, &crypto.ciphertext)?;
        let plaintext = plaintext.expose_secret();

        Seed::left_padded(plaintext).ok_or(KeystoreError::InvalidSeedLength {
            expected: SEED_SIZE,
            actual: plaintext.len(),
        })
    }

    /// The declared address, if present and well-formed
    pub fn declared_address(&self) -> Option<Address> {
        let raw = self.address.as_deref()?;
        match decode_hex(raw) {
            Ok(bytes) if bytes.len() == 20 => Some(Address::from_slice(&bytes)),
            _ => {
                debug!(address = raw, "ignoring malformed declared address");
                None
            }
        }
    }

    /// Non-secret description for display
    pub fn summary(&self) -> KeystoreSummary {
        let kdf_cost = match &self.crypto.kdf {
            KdfParams::Scrypt(params) => {
                format!("n={} r={} p={} dklen={}", params.n, params.r, params.p, params.dklen)
            }
            KdfParams::Pbkdf2(params) => {
                format!("c={} prf={} dklen={}", params.c, params.prf, params.dklen)
            }
        };

        KeystoreSummary {
            version: self.version,
            id: self.id.clone(),
            address: self.address.clone(),
            kdf: self.crypto.kdf.name().to_string(),
            kdf_cost,
            cipher: self.crypto.cipher.clone(),
            ciphertext_len: self.crypto.ciphertext.len(),
        }
    }
}
