//! Ethereum V3 (Web3 Secret Storage) keystore decryption
//!
//! A V3 keystore protects a 32-byte secp256k1 private key with a password:
//!
//! - scrypt or PBKDF2-HMAC-SHA256 stretches the password into a derived key
//! - keccak256(derived_key[16..32] || ciphertext) authenticates the password
//! - AES-128-CTR keyed with derived_key[0..16] decrypts the seed
//!
//! Only unlocking is supported. The MAC is checked in constant time before
//! anything is decrypted, and a wrong password is indistinguishable from a
//! corrupted ciphertext.
//!
//! # Example
//!
//! ```rust,ignore
//! use ethvault_crypto::keystore::KeystoreDocument;
//!
//! let document = KeystoreDocument::load("./UTC--2016-...--008aeeda.json")?;
//! let seed = document.unlock(b"testpassword")?;
//! ```

mod cipher;
mod document;
mod error;
mod hex_util;
mod kdf;
mod mac;

#[cfg(any(test, feature = "test-utils"))]
pub mod fixtures;

pub use cipher::{decrypt_secret, Cipher, CipherParams, CIPHER_AES_128_CTR};
pub use document::{CryptoParams, KeystoreDocument, KeystoreSummary, KEYSTORE_VERSION};
pub use error::{KeystoreError, KeystoreResult};
pub use hex_util::decode_hex;
pub use kdf::{
    pbkdf2_derive_key, scrypt_derive_key, DerivedKey, KdfParams, Pbkdf2Params, ScryptParams,
    UnlockPolicy, DEFAULT_MAX_PBKDF2_C, DEFAULT_MAX_SCRYPT_MEMORY, DEFAULT_MAX_SCRYPT_N,
    DEFAULT_MAX_SCRYPT_WORK,
};
pub use mac::{compute_mac, verify_mac};

use crate::secure::Seed;

/// Parse raw keystore bytes and unlock them with the default policy
pub fn unlock(file_bytes: &[u8], password: &[u8]) -> KeystoreResult<Seed> {
    KeystoreDocument::from_slice(file_bytes)?.unlock(password)
}

/// Parse raw keystore bytes and unlock them under `policy`
pub fn unlock_with_policy(
    file_bytes: &[u8],
    password: &[u8],
    policy: &UnlockPolicy,
) -> KeystoreResult<Seed> {
    KeystoreDocument::from_slice(file_bytes)?.unlock_with_policy(password, policy)
}
