//! Cryptographic primitives for ethvault
//!
//! This crate provides:
//! - V3 keystore decryption (scrypt / PBKDF2, AES-128-CTR, keccak256 MAC)
//! - Zeroizing containers for the decrypted seed and for passwords
//! - secp256k1 recoverable signing and EVM address derivation

pub mod error;
pub mod keystore;
pub mod secp256k1;
pub mod secure;

// Secp256k1 exports (EVM-compatible)
pub use secp256k1::{RecoverableSignature, Secp256k1PublicKey, Secp256k1SecretKey};

// Error exports
pub use error::CryptoError;

// Secure memory exports
pub use secrecy::ExposeSecret;
pub use secure::{IntoSecret, SecretBytes, SecretString, Seed, SEED_SIZE};

// Keystore exports
pub use keystore::{KeystoreDocument, KeystoreError, UnlockPolicy};
