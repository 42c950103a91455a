//! Cryptographic error types

use thiserror::Error;

/// secp256k1 errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// Seed is zero or not below the curve order
    #[error("invalid secret key bytes")]
    InvalidSecretKey,

    /// Signature scalars out of range
    #[error("invalid signature bytes")]
    InvalidSignature,

    /// Recovery id outside 0..=3
    #[error("invalid recovery id: {0}")]
    InvalidRecoveryId(u8),

    /// The signing primitive reported an error
    #[error("signing failed: {0}")]
    SigningFailed(String),

    /// No public key recovers from the signature
    #[error("public key recovery failed")]
    RecoveryFailed,
}
