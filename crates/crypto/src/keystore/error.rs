//! Keystore error types

use thiserror::Error;

/// Errors that can occur while parsing or unlocking a V3 keystore
///
/// Every variant except [`KeystoreError::AuthenticationFailed`] describes the
/// document itself. A wrong password and a corrupted ciphertext both surface
/// as `AuthenticationFailed` with the same message.
#[derive(Error, Debug)]
pub enum KeystoreError {
    /// Document version is not 3
    #[error("unsupported keystore version: {0} (only version 3 is supported)")]
    UnsupportedVersion(u64),

    /// Unsupported KDF function
    #[error("unsupported key derivation function: {0}")]
    UnsupportedKdf(String),

    /// KDF parameters name an unsupported algorithm (e.g. a PBKDF2 PRF)
    #[error("unsupported KDF parameters: {0}")]
    UnsupportedKdfParams(String),

    /// Unsupported cipher function
    #[error("unsupported cipher function: {0}")]
    UnsupportedCipher(String),

    /// Invalid KDF parameters
    #[error("invalid KDF parameters: {0}")]
    InvalidKdfParams(String),

    /// Invalid cipher parameters
    #[error("invalid cipher parameters: {0}")]
    InvalidCipherParams(String),

    /// Key derivation failed
    #[error("key derivation failed: {0}")]
    KdfError(String),

    /// Invalid hex encoding
    #[error("invalid hex encoding: {0}")]
    HexError(String),

    /// Document is not valid JSON or does not match the V3 shape
    #[error("invalid keystore JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Document is valid JSON but a required field is missing or mistyped
    #[error("malformed keystore document: {0}")]
    InvalidDocument(String),

    /// Decrypted plaintext does not fit a 32-byte seed
    #[error("invalid seed length: expected at most {expected} bytes, got {actual}")]
    InvalidSeedLength { expected: usize, actual: usize },

    /// MAC verification failed (wrong password or corrupted keystore)
    #[error("authentication failed: wrong password or corrupted keystore")]
    AuthenticationFailed,

    /// File I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl KeystoreError {
    /// Whether this error describes the document rather than the password.
    ///
    /// Format errors are not user-correctable by re-entering the password.
    pub fn is_format_error(&self) -> bool {
        !matches!(
            self,
            KeystoreError::AuthenticationFailed | KeystoreError::IoError(_)
        )
    }
}

/// Result type for keystore operations
pub type KeystoreResult<T> = Result<T, KeystoreError>;
