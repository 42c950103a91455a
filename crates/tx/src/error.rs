//! Transaction error types

use thiserror::Error;

/// Errors that can occur while building, signing or decoding a transaction
#[derive(Debug, Error)]
pub enum TxError {
    /// A field is malformed or does not fit its wire width
    #[error("invalid transaction field `{field}`: {reason}")]
    InvalidTransactionField {
        field: &'static str,
        reason: String,
    },

    /// The seed is not a usable secp256k1 scalar, or the signer failed
    #[error("signing failed: {0}")]
    SigningFailed(String),

    /// `v`, `r` or `s` of a decoded transaction is unusable
    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    /// Malformed RLP
    #[error("RLP decoding failed: {0}")]
    Rlp(#[from] alloy_rlp::Error),
}

impl TxError {
    pub(crate) fn field(field: &'static str, reason: impl Into<String>) -> Self {
        TxError::InvalidTransactionField {
            field,
            reason: reason.into(),
        }
    }
}

/// Result type for transaction operations
pub type TxResult<T> = Result<T, TxError>;
