//! Wallet error types

use ethvault_crypto::KeystoreError;
use ethvault_tx::TxError;
use thiserror::Error;

/// Errors surfaced by the unlock-and-sign facade
#[derive(Debug, Error)]
pub enum WalletError {
    /// Keystore parsing or decryption failed
    #[error(transparent)]
    Keystore(#[from] KeystoreError),

    /// Transaction building or signing failed
    #[error(transparent)]
    Transaction(#[from] TxError),

    /// The session was locked
    #[error("wallet is locked")]
    Locked,

    /// An async unlock was cancelled before it finished
    #[error("unlock cancelled")]
    Cancelled,

    /// The blocking unlock task panicked or was aborted
    #[error("unlock task failed: {0}")]
    Internal(String),
}

/// Coarse classification of [`WalletError`] for callers deciding what to
/// show or whether to re-prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The keystore document is malformed or unsupported
    Format,
    /// Wrong password or corrupted keystore
    AuthenticationFailed,
    /// A transaction field is malformed or out of range
    InvalidTransactionField,
    /// The key could not sign
    SigningFailed,
    Locked,
    Cancelled,
    /// Reading the keystore failed
    Io,
    Internal,
}

impl WalletError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            WalletError::Keystore(KeystoreError::AuthenticationFailed) => {
                ErrorKind::AuthenticationFailed
            }
            WalletError::Keystore(KeystoreError::IoError(_)) => ErrorKind::Io,
            WalletError::Keystore(_) => ErrorKind::Format,
            WalletError::Transaction(TxError::InvalidTransactionField { .. }) => {
                ErrorKind::InvalidTransactionField
            }
            WalletError::Transaction(TxError::SigningFailed(_)) => ErrorKind::SigningFailed,
            WalletError::Transaction(TxError::InvalidSignature(_) | TxError::Rlp(_)) => {
                ErrorKind::Format
            }
            WalletError::Locked => ErrorKind::Locked,
            WalletError::Cancelled => ErrorKind::Cancelled,
            WalletError::Internal(_) => ErrorKind::Internal,
        }
    }
}

/// Result type for wallet operations
pub type WalletResult<T> = Result<T, WalletError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            WalletError::from(KeystoreError::AuthenticationFailed).kind(),
            ErrorKind::AuthenticationFailed
        );
        assert_eq!(
            WalletError::from(KeystoreError::UnsupportedVersion(2)).kind(),
            ErrorKind::Format
        );
        assert_eq!(
            WalletError::from(KeystoreError::UnsupportedKdf("argon2".into())).kind(),
            ErrorKind::Format
        );
        assert_eq!(
            WalletError::from(TxError::SigningFailed("zero key".into())).kind(),
            ErrorKind::SigningFailed
        );
        assert_eq!(
            WalletError::from(TxError::InvalidTransactionField {
                field: "nonce",
                reason: "overflow".into()
            })
            .kind(),
            ErrorKind::InvalidTransactionField
        );
        assert_eq!(WalletError::Cancelled.kind(), ErrorKind::Cancelled);
    }

    #[test]
    fn test_authentication_message_passes_through() {
        let err = WalletError::from(KeystoreError::AuthenticationFailed);
        assert_eq!(
            err.to_string(),
            "authentication failed: wrong password or corrupted keystore"
        );
    }
}
