//! Unlock-and-sign facade for ethvault
//!
//! External callers (a UI, a CLI) use two operations:
//!
//! - [`unlock_wallet`]: keystore file bytes + password to a [`SeedHandle`]
//! - [`sign_transaction`]: handle + form fields to raw signed bytes
//!
//! [`WalletSession`] wraps a handle with an explicit `lock`, and
//! [`unlock_wallet_cancellable`] runs the slow KDF off the async runtime.

pub mod error;
pub mod session;
pub mod unlock;

pub use error::{ErrorKind, WalletError, WalletResult};
pub use session::{sign_transaction, unlock_wallet, SeedHandle, WalletSession};
pub use unlock::unlock_wallet_cancellable;

pub use ethvault_crypto::keystore::UnlockPolicy;
pub use ethvault_tx::{Quantity, SignedTransaction, TransactionFields, TransactionRequest};
