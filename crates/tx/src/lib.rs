//! Legacy Ethereum transactions for ethvault
//!
//! Builds, signs and decodes legacy (pre-typed) transactions, with optional
//! EIP-155 replay protection. The signing key comes from an unlocked
//! keystore [`Seed`](ethvault_crypto::Seed).

pub mod encoding;
pub mod error;
pub mod request;
pub mod signed;
pub mod signer;

pub use error::{TxError, TxResult};
pub use request::{Quantity, TransactionFields, TransactionRequest, MAX_CHAIN_ID};
pub use signed::{SignedTransaction, TxSignature};
pub use signer::sign;
