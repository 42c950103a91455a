//! Secure memory handling for key material
//!
//! This module provides memory-safe containers for private key material with:
//! - Automatic zeroing on drop via `zeroize`
//! - Debug output masking to prevent log exposure
//! - Prevention of accidental cloning
//!
//! # Example
//!
//! ```rust,ignore
//! use ethvault_crypto::secure::Seed;
//!
//! let seed = document.unlock(password)?;
//! // Use the seed...
//! drop(seed); // Memory is automatically zeroed
//! ```

mod secret;
mod seed;

pub use secret::{IntoSecret, SecretBytes, SecretString};
pub use seed::{Seed, SEED_SIZE};
