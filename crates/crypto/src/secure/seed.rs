//! Zeroizing container for a recovered private-key seed
//!
//! `Seed` holds the raw 32-byte secp256k1 scalar recovered from a keystore.
//! It ensures that:
//! - The bytes are zeroized when the struct is dropped
//! - Debug output doesn't expose the actual bytes
//! - The struct cannot be accidentally cloned

use zeroize::{Zeroize, ZeroizeOnDrop};

/// Size of a private-key seed in bytes
pub const SEED_SIZE: usize = 32;

/// Memory-safe container for the private signing scalar.
///
/// This struct intentionally does NOT implement `Clone`. Share it behind an
/// `Arc` when several signing calls need it concurrently.
///
/// # Example
///
/// ```rust
/// use ethvault_crypto::secure::Seed;
///
/// // A key whose big-endian encoding is only 31 bytes long
/// let short = [0x11u8; 31];
/// let seed = Seed::left_padded(&short).unwrap();
///
/// assert_eq!(seed.expose_secret()[0], 0);
/// assert_eq!(&seed.expose_secret()[1..], &short[..]);
/// // Memory is automatically zeroed when `seed` goes out of scope
/// ```
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct Seed {
    bytes: [u8; SEED_SIZE],
}

impl Seed {
    /// Wrap an already 32-byte scalar.
    pub fn from_bytes(bytes: [u8; SEED_SIZE]) -> Self {
        Self { bytes }
    }

    /// Build a seed from big-endian key material of at most 32 bytes,
    /// left-padding it with zero bytes.
    ///
    /// Returns `None` when the input is longer than [`SEED_SIZE`].
    pub fn left_padded(material: &[u8]) -> Option<Self> {
        if material.len() > SEED_SIZE {
            return None;
        }

        let mut seed = Self {
            bytes: [0u8; SEED_SIZE],
        };
        seed.bytes[SEED_SIZE - material.len()..].copy_from_slice(material);
        Some(seed)
    }

    /// Get a reference to the seed bytes.
    ///
    /// # Security
    ///
    /// The returned reference should be used immediately and not stored.
    #[inline]
    pub fn expose_secret(&self) -> &[u8; SEED_SIZE] {
        &self.bytes
    }
}

// Custom Debug implementation to prevent exposing the seed in logs
impl std::fmt::Debug for Seed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Seed")
            .field("length", &SEED_SIZE)
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}
