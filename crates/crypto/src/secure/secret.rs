//! Secret wrapper utilities for consistent secret handling
//!
//! Provides type aliases and utilities around the `secrecy` crate for
//! handling passwords and transient derived bytes.

use secrecy::{SecretBox, SecretString as SecrecySecretString};

/// A secret byte vector that is zeroized on drop.
///
/// Used for KDF output and decrypted plaintext before it becomes a [`Seed`].
///
/// [`Seed`]: super::Seed
///
/// # Example
///
/// ```rust
/// use ethvault_crypto::secure::SecretBytes;
/// use secrecy::ExposeSecret;
///
/// let secret = SecretBytes::new(Box::new(vec![1, 2, 3, 4]));
/// assert_eq!(secret.expose_secret(), &vec![1, 2, 3, 4]);
/// ```
pub type SecretBytes = SecretBox<Vec<u8>>;

/// A secret string that is zeroized on drop.
///
/// Use this for keystore passwords read from a prompt or a file.
pub type SecretString = SecrecySecretString;

/// Extension trait for creating secret values.
pub trait IntoSecret {
    /// The secret type this converts into.
    type Secret;

    /// Convert into a secret value.
    fn into_secret(self) -> Self::Secret;
}

impl IntoSecret for String {
    type Secret = SecretString;

    fn into_secret(self) -> Self::Secret {
        self.into() // Uses From<String> for SecretString
    }
}

impl IntoSecret for Vec<u8> {
    type Secret = SecretBytes;

    fn into_secret(self) -> Self::Secret {
        SecretBox::new(Box::new(self))
    }
}
