//! Keccak-256 MAC for keystore password verification
//!
//! The MAC is computed over: derived_key[16:32] || ciphertext
//! A match proves both that the correct password was used AND that the
//! ciphertext hasn't been tampered with. The two cases are not distinguished.

use alloy_primitives::{keccak256, B256};
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use super::error::{KeystoreError, KeystoreResult};
use super::kdf::DerivedKey;

/// Compute the MAC over `mac_key || ciphertext`
///
/// # Arguments
///
/// * `mac_key` - Bytes 16-32 of the derived key
/// * `ciphertext` - The encrypted seed
pub fn compute_mac(mac_key: &[u8], ciphertext: &[u8]) -> B256 {
    let mut preimage = Zeroizing::new(Vec::with_capacity(mac_key.len() + ciphertext.len()));
    preimage.extend_from_slice(mac_key);
    preimage.extend_from_slice(ciphertext);
    keccak256(preimage.as_slice())
}

/// Verify the document's MAC against the derived key
///
/// # Returns
///
/// `Ok(())` if the MAC matches, `Err(AuthenticationFailed)` otherwise
pub fn verify_mac(
    derived_key: &DerivedKey,
    ciphertext: &[u8],
    expected: &[u8],
) -> KeystoreResult<()> {
    let computed = compute_mac(derived_key.mac_key(), ciphertext);

    // A length mismatch short-circuits; the length of the stored MAC is public.
    if bool::from(computed.as_slice().ct_eq(expected)) {
        Ok(())
    } else {
        Err(KeystoreError::AuthenticationFailed)
    }
}
