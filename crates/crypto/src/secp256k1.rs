//! Secp256k1 operations for Ethereum transaction signing
//!
//! This module provides:
//! - EVM address derivation (keccak256(uncompressed_pubkey[1..])[12..])
//! - Recoverable ECDSA signatures over a 32-byte prehash
//! - Signer recovery from (prehash, r, s, recovery id)
//!
//! Uses the k256 crate for secp256k1 curve operations. Nonces are derived
//! deterministically (RFC 6979) and `s` is normalized to the lower half of
//! the curve order, so signing the same hash twice yields identical output.

use crate::error::CryptoError;
use crate::secure::Seed;
use alloy_primitives::{keccak256, Address, B256, U256};
use k256::{
    ecdsa::{RecoveryId, Signature as K256Signature, SigningKey, VerifyingKey},
    elliptic_curve::sec1::ToEncodedPoint,
    SecretKey as K256SecretKey,
};

/// Secp256k1 secret key (32 bytes scalar)
///
/// The inner k256 key zeroizes itself on drop. Not `Clone`.
pub struct Secp256k1SecretKey(K256SecretKey);

impl Secp256k1SecretKey {
    /// Load from raw bytes (32 bytes scalar)
    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self, CryptoError> {
        K256SecretKey::from_slice(bytes)
            .map(Self)
            .map_err(|_| CryptoError::InvalidSecretKey)
    }

    /// Interpret a keystore seed as a scalar
    ///
    /// Fails for zero and for values not below the curve order.
    pub fn from_seed(seed: &Seed) -> Result<Self, CryptoError> {
        Self::from_bytes(seed.expose_secret())
    }

    /// Get the corresponding public key
    pub fn public_key(&self) -> Secp256k1PublicKey {
        Secp256k1PublicKey(self.0.public_key())
    }

    /// EVM address of this key
    pub fn evm_address(&self) -> Address {
        self.public_key().evm_address()
    }

    /// Sign a 32-byte prehash, returning a low-s recoverable signature
    pub fn sign_prehash_recoverable(
        &self,
        prehash: &B256,
    ) -> Result<RecoverableSignature, CryptoError> {
        let signing_key = SigningKey::from(&self.0);
        let (signature, recovery_id) = signing_key
            .sign_prehash_recoverable(prehash.as_slice())
            .map_err(|e| CryptoError::SigningFailed(e.to_string()))?;

        let bytes = signature.to_bytes();
        Ok(RecoverableSignature {
            r: U256::from_be_slice(&bytes[..32]),
            s: U256::from_be_slice(&bytes[32..]),
            recovery_id: recovery_id.to_byte(),
        })
    }
}

impl std::fmt::Debug for Secp256k1SecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secp256k1SecretKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Secp256k1 public key
#[derive(Clone, PartialEq, Eq)]
pub struct Secp256k1PublicKey(k256::PublicKey);

impl Secp256k1PublicKey {
    /// Serialize to compressed bytes (33 bytes)
    pub fn to_bytes(&self) -> [u8; 33] {
        let encoded = self.0.to_encoded_point(true);
        let mut result = [0u8; 33];
        result.copy_from_slice(encoded.as_bytes());
        result
    }

    /// Serialize to uncompressed bytes (65 bytes, with 0x04 prefix)
    pub fn to_uncompressed_bytes(&self) -> [u8; 65] {
        let encoded = self.0.to_encoded_point(false);
        let mut result = [0u8; 65];
        result.copy_from_slice(encoded.as_bytes());
        result
    }

    /// Derive EVM address from this public key
    ///
    /// Uses keccak256(uncompressed_pubkey[1..])[12..] (Ethereum address format, 20 bytes)
    pub fn evm_address(&self) -> Address {
        let uncompressed = self.to_uncompressed_bytes();
        // Skip the 0x04 prefix byte
        let hash = keccak256(&uncompressed[1..]);
        Address::from_slice(&hash[12..])
    }
}

impl std::fmt::Debug for Secp256k1PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let bytes = self.to_bytes();
        write!(f, "Secp256k1PublicKey({})", hex::encode(&bytes[..8]))
    }
}

/// ECDSA signature with its recovery id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecoverableSignature {
    pub r: U256,
    pub s: U256,
    /// 0 or 1 (y parity of R); 2 and 3 are never produced in practice
    pub recovery_id: u8,
}

impl RecoverableSignature {
    /// Recover the public key that produced this signature over `prehash`
    pub fn recover_public_key(&self, prehash: &B256) -> Result<Secp256k1PublicKey, CryptoError> {
        let recovery_id = RecoveryId::from_byte(self.recovery_id)
            .ok_or(CryptoError::InvalidRecoveryId(self.recovery_id))?;

        let mut rs = [0u8; 64];
        rs[..32].copy_from_slice(&self.r.to_be_bytes::<32>());
        rs[32..].copy_from_slice(&self.s.to_be_bytes::<32>());
        let signature = K256Signature::from_slice(&rs).map_err(|_| CryptoError::InvalidSignature)?;

        let verifying_key =
            VerifyingKey::recover_from_prehash(prehash.as_slice(), &signature, recovery_id)
                .map_err(|_| CryptoError::RecoveryFailed)?;

        Ok(Secp256k1PublicKey(verifying_key.into()))
    }

    /// Recover the EVM address that produced this signature over `prehash`
    pub fn recover_address(&self, prehash: &B256) -> Result<Address, CryptoError> {
        Ok(self.recover_public_key(prehash)?.evm_address())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(byte: u8) -> Secp256k1SecretKey {
        Secp256k1SecretKey::from_bytes(&[byte; 32]).unwrap()
    }

    #[test]
    fn test_evm_address_known_vector() {
        // Private key: 0x0000000000000000000000000000000000000000000000000000000000000001
        // Expected address: 0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf
        let mut secret_bytes = [0u8; 32];
        secret_bytes[31] = 1;
        let secret = Secp256k1SecretKey::from_bytes(&secret_bytes).unwrap();

        let expected =
            Address::from_slice(&hex::decode("7E5F4552091A69125d5DfCb7b8C2659029395Bdf").unwrap());
        assert_eq!(secret.evm_address(), expected);
    }

    #[test]
    fn test_from_seed_matches_from_bytes() {
        let seed = Seed::from_bytes([0x46; 32]);
        let from_seed = Secp256k1SecretKey::from_seed(&seed).unwrap();
        assert_eq!(from_seed.evm_address(), key(0x46).evm_address());

        // 0x4646..46 is the EIP-155 example key
        assert_eq!(
            from_seed.evm_address(),
            "0x9d8A62f656a8d1615C1294fd71e9CFb3E4855A4F"
                .parse::<Address>()
                .unwrap()
        );
    }

    #[test]
    fn test_zero_and_overflowing_seeds_rejected() {
        assert_eq!(
            Secp256k1SecretKey::from_seed(&Seed::from_bytes([0u8; 32])).unwrap_err(),
            CryptoError::InvalidSecretKey
        );
        assert_eq!(
            Secp256k1SecretKey::from_seed(&Seed::from_bytes([0xFF; 32])).unwrap_err(),
            CryptoError::InvalidSecretKey
        );
    }

    #[test]
    fn test_sign_is_deterministic() {
        let prehash = keccak256(b"deterministic");
        let a = key(0x11).sign_prehash_recoverable(&prehash).unwrap();
        let b = key(0x11).sign_prehash_recoverable(&prehash).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_signature_is_low_s() {
        // n / 2
        let half_order = U256::from_be_slice(
            &hex::decode("7fffffffffffffffffffffffffffffff5d576e7357a4501ddfe92f46681b20a0").unwrap(),
        );
        for i in 0u8..16 {
            let prehash = keccak256([i]);
            let sig = key(0x22).sign_prehash_recoverable(&prehash).unwrap();
            assert!(sig.s <= half_order);
            assert!(sig.recovery_id <= 1);
        }
    }

    #[test]
    fn test_recover_address() {
        let secret = key(0x33);
        let prehash = keccak256(b"recover me");
        let sig = secret.sign_prehash_recoverable(&prehash).unwrap();

        assert_eq!(sig.recover_address(&prehash).unwrap(), secret.evm_address());
        assert_eq!(
            sig.recover_public_key(&prehash).unwrap(),
            secret.public_key()
        );
    }

    #[test]
    fn test_recover_with_wrong_hash_gives_other_address() {
        let secret = key(0x33);
        let sig = secret
            .sign_prehash_recoverable(&keccak256(b"original"))
            .unwrap();

        match sig.recover_address(&keccak256(b"tampered")) {
            Ok(address) => assert_ne!(address, secret.evm_address()),
            Err(err) => assert_eq!(err, CryptoError::RecoveryFailed),
        }
    }

    #[test]
    fn test_invalid_recovery_id() {
        let prehash = keccak256(b"x");
        let mut sig = key(0x44).sign_prehash_recoverable(&prehash).unwrap();
        sig.recovery_id = 7;
        assert_eq!(
            sig.recover_address(&prehash).unwrap_err(),
            CryptoError::InvalidRecoveryId(7)
        );
    }

    #[test]
    fn test_zero_signature_rejected() {
        let sig = RecoverableSignature {
            r: U256::ZERO,
            s: U256::ZERO,
            recovery_id: 0,
        };
        assert_eq!(
            sig.recover_address(&keccak256(b"x")).unwrap_err(),
            CryptoError::InvalidSignature
        );
    }

    #[test]
    fn test_public_key_encodings() {
        let public = key(0x55).public_key();
        let uncompressed = public.to_uncompressed_bytes();
        assert_eq!(uncompressed[0], 0x04);

        let compressed = public.to_bytes();
        assert!(compressed[0] == 0x02 || compressed[0] == 0x03);
        assert_eq!(compressed[1..], uncompressed[1..33]);
    }

    #[test]
    fn test_secret_key_debug_redacted() {
        let debug = format!("{:?}", key(0x66));
        assert!(debug.contains("REDACTED"));
        assert!(!debug.contains("66666666"));
    }
}
