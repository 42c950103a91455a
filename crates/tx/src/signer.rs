//! Transaction signing
//!
//! Signing is pure: encode, hash, sign, re-encode. Given the same seed and
//! request it always produces the same bytes (RFC 6979 nonces, low-s).

use ethvault_crypto::{Secp256k1SecretKey, Seed};
use tracing::debug;

use crate::error::{TxError, TxResult};
use crate::request::TransactionRequest;
use crate::signed::{SignedTransaction, TxSignature};

/// Sign `request` with the key held in `seed`
///
/// Fails with [`TxError::InvalidTransactionField`] for out-of-range fields
/// and [`TxError::SigningFailed`] when the seed is zero or not below the
/// curve order.
pub fn sign(seed: &Seed, request: &TransactionRequest) -> TxResult<SignedTransaction> {
    request.validate()?;

    let secret_key =
        Secp256k1SecretKey::from_seed(seed).map_err(|e| TxError::SigningFailed(e.to_string()))?;

    let signing_hash = request.signing_hash();
    debug!(
        chain_id = ?request.chain_id,
        nonce = request.nonce,
        contract_creation = request.is_contract_creation(),
        "signing transaction"
    );

    let signature = secret_key
        .sign_prehash_recoverable(&signing_hash)
        .map_err(|e| TxError::SigningFailed(e.to_string()))?;

    Ok(SignedTransaction::new(
        request.clone(),
        TxSignature {
            v: request.v_for_recovery_id(signature.recovery_id),
            r: signature.r,
            s: signature.s,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{Address, Bytes, U256};

    fn eip155_seed() -> Seed {
        Seed::from_bytes([0x46; 32])
    }

    fn eip155_request() -> TransactionRequest {
        TransactionRequest {
            nonce: 9,
            gas_price: U256::from(20_000_000_000u64),
            gas_limit: 21_000,
            to: Some(Address::repeat_byte(0x35)),
            value: U256::from(1_000_000_000_000_000_000u128),
            data: Bytes::new(),
            chain_id: Some(1),
        }
    }

    #[test]
    fn test_eip155_vector() {
        let signed = sign(&eip155_seed(), &eip155_request()).unwrap();

        assert_eq!(
            hex::encode(signed.signing_hash()),
            "daf5a779ae972f972197303d7b574746c7ef83eadac0f2791ad23db92e4c8e53"
        );
        assert_eq!(signed.signature().v, 37);
        assert_eq!(
            hex::encode(signed.signature().r.to_be_bytes::<32>()),
            "28ef61340bd939bc2195fe537567866003e1a15d3c71ff63e1590620aa636276"
        );
        assert_eq!(
            hex::encode(signed.signature().s.to_be_bytes::<32>()),
            "67cbe9d8997f761aecb703304b3800ccf555c9f3dc64214b297fb1966a3b6d83"
        );
        assert_eq!(
            hex::encode(signed.raw()),
            "f86c098504a817c800825208943535353535353535353535353535353535353535880de0b6b3a76400008025a028ef61340bd939bc2195fe537567866003e1a15d3c71ff63e1590620aa636276a067cbe9d8997f761aecb703304b3800ccf555c9f3dc64214b297fb1966a3b6d83"
        );
    }

    #[test]
    fn test_signing_is_deterministic() {
        let first = sign(&eip155_seed(), &eip155_request()).unwrap();
        let second = sign(&eip155_seed(), &eip155_request()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_recovered_signer_matches_seed() {
        let seed = eip155_seed();
        let expected = Secp256k1SecretKey::from_seed(&seed).unwrap().evm_address();

        for chain_id in [None, Some(1), Some(5), Some(1337)] {
            let request = TransactionRequest {
                chain_id,
                ..eip155_request()
            };
            let signed = sign(&seed, &request).unwrap();
            assert_eq!(signed.recover_signer().unwrap(), expected);
            assert_eq!(signed.chain_id(), chain_id);
        }
    }

    #[test]
    fn test_legacy_v_is_27_or_28() {
        let request = TransactionRequest {
            chain_id: None,
            ..eip155_request()
        };
        let signed = sign(&eip155_seed(), &request).unwrap();
        assert!(matches!(signed.signature().v, 27 | 28));
    }

    #[test]
    fn test_invalid_seed_is_signing_failure() {
        let zero = Seed::from_bytes([0u8; 32]);
        assert!(matches!(
            sign(&zero, &eip155_request()),
            Err(TxError::SigningFailed(_))
        ));

        let over_order = Seed::from_bytes([0xFF; 32]);
        assert!(matches!(
            sign(&over_order, &eip155_request()),
            Err(TxError::SigningFailed(_))
        ));
    }

    #[test]
    fn test_invalid_field_checked_before_key() {
        let request = TransactionRequest {
            chain_id: Some(0),
            ..eip155_request()
        };
        let zero = Seed::from_bytes([0u8; 32]);
        assert!(matches!(
            sign(&zero, &request),
            Err(TxError::InvalidTransactionField { field: "chainId", .. })
        ));
    }

    #[test]
    fn test_decode_reproduces_request() {
        let signed = sign(&eip155_seed(), &eip155_request()).unwrap();
        let decoded = SignedTransaction::decode(signed.raw()).unwrap();

        assert_eq!(decoded, signed);
        assert_eq!(decoded.request(), &eip155_request());
    }
}
