//! Property-based tests for transaction signing
//!
//! Uses proptest to verify signing invariants across generated keys and requests.

use alloy_primitives::{Address, Bytes, U256};
use ethvault_crypto::{Secp256k1SecretKey, Seed};
use ethvault_tx::{sign, SignedTransaction, TransactionRequest, MAX_CHAIN_ID};
use proptest::prelude::*;

fn arb_u256() -> impl Strategy<Value = U256> {
    prop_oneof![
        Just(U256::ZERO),
        any::<u64>().prop_map(U256::from),
        any::<[u8; 32]>().prop_map(U256::from_be_bytes),
    ]
}

fn arb_request() -> impl Strategy<Value = TransactionRequest> {
    (
        any::<u64>(),
        arb_u256(),
        any::<u64>(),
        prop::option::of(any::<[u8; 20]>()),
        arb_u256(),
        prop::collection::vec(any::<u8>(), 0..128),
        prop::option::of(1u64..=MAX_CHAIN_ID),
    )
        .prop_map(
            |(nonce, gas_price, gas_limit, to, value, data, chain_id)| TransactionRequest {
                nonce,
                gas_price,
                gas_limit,
                to: to.map(Address::from),
                value,
                data: Bytes::from(data),
                chain_id,
            },
        )
}

fn arb_key() -> impl Strategy<Value = [u8; 32]> {
    any::<[u8; 32]>().prop_filter("valid secp256k1 scalar", |bytes| {
        Secp256k1SecretKey::from_bytes(bytes).is_ok()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Property: signing the same request with the same key is bit-identical
    #[test]
    fn prop_signing_is_deterministic(key in arb_key(), request in arb_request()) {
        let first = sign(&Seed::from_bytes(key), &request).unwrap();
        let second = sign(&Seed::from_bytes(key), &request).unwrap();
        prop_assert_eq!(first.raw(), second.raw());
    }

    /// Property: the recovered signer is the key's address
    #[test]
    fn prop_signer_recovers(key in arb_key(), request in arb_request()) {
        let expected = Secp256k1SecretKey::from_bytes(&key).unwrap().evm_address();
        let signed = sign(&Seed::from_bytes(key), &request).unwrap();
        prop_assert_eq!(signed.recover_signer().unwrap(), expected);
    }

    /// Property: decoding the signed bytes reproduces the request and signature
    #[test]
    fn prop_decode_reproduces_fields(key in arb_key(), request in arb_request()) {
        let signed = sign(&Seed::from_bytes(key), &request).unwrap();
        let decoded = SignedTransaction::decode(signed.raw()).unwrap();

        prop_assert_eq!(decoded.request(), &request);
        prop_assert_eq!(decoded.signature(), signed.signature());
        prop_assert_eq!(decoded.hash(), signed.hash());
    }

    /// Property: `v` carries the chain id
    #[test]
    fn prop_v_encodes_chain_id(key in arb_key(), request in arb_request()) {
        let signed = sign(&Seed::from_bytes(key), &request).unwrap();
        let v = signed.signature().v;
        match request.chain_id {
            Some(chain_id) => prop_assert!(v == chain_id * 2 + 35 || v == chain_id * 2 + 36),
            None => prop_assert!(v == 27 || v == 28),
        }
    }
}
