//! Signed transactions

use alloy_primitives::{keccak256, Address, Bytes, B256, U256};
use ethvault_crypto::RecoverableSignature;
use serde::Serialize;

use crate::encoding::{decode_signed, encode_signed};
use crate::error::{TxError, TxResult};
use crate::request::TransactionRequest;

/// `(v, r, s)` of a legacy transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TxSignature {
    pub v: u64,
    pub r: U256,
    pub s: U256,
}

impl TxSignature {
    /// The chain id encoded in `v`, if `v` is EIP-155 style
    pub fn chain_id(&self) -> Option<u64> {
        (self.v >= 35).then(|| (self.v - 35) / 2)
    }

    /// The secp256k1 recovery id encoded in `v`
    pub fn recovery_id(&self) -> TxResult<u8> {
        match self.v {
            27 | 28 => Ok((self.v - 27) as u8),
            v if v >= 35 => Ok(((v - 35) % 2) as u8),
            v => Err(TxError::InvalidSignature(format!(
                "v = {} is neither 27/28 nor EIP-155",
                v
            ))),
        }
    }

    fn recoverable(&self) -> TxResult<RecoverableSignature> {
        Ok(RecoverableSignature {
            r: self.r,
            s: self.s,
            recovery_id: self.recovery_id()?,
        })
    }
}

/// A signed transaction and its canonical encoding
///
/// Produced per signing call or decoded from raw bytes; never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    request: TransactionRequest,
    signature: TxSignature,
    encoded: Bytes,
}

impl SignedTransaction {
    pub(crate) fn new(request: TransactionRequest, signature: TxSignature) -> Self {
        let encoded = Bytes::from(encode_signed(&request, &signature));
        Self {
            request,
            signature,
            encoded,
        }
    }

    /// Decode raw signed bytes, recovering the chain id from `v`
    pub fn decode(raw: &[u8]) -> TxResult<Self> {
        let (mut request, signature) = decode_signed(raw)?;
        signature.recovery_id()?;
        request.chain_id = signature.chain_id();
        request.validate()?;

        Ok(Self {
            request,
            signature,
            encoded: Bytes::copy_from_slice(raw),
        })
    }

    pub fn request(&self) -> &TransactionRequest {
        &self.request
    }

    pub fn signature(&self) -> &TxSignature {
        &self.signature
    }

    pub fn chain_id(&self) -> Option<u64> {
        self.request.chain_id
    }

    /// Canonical RLP bytes, ready for `eth_sendRawTransaction`
    pub fn raw(&self) -> &Bytes {
        &self.encoded
    }

    pub fn into_raw(self) -> Bytes {
        self.encoded
    }

    /// Transaction hash: keccak256 of the signed encoding
    pub fn hash(&self) -> B256 {
        keccak256(&self.encoded)
    }

    /// The hash that was signed
    pub fn signing_hash(&self) -> B256 {
        self.request.signing_hash()
    }

    /// Recover the sender address from the signature
    pub fn recover_signer(&self) -> TxResult<Address> {
        self.signature
            .recoverable()?
            .recover_address(&self.signing_hash())
            .map_err(|e| TxError::InvalidSignature(e.to_string()))
    }
}
