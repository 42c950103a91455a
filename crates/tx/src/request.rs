//! Transaction requests
//!
//! [`TransactionRequest`] is the typed, wire-width form that gets encoded and
//! signed. [`TransactionFields`] is what a wallet form or a JSON file hands
//! over: quantities as decimal or `0x`-hex strings (or plain numbers), the
//! recipient and calldata as hex.

use alloy_primitives::{keccak256, Address, Bytes, B256, U256};
use ethvault_crypto::keystore::decode_hex;
use serde::{Deserialize, Serialize};

use crate::encoding::encode_unsigned;
use crate::error::{TxError, TxResult};

/// Largest chain id whose EIP-155 `v` (`chain_id * 2 + 36`) still fits in a u64
pub const MAX_CHAIN_ID: u64 = (u64::MAX - 36) / 2;

/// A legacy transaction ready to be signed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionRequest {
    pub nonce: u64,
    pub gas_price: U256,
    pub gas_limit: u64,
    /// `None` creates a contract
    pub to: Option<Address>,
    pub value: U256,
    pub data: Bytes,
    /// `Some` requests EIP-155 replay protection
    pub chain_id: Option<u64>,
}

impl TransactionRequest {
    /// Check field constraints that the types alone do not enforce
    pub fn validate(&self) -> TxResult<()> {
        match self.chain_id {
            Some(0) => Err(TxError::field("chainId", "must be non-zero")),
            Some(id) if id > MAX_CHAIN_ID => Err(TxError::field(
                "chainId",
                format!("{} exceeds the maximum {}", id, MAX_CHAIN_ID),
            )),
            _ => Ok(()),
        }
    }

    /// The hash that gets signed: keccak256 of the unsigned encoding
    pub fn signing_hash(&self) -> B256 {
        keccak256(encode_unsigned(self))
    }

    /// `v` for the given recovery id
    pub fn v_for_recovery_id(&self, recovery_id: u8) -> u64 {
        match self.chain_id {
            Some(chain_id) => u64::from(recovery_id) + chain_id * 2 + 35,
            None => u64::from(recovery_id) + 27,
        }
    }

    pub fn is_contract_creation(&self) -> bool {
        self.to.is_none()
    }
}

/// A quantity as a form or JSON file supplies it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Quantity {
    Number(u64),
    /// Decimal, or hex with a `0x` prefix
    Text(String),
}

impl Default for Quantity {
    fn default() -> Self {
        Quantity::Number(0)
    }
}

impl From<u64> for Quantity {
    fn from(value: u64) -> Self {
        Quantity::Number(value)
    }
}

impl From<&str> for Quantity {
    fn from(value: &str) -> Self {
        Quantity::Text(value.to_string())
    }
}

impl Quantity {
    /// Parse as a 256-bit unsigned integer
    pub fn to_u256(&self, field: &'static str) -> TxResult<U256> {
        match self {
            Quantity::Number(value) => Ok(U256::from(*value)),
            Quantity::Text(text) => parse_u256(field, text),
        }
    }

    /// Parse as a 64-bit unsigned integer
    pub fn to_u64(&self, field: &'static str) -> TxResult<u64> {
        match self {
            Quantity::Number(value) => Ok(*value),
            Quantity::Text(text) => {
                let value = parse_u256(field, text)?;
                if value.bit_len() > 64 {
                    return Err(TxError::field(field, "does not fit in 64 bits"));
                }
                Ok(value.as_limbs()[0])
            }
        }
    }
}

fn parse_u256(field: &'static str, text: &str) -> TxResult<U256> {
    let text = text.trim();
    if text.is_empty() {
        return Err(TxError::field(field, "empty quantity"));
    }

    let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some("") => return Ok(U256::ZERO),
        Some(digits) => U256::from_str_radix(digits, 16),
        None => U256::from_str_radix(text, 10),
    };

    parsed.map_err(|e| TxError::field(field, format!("{:?}: {}", text, e)))
}

/// Form-shaped transaction input
///
/// ```json
/// {
///   "nonce": 9,
///   "gasPrice": "20000000000",
///   "gasLimit": "0x5208",
///   "to": "0x3535353535353535353535353535353535353535",
///   "value": "1000000000000000000",
///   "data": "0x",
///   "chainId": 1
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionFields {
    pub nonce: Quantity,
    pub gas_price: Quantity,
    #[serde(alias = "gas")]
    pub gas_limit: Quantity,
    /// Absent or empty for contract creation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(default)]
    pub value: Quantity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<Quantity>,
}

impl TryFrom<&TransactionFields> for TransactionRequest {
    type Error = TxError;

    fn try_from(fields: &TransactionFields) -> TxResult<Self> {
        let to = match fields.to.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => {
                let bytes = decode_hex(raw).map_err(|e| TxError::field("to", e.to_string()))?;
                if bytes.len() != 20 {
                    return Err(TxError::field(
                        "to",
                        format!("expected 20 bytes, got {}", bytes.len()),
                    ));
                }
                Some(Address::from_slice(&bytes))
            }
        };

        let data = match fields.data.as_deref() {
            None => Bytes::new(),
            Some(raw) => decode_hex(raw)
                .map(Bytes::from)
                .map_err(|e| TxError::field("data", e.to_string()))?,
        };

        let chain_id = fields
            .chain_id
            .as_ref()
            .map(|id| id.to_u64("chainId"))
            .transpose()?;

        let request = TransactionRequest {
            nonce: fields.nonce.to_u64("nonce")?,
            gas_price: fields.gas_price.to_u256("gasPrice")?,
            gas_limit: fields.gas_limit.to_u64("gasLimit")?,
            to,
            value: fields.value.to_u256("value")?,
            data,
            chain_id,
        };
        request.validate()?;
        Ok(request)
    }
}

impl TryFrom<TransactionFields> for TransactionRequest {
    type Error = TxError;

    fn try_from(fields: TransactionFields) -> TxResult<Self> {
        TransactionRequest::try_from(&fields)
    }
}
