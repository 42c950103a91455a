//! RLP encoding of legacy transactions
//!
//! # Layout
//!
//! Unsigned (signing payload):
//! `[nonce, gasPrice, gasLimit, to, value, data]`, or with EIP-155
//! `[nonce, gasPrice, gasLimit, to, value, data, chainId, 0, 0]`
//!
//! Signed:
//! `[nonce, gasPrice, gasLimit, to, value, data, v, r, s]`
//!
//! Integers are big-endian with leading zeros stripped (zero is the empty
//! string `0x80`). A missing `to` is the empty string as well.

use alloy_primitives::{Address, Bytes, U256};
use alloy_rlp::{Buf, BufMut, Decodable, Encodable, Header, EMPTY_STRING_CODE};

use crate::error::TxResult;
use crate::request::TransactionRequest;
use crate::signed::TxSignature;

fn to_length(to: &Option<Address>) -> usize {
    match to {
        Some(address) => address.length(),
        None => 1,
    }
}

fn encode_to(to: &Option<Address>, out: &mut dyn BufMut) {
    match to {
        Some(address) => address.encode(out),
        None => out.put_u8(EMPTY_STRING_CODE),
    }
}

fn fields_length(request: &TransactionRequest) -> usize {
    request.nonce.length()
        + request.gas_price.length()
        + request.gas_limit.length()
        + to_length(&request.to)
        + request.value.length()
        + request.data.length()
}

fn encode_fields(request: &TransactionRequest, out: &mut dyn BufMut) {
    request.nonce.encode(out);
    request.gas_price.encode(out);
    request.gas_limit.encode(out);
    encode_to(&request.to, out);
    request.value.encode(out);
    request.data.encode(out);
}

/// Encode the signing payload for `request`
pub fn encode_unsigned(request: &TransactionRequest) -> Vec<u8> {
    let mut payload_length = fields_length(request);
    if let Some(chain_id) = request.chain_id {
        payload_length += chain_id.length() + 0u8.length() + 0u8.length();
    }

    let mut out = Vec::with_capacity(payload_length + 9);
    Header {
        list: true,
        payload_length,
    }
    .encode(&mut out);
    encode_fields(request, &mut out);
    if let Some(chain_id) = request.chain_id {
        chain_id.encode(&mut out);
        0u8.encode(&mut out);
        0u8.encode(&mut out);
    }
    out
}

/// Encode a signed transaction
pub fn encode_signed(request: &TransactionRequest, signature: &TxSignature) -> Vec<u8> {
    let payload_length = fields_length(request)
        + signature.v.length()
        + signature.r.length()
        + signature.s.length();

    let mut out = Vec::with_capacity(payload_length + 9);
    Header {
        list: true,
        payload_length,
    }
    .encode(&mut out);
    encode_fields(request, &mut out);
    signature.v.encode(&mut out);
    signature.r.encode(&mut out);
    signature.s.encode(&mut out);
    out
}

/// Decode a signed legacy transaction
///
/// The returned request has no chain id; callers recover it from `v`.
/// The whole of `raw` must be one list.
pub fn decode_signed(raw: &[u8]) -> TxResult<(TransactionRequest, TxSignature)> {
    let mut buf = raw;
    let header = Header::decode(&mut buf)?;
    if !header.list {
        return Err(alloy_rlp::Error::UnexpectedString.into());
    }
    if buf.len() < header.payload_length {
        return Err(alloy_rlp::Error::InputTooShort.into());
    }
    if buf.len() > header.payload_length {
        return Err(alloy_rlp::Error::Custom("trailing bytes after transaction").into());
    }

    let payload = &mut buf;
    let nonce = u64::decode(payload)?;
    let gas_price = U256::decode(payload)?;
    let gas_limit = u64::decode(payload)?;
    let to = match payload.first() {
        Some(&EMPTY_STRING_CODE) => {
            payload.advance(1);
            None
        }
        _ => Some(Address::decode(payload)?),
    };
    let value = U256::decode(payload)?;
    let data = Bytes::decode(payload)?;
    let v = u64::decode(payload)?;
    let r = U256::decode(payload)?;
    let s = U256::decode(payload)?;

    if !payload.is_empty() {
        return Err(alloy_rlp::Error::ListLengthMismatch {
            expected: header.payload_length,
            got: header.payload_length - payload.len(),
        }
        .into());
    }

    let request = TransactionRequest {
        nonce,
        gas_price,
        gas_limit,
        to,
        value,
        data,
        chain_id: None,
    };
    Ok((request, TxSignature { v, r, s }))
}
