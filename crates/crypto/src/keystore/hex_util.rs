//! Hex normalization for keystore fields
//!
//! Keystore files written by different wallets disagree on case and on the
//! `0x` prefix. Everything is normalized to raw bytes before comparison.

/// Decode a hex string, accepting either case and an optional `0x`/`0X` prefix.
pub fn decode_hex(value: &str) -> Result<Vec<u8>, hex::FromHexError> {
    let trimmed = value.trim();
    let stripped = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    hex::decode(stripped)
}
