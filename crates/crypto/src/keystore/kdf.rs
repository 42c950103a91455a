//! Key Derivation Function (KDF) implementation
//!
//! A V3 keystore names its KDF in `crypto.kdf` and carries the matching
//! parameter object in `crypto.kdfparams`. Two schemes are supported:
//!
//! - `scrypt` with `{n, r, p, salt, dklen}`
//! - `pbkdf2` with `{c, prf, salt, dklen}`, where `prf` must be `hmac-sha256`

use salsa20::cipher::{typenum::U4, StreamCipherCore};
use salsa20::SalsaCore;
use secrecy::{ExposeSecret, ExposeSecretMut, SecretBox};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tracing::debug;
use zeroize::{Zeroize, Zeroizing};

use super::error::{KeystoreError, KeystoreResult};
use super::hex_util::decode_hex;
use crate::secure::SecretBytes;

/// KDF identifier for scrypt
pub const KDF_SCRYPT: &str = "scrypt";

/// KDF identifier for PBKDF2
pub const KDF_PBKDF2: &str = "pbkdf2";

/// The only PRF accepted for PBKDF2
pub const PBKDF2_PRF_HMAC_SHA256: &str = "hmac-sha256";

/// Minimum derived key length: 16 bytes of cipher key plus 16 bytes of MAC key
pub const MIN_DKLEN: u32 = 32;

/// Maximum derived key length accepted from a document
pub const MAX_DKLEN: u32 = 64;

/// Default ceiling for scrypt `n` (2^20)
pub const DEFAULT_MAX_SCRYPT_N: u64 = 1 << 20;

/// Default ceiling for the scrypt working vector, `128 * r * n` bytes (1 GiB)
pub const DEFAULT_MAX_SCRYPT_MEMORY: u64 = 1 << 30;

/// Default ceiling for scrypt work, `p * r * n`
pub const DEFAULT_MAX_SCRYPT_WORK: u64 = 1 << 24;

/// Default ceiling for PBKDF2 iterations
pub const DEFAULT_MAX_PBKDF2_C: u32 = 10_000_000;

/// Salsa20/8, the scrypt mixing core
type Salsa20_8 = SalsaCore<U4>;

/// Cost ceilings applied to a document before any derivation work.
///
/// A keystore file is untrusted input; these limits keep a hostile document
/// from pinning the CPU or exhausting memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnlockPolicy {
    /// Largest scrypt `n` accepted
    pub max_scrypt_n: u64,
    /// Largest scrypt working vector (`128 * r * n` bytes) accepted
    pub max_scrypt_memory: u64,
    /// Largest scrypt work factor (`p * r * n`) accepted
    pub max_scrypt_work: u64,
    /// Largest PBKDF2 iteration count accepted
    pub max_pbkdf2_c: u32,
}

impl Default for UnlockPolicy {
    fn default() -> Self {
        Self {
            max_scrypt_n: DEFAULT_MAX_SCRYPT_N,
            max_scrypt_memory: DEFAULT_MAX_SCRYPT_MEMORY,
            max_scrypt_work: DEFAULT_MAX_SCRYPT_WORK,
            max_pbkdf2_c: DEFAULT_MAX_PBKDF2_C,
        }
    }
}

/// scrypt parameters as stored in `kdfparams`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScryptParams {
    /// Derived key length in bytes
    pub dklen: u32,
    /// CPU/memory cost parameter (must be power of 2)
    pub n: u64,
    /// Block size parameter
    pub r: u32,
    /// Parallelization parameter
    pub p: u32,
    /// Salt as hex string
    pub salt: String,
}

/// PBKDF2 parameters as stored in `kdfparams`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Pbkdf2Params {
    /// Derived key length in bytes
    pub dklen: u32,
    /// Iteration count
    pub c: u32,
    /// Pseudo-random function name
    pub prf: String,
    /// Salt as hex string
    pub salt: String,
}

/// KDF parameters, one variant per supported algorithm
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KdfParams {
    Scrypt(ScryptParams),
    Pbkdf2(Pbkdf2Params),
}

impl KdfParams {
    /// Build typed parameters from the document's `kdf` name and raw
    /// `kdfparams` object.
    pub fn from_json(kdf: &str, params: &serde_json::Value) -> KeystoreResult<Self> {
        match kdf {
            KDF_SCRYPT => ScryptParams::deserialize(params)
                .map(KdfParams::Scrypt)
                .map_err(|e| KeystoreError::InvalidKdfParams(format!("scrypt: {}", e))),
            KDF_PBKDF2 => Pbkdf2Params::deserialize(params)
                .map(KdfParams::Pbkdf2)
                .map_err(|e| KeystoreError::InvalidKdfParams(format!("pbkdf2: {}", e))),
            other => Err(KeystoreError::UnsupportedKdf(other.to_string())),
        }
    }

    /// The `kdf` identifier for these parameters
    pub fn name(&self) -> &'static str {
        match self {
            KdfParams::Scrypt(_) => KDF_SCRYPT,
            KdfParams::Pbkdf2(_) => KDF_PBKDF2,
        }
    }

    /// Length of the key this KDF will produce
    pub fn dklen(&self) -> u32 {
        match self {
            KdfParams::Scrypt(params) => params.dklen,
            KdfParams::Pbkdf2(params) => params.dklen,
        }
    }

    /// Hex-encoded salt
    pub fn salt_hex(&self) -> &str {
        match self {
            KdfParams::Scrypt(params) => &params.salt,
            KdfParams::Pbkdf2(params) => &params.salt,
        }
    }

    /// Validate the parameters against the algorithm's rules and the policy
    pub fn validate(&self, policy: &UnlockPolicy) -> KeystoreResult<()> {
        let dklen = self.dklen();
        if !(MIN_DKLEN..=MAX_DKLEN).contains(&dklen) {
            return Err(KeystoreError::InvalidKdfParams(format!(
                "dklen must be between {} and {}, got {}",
                MIN_DKLEN, MAX_DKLEN, dklen
            )));
        }

        match self {
            KdfParams::Scrypt(ScryptParams { n, r, p, .. }) => {
                // n must be a power of 2
                if *n < 2 || !n.is_power_of_two() {
                    return Err(KeystoreError::InvalidKdfParams(
                        "n must be a power of 2 greater than 1".to_string(),
                    ));
                }
                if *n > policy.max_scrypt_n {
                    return Err(KeystoreError::InvalidKdfParams(format!(
                        "n {} exceeds the allowed maximum {}",
                        n, policy.max_scrypt_n
                    )));
                }
                if *r == 0 {
                    return Err(KeystoreError::InvalidKdfParams(
                        "r must be positive".to_string(),
                    ));
                }
                if *p == 0 {
                    return Err(KeystoreError::InvalidKdfParams(
                        "p must be positive".to_string(),
                    ));
                }

                let memory = 128u64
                    .checked_mul(u64::from(*r))
                    .and_then(|bytes| bytes.checked_mul(*n));
                match memory {
                    Some(bytes) if bytes <= policy.max_scrypt_memory => {}
                    _ => {
                        return Err(KeystoreError::InvalidKdfParams(format!(
                            "scrypt memory 128*r*n (r={}, n={}) exceeds the allowed maximum {} bytes",
                            r, n, policy.max_scrypt_memory
                        )));
                    }
                }

                let work = u64::from(*p)
                    .checked_mul(u64::from(*r))
                    .and_then(|blocks| blocks.checked_mul(*n));
                match work {
                    Some(work) if work <= policy.max_scrypt_work => {}
                    _ => {
                        return Err(KeystoreError::InvalidKdfParams(format!(
                            "scrypt work p*r*n (p={}, r={}, n={}) exceeds the allowed maximum {}",
                            p, r, n, policy.max_scrypt_work
                        )));
                    }
                }
            }
            KdfParams::Pbkdf2(Pbkdf2Params { c, prf, .. }) => {
                if prf != PBKDF2_PRF_HMAC_SHA256 {
                    return Err(KeystoreError::UnsupportedKdfParams(format!(
                        "pbkdf2 prf must be {}, got {}",
                        PBKDF2_PRF_HMAC_SHA256, prf
                    )));
                }
                if *c == 0 {
                    return Err(KeystoreError::InvalidKdfParams(
                        "c must be positive".to_string(),
                    ));
                }
                if *c > policy.max_pbkdf2_c {
                    return Err(KeystoreError::InvalidKdfParams(format!(
                        "c {} exceeds the allowed maximum {}",
                        c, policy.max_pbkdf2_c
                    )));
                }
            }
        }

        decode_hex(self.salt_hex())
            .map_err(|e| KeystoreError::InvalidKdfParams(format!("invalid salt hex: {}", e)))?;

        Ok(())
    }

    /// Derive a key from the given password.
    ///
    /// Callers must run [`KdfParams::validate`] first.
    pub fn derive_key(&self, password: &[u8]) -> KeystoreResult<DerivedKey> {
        let salt = decode_hex(self.salt_hex())
            .map_err(|e| KeystoreError::InvalidKdfParams(format!("invalid salt hex: {}", e)))?;

        let derived = match self {
            KdfParams::Scrypt(ScryptParams { dklen, n, r, p, .. }) => {
                debug!(n, r, p, "deriving key with scrypt");
                scrypt_derive_key(password, &salt, *n, *r, *p, *dklen as usize)?
            }
            KdfParams::Pbkdf2(Pbkdf2Params { dklen, c, .. }) => {
                debug!(c, "deriving key with pbkdf2-hmac-sha256");
                pbkdf2_derive_key(password, &salt, *c, *dklen as usize)
            }
        };

        DerivedKey::new(derived)
    }
}

/// KDF output, split into the cipher key and the MAC key.
///
/// Zeroized on drop.
pub struct DerivedKey(SecretBytes);

impl DerivedKey {
    fn new(bytes: SecretBytes) -> KeystoreResult<Self> {
        let len = bytes.expose_secret().len();
        if len < MIN_DKLEN as usize {
            return Err(KeystoreError::InvalidKdfParams(format!(
                "derived key must be at least {} bytes, got {}",
                MIN_DKLEN, len
            )));
        }
        Ok(Self(bytes))
    }

    /// `derivedKey[0:16]`, the AES-128 key
    pub fn encryption_key(&self) -> &[u8] {
        &self.0.expose_secret()[..16]
    }

    /// `derivedKey[16:32]`, the MAC key
    pub fn mac_key(&self) -> &[u8] {
        &self.0.expose_secret()[16..32]
    }
}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivedKey")
            .field("length", &self.0.expose_secret().len())
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Derive a key using scrypt
///
/// PBKDF2-HMAC-SHA256 expands the password into `p` blocks of `128 * r`
/// bytes, ROMix runs each block through `n` rounds of Salsa20/8 BlockMix,
/// and a second PBKDF2 pass compresses the blocks into `dklen` bytes.
///
/// `n` is not capped at `2^(16 r)`: published V3 keystores use `r = 1` with
/// `n = 2^18`. Resource limits are [`UnlockPolicy`]'s job.
///
/// # Arguments
///
/// * `password` - User password bytes
/// * `salt` - Salt bytes
/// * `n` - CPU/memory cost parameter (must be power of 2)
/// * `r` - Block size parameter
/// * `p` - Parallelization parameter
/// * `dklen` - Desired key length in bytes
pub fn scrypt_derive_key(
    password: &[u8],
    salt: &[u8],
    n: u64,
    r: u32,
    p: u32,
    dklen: usize,
) -> KeystoreResult<SecretBytes> {
    if n < 2 || !n.is_power_of_two() || r == 0 || p == 0 || dklen == 0 {
        return Err(KeystoreError::InvalidKdfParams(
            "invalid scrypt parameters".to_string(),
        ));
    }

    let too_large = || KeystoreError::InvalidKdfParams("scrypt parameters too large".to_string());
    let n = usize::try_from(n).map_err(|_| too_large())?;
    let block_len = usize::try_from(r)
        .ok()
        .and_then(|r| r.checked_mul(128))
        .ok_or_else(too_large)?;
    let blocks_len = usize::try_from(p)
        .ok()
        .and_then(|p| p.checked_mul(block_len))
        .ok_or_else(too_large)?;
    let vector_len = block_len.checked_mul(n).ok_or_else(too_large)?;

    let mut blocks = zeroed(blocks_len)?;
    pbkdf2::pbkdf2_hmac::<Sha256>(password, salt, 1, blocks.as_mut_slice());

    let mut vector = zeroed(vector_len)?;
    let mut scratch = zeroed(block_len)?;
    for block in blocks.chunks_mut(block_len) {
        ro_mix(block, vector.as_mut_slice(), scratch.as_mut_slice(), n);
    }

    let mut output: SecretBytes = SecretBox::new(Box::new(vec![0u8; dklen]));
    pbkdf2::pbkdf2_hmac::<Sha256>(password, blocks.as_slice(), 1, output.expose_secret_mut());

    Ok(output)
}

/// A zeroed buffer, failing instead of aborting when memory is short
fn zeroed(len: usize) -> KeystoreResult<Zeroizing<Vec<u8>>> {
    let mut buffer = Vec::new();
    buffer.try_reserve_exact(len).map_err(|_| {
        KeystoreError::KdfError(format!("cannot allocate {} bytes for scrypt", len))
    })?;
    buffer.resize(len, 0);
    Ok(Zeroizing::new(buffer))
}

/// scrypt ROMix over one `128 * r` byte block
fn ro_mix(block: &mut [u8], vector: &mut [u8], scratch: &mut [u8], n: usize) {
    let len = block.len();

    for chunk in vector.chunks_mut(len) {
        chunk.copy_from_slice(block);
        block_mix(chunk, block);
    }

    for _ in 0..n {
        let j = integerify(block) & (n - 1);
        for ((out, a), b) in scratch
            .iter_mut()
            .zip(block.iter())
            .zip(vector[j * len..(j + 1) * len].iter())
        {
            *out = a ^ b;
        }
        block_mix(scratch, block);
    }
}

/// Low 64 bits of the last 64-byte sub-block, little-endian
fn integerify(block: &[u8]) -> usize {
    let tail = &block[block.len() - 64..];
    let mut word = [0u8; 8];
    word.copy_from_slice(&tail[..8]);
    u64::from_le_bytes(word) as usize
}

/// scrypt BlockMix with Salsa20/8
fn block_mix(input: &[u8], output: &mut [u8]) {
    let half = input.len() / 2;
    let mut x = [0u8; 64];
    x.copy_from_slice(&input[input.len() - 64..]);

    for (i, chunk) in input.chunks_exact(64).enumerate() {
        let mut state = [0u32; 16];
        for ((word, xs), cs) in state
            .iter_mut()
            .zip(x.chunks_exact(4))
            .zip(chunk.chunks_exact(4))
        {
            *word = u32::from_le_bytes([xs[0] ^ cs[0], xs[1] ^ cs[1], xs[2] ^ cs[2], xs[3] ^ cs[3]]);
        }

        Salsa20_8::from_raw_state(state).write_keystream_block((&mut x).into());
        state.zeroize();

        // Even sub-blocks fill the first half, odd ones the second
        let offset = (i / 2) * 64 + if i % 2 == 0 { 0 } else { half };
        output[offset..offset + 64].copy_from_slice(&x);
    }

    x.zeroize();
}

/// Derive a key using PBKDF2-HMAC-SHA256
pub fn pbkdf2_derive_key(password: &[u8], salt: &[u8], c: u32, dklen: usize) -> SecretBytes {
    let mut output: SecretBytes = SecretBox::new(Box::new(vec![0u8; dklen]));
    pbkdf2::pbkdf2_hmac::<Sha256>(password, salt, c, output.expose_secret_mut());
    output
}
