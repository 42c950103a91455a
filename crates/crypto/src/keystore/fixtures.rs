//! Keystore fixtures for tests
//!
//! Production code never writes keystores. This builder produces V3 documents
//! with cheap KDF parameters and fixed salt/IV so tests stay fast and
//! reproducible.

use serde_json::json;

use super::cipher::{encrypt_secret, CIPHER_AES_128_CTR};
use super::error::{KeystoreError, KeystoreResult};
use super::kdf::{KdfParams, Pbkdf2Params, ScryptParams, PBKDF2_PRF_HMAC_SHA256};
use super::mac::compute_mac;

/// Salt used when none is set
pub const DEFAULT_SALT: [u8; 32] = [0x5A; 32];

/// IV used when none is set
pub const DEFAULT_IV: [u8; 16] = [0x3C; 16];

/// Builder for V3 keystore JSON
#[derive(Default)]
pub struct KeystoreFixture {
    secret: Option<Vec<u8>>,
    password: Option<String>,
    kdf: Option<KdfParams>,
    salt: Option<Vec<u8>>,
    iv: Option<Vec<u8>>,
    address: Option<String>,
    id: Option<String>,
}

impl KeystoreFixture {
    /// Create a new builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the secret to encrypt
    pub fn secret(mut self, secret: &[u8]) -> Self {
        self.secret = Some(secret.to_vec());
        self
    }

    /// Set the password for key derivation
    pub fn password(mut self, password: &str) -> Self {
        self.password = Some(password.to_string());
        self
    }

    /// Use PBKDF2-HMAC-SHA256 with `c` iterations
    pub fn pbkdf2(mut self, c: u32) -> Self {
        self.kdf = Some(KdfParams::Pbkdf2(Pbkdf2Params {
            dklen: 32,
            c,
            prf: PBKDF2_PRF_HMAC_SHA256.to_string(),
            salt: String::new(),
        }));
        self
    }

    /// Use scrypt with the given cost parameters
    pub fn scrypt(mut self, n: u64, r: u32, p: u32) -> Self {
        self.kdf = Some(KdfParams::Scrypt(ScryptParams {
            dklen: 32,
            n,
            r,
            p,
            salt: String::new(),
        }));
        self
    }

    /// Override the salt
    pub fn salt(mut self, salt: &[u8]) -> Self {
        self.salt = Some(salt.to_vec());
        self
    }

    /// Override the IV
    pub fn iv(mut self, iv: &[u8]) -> Self {
        self.iv = Some(iv.to_vec());
        self
    }

    /// Set the declared `address` field
    pub fn address(mut self, address: &str) -> Self {
        self.address = Some(address.to_string());
        self
    }

    /// Set the `id` field
    pub fn id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    /// Build the document as a JSON value
    pub fn build(self) -> KeystoreResult<serde_json::Value> {
        let secret = self
            .secret
            .ok_or_else(|| KeystoreError::InvalidDocument("fixture secret not set".to_string()))?;
        let password = self.password.unwrap_or_default();
        let salt = hex::encode(self.salt.unwrap_or_else(|| DEFAULT_SALT.to_vec()));
        let iv = self.iv.unwrap_or_else(|| DEFAULT_IV.to_vec());

        let kdf = match self.kdf.unwrap_or(KdfParams::Pbkdf2(Pbkdf2Params {
            dklen: 32,
            c: 1,
            prf: PBKDF2_PRF_HMAC_SHA256.to_string(),
            salt: String::new(),
        })) {
            KdfParams::Scrypt(params) => KdfParams::Scrypt(ScryptParams { salt, ..params }),
            KdfParams::Pbkdf2(params) => KdfParams::Pbkdf2(Pbkdf2Params { salt, ..params }),
        };

        let derived_key = kdf.derive_key(password.as_bytes())?;
        let ciphertext = encrypt_secret(&secret, derived_key.encryption_key(), &iv)?;
        let mac = compute_mac(derived_key.mac_key(), &ciphertext);

        let kdfparams = match &kdf {
            KdfParams::Scrypt(params) => serde_json::to_value(params)?,
            KdfParams::Pbkdf2(params) => serde_json::to_value(params)?,
        };

        let mut document = json!({
            "version": 3,
            "crypto": {
                "cipher": CIPHER_AES_128_CTR,
                "ciphertext": hex::encode(&ciphertext),
                "cipherparams": { "iv": hex::encode(&iv) },
                "kdf": kdf.name(),
                "kdfparams": kdfparams,
                "mac": hex::encode(mac),
            },
        });

        if let Some(id) = self.id {
            document["id"] = id.into();
        }
        if let Some(address) = self.address {
            document["address"] = address.into();
        }

        Ok(document)
    }

    /// Build the document as a JSON string
    pub fn build_json(self) -> KeystoreResult<String> {
        Ok(self.build()?.to_string())
    }
}
