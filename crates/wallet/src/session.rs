//! Unlocked wallet sessions
//!
//! A [`SeedHandle`] is the product of one unlock. It shares the seed
//! read-only behind an `Arc`, so clones can sign concurrently. The seed is
//! zeroized when the last handle is dropped.

use std::sync::Arc;

use alloy_primitives::{Address, Bytes};
use ethvault_crypto::keystore::{KeystoreDocument, UnlockPolicy};
use ethvault_crypto::{Secp256k1SecretKey, SecretString, Seed};
use ethvault_tx::{SignedTransaction, TransactionFields, TransactionRequest};
use secrecy::ExposeSecret;
use tracing::{debug, info, warn};

use crate::error::{WalletError, WalletResult};

/// An unlocked key
#[derive(Clone)]
pub struct SeedHandle {
    seed: Arc<Seed>,
    address: Option<Address>,
}

impl SeedHandle {
    fn new(seed: Seed) -> Self {
        let address = match Secp256k1SecretKey::from_seed(&seed) {
            Ok(key) => Some(key.evm_address()),
            Err(err) => {
                warn!(error = %err, "unlocked seed is not a usable secp256k1 key");
                None
            }
        };

        Self {
            seed: Arc::new(seed),
            address,
        }
    }

    /// The address of the key, or `None` if the seed is not a valid scalar
    pub fn address(&self) -> Option<Address> {
        self.address
    }

    /// Sign a typed request
    pub fn sign_request(&self, request: &TransactionRequest) -> WalletResult<SignedTransaction> {
        Ok(ethvault_tx::sign(&self.seed, request)?)
    }

    /// Parse form fields and sign them
    pub fn sign(&self, fields: &TransactionFields) -> WalletResult<SignedTransaction> {
        let request = TransactionRequest::try_from(fields)?;
        self.sign_request(&request)
    }
}

impl std::fmt::Debug for SeedHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeedHandle")
            .field("address", &self.address)
            .field("seed", &"[REDACTED]")
            .finish()
    }
}

/// Parse and unlock a keystore, producing a handle
pub(crate) fn unlock_document(
    file_bytes: &[u8],
    password: &SecretString,
    policy: &UnlockPolicy,
) -> WalletResult<SeedHandle> {
    let document = KeystoreDocument::from_slice(file_bytes)?;
    let seed = document.unlock_with_policy(password.expose_secret().as_bytes(), policy)?;
    let handle = SeedHandle::new(seed);

    match (document.declared_address(), handle.address) {
        (Some(declared), Some(derived)) if declared != derived => {
            warn!(%declared, %derived, "keystore address field does not match the unlocked key");
        }
        (_, Some(derived)) => {
            info!(address = %derived, "keystore unlocked");
        }
        _ => {}
    }

    Ok(handle)
}

/// Unlock a V3 keystore with the default [`UnlockPolicy`]
pub fn unlock_wallet(file_bytes: &[u8], password: &SecretString) -> WalletResult<SeedHandle> {
    unlock_document(file_bytes, password, &UnlockPolicy::default())
}

/// Sign form fields with an unlocked key, returning the raw signed bytes
pub fn sign_transaction(handle: &SeedHandle, fields: &TransactionFields) -> WalletResult<Bytes> {
    Ok(handle.sign(fields)?.into_raw())
}

/// A wallet that can be unlocked once and locked again
///
/// Locking drops this session's handle. Handles cloned out of the session
/// keep the seed alive until they are dropped too.
#[derive(Debug, Default)]
pub struct WalletSession {
    handle: Option<SeedHandle>,
}

impl WalletSession {
    /// Unlock with the default policy
    pub fn unlock(file_bytes: &[u8], password: &SecretString) -> WalletResult<Self> {
        Self::unlock_with_policy(file_bytes, password, &UnlockPolicy::default())
    }

    /// Unlock under the given KDF cost ceilings
    pub fn unlock_with_policy(
        file_bytes: &[u8],
        password: &SecretString,
        policy: &UnlockPolicy,
    ) -> WalletResult<Self> {
        Ok(Self::from(unlock_document(file_bytes, password, policy)?))
    }

    pub fn is_unlocked(&self) -> bool {
        self.handle.is_some()
    }

    /// The unlocked key's handle
    pub fn handle(&self) -> WalletResult<&SeedHandle> {
        self.handle.as_ref().ok_or(WalletError::Locked)
    }

    pub fn address(&self) -> WalletResult<Option<Address>> {
        Ok(self.handle()?.address())
    }

    /// Sign form fields
    pub fn sign(&self, fields: &TransactionFields) -> WalletResult<SignedTransaction> {
        self.handle()?.sign(fields)
    }

    /// Sign a typed request
    pub fn sign_request(&self, request: &TransactionRequest) -> WalletResult<SignedTransaction> {
        self.handle()?.sign_request(request)
    }

    /// Discard the key
    pub fn lock(&mut self) {
        if self.handle.take().is_some() {
            debug!("wallet session locked");
        }
    }
}

impl From<SeedHandle> for WalletSession {
    fn from(handle: SeedHandle) -> Self {
        Self {
            handle: Some(handle),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use ethvault_crypto::keystore::fixtures::KeystoreFixture;
    use ethvault_tx::Quantity;

    const PASSWORD: &str = "hunter2";

    fn keystore(secret: &[u8]) -> Vec<u8> {
        KeystoreFixture::new()
            .secret(secret)
            .password(PASSWORD)
            .pbkdf2(8)
            .build_json()
            .unwrap()
            .into_bytes()
    }

    fn password(value: &str) -> SecretString {
        SecretString::from(value.to_string())
    }

    fn fields() -> TransactionFields {
        TransactionFields {
            nonce: Quantity::from(9),
            gas_price: Quantity::from("20000000000"),
            gas_limit: Quantity::from("21000"),
            to: Some("0x3535353535353535353535353535353535353535".to_string()),
            value: Quantity::from("1000000000000000000"),
            data: None,
            chain_id: Some(Quantity::from(1)),
        }
    }

    #[test]
    fn test_unlock_and_sign_eip155_vector() {
        let handle = unlock_wallet(&keystore(&[0x46; 32]), &password(PASSWORD)).unwrap();
        let raw = sign_transaction(&handle, &fields()).unwrap();

        assert_eq!(
            alloy_primitives::hex::encode(&raw),
            "f86c098504a817c800825208943535353535353535353535353535353535353535880de0b6b3a76400008025a028ef61340bd939bc2195fe537567866003e1a15d3c71ff63e1590620aa636276a067cbe9d8997f761aecb703304b3800ccf555c9f3dc64214b297fb1966a3b6d83"
        );
    }

    #[test]
    fn test_wrong_password_kind() {
        let err = unlock_wallet(&keystore(&[0x46; 32]), &password("hunter3")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AuthenticationFailed);
    }

    #[test]
    fn test_invalid_field_kind() {
        let handle = unlock_wallet(&keystore(&[0x46; 32]), &password(PASSWORD)).unwrap();
        let mut bad = fields();
        bad.nonce = Quantity::from("not a number");

        let err = sign_transaction(&handle, &bad).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidTransactionField);
    }

    #[test]
    fn test_zero_seed_unlocks_but_cannot_sign() {
        let handle = unlock_wallet(&keystore(&[0u8; 32]), &password(PASSWORD)).unwrap();
        assert!(handle.address().is_none());

        let err = sign_transaction(&handle, &fields()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SigningFailed);
    }

    #[test]
    fn test_session_lock() {
        let mut session =
            WalletSession::unlock(&keystore(&[0x46; 32]), &password(PASSWORD)).unwrap();
        assert!(session.is_unlocked());
        assert!(session.address().unwrap().is_some());
        assert!(session.sign(&fields()).is_ok());

        session.lock();
        assert!(!session.is_unlocked());
        assert_eq!(session.sign(&fields()).unwrap_err().kind(), ErrorKind::Locked);
        assert_eq!(session.address().unwrap_err().kind(), ErrorKind::Locked);
    }

    #[test]
    fn test_mismatched_declared_address_still_unlocks() {
        let json = KeystoreFixture::new()
            .secret(&[0x46; 32])
            .password(PASSWORD)
            .pbkdf2(8)
            .address("0000000000000000000000000000000000000001")
            .build_json()
            .unwrap();

        let handle = unlock_wallet(json.as_bytes(), &password(PASSWORD)).unwrap();
        assert_ne!(handle.address(), Some(Address::with_last_byte(1)));
    }

    #[test]
    fn test_policy_rejects_costly_document() {
        let policy = UnlockPolicy {
            max_pbkdf2_c: 4,
            ..UnlockPolicy::default()
        };
        let err = WalletSession::unlock_with_policy(
            &keystore(&[0x46; 32]),
            &password(PASSWORD),
            &policy,
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
    }

    #[test]
    fn test_concurrent_signing_shares_seed() {
        let handle = unlock_wallet(&keystore(&[0x46; 32]), &password(PASSWORD)).unwrap();
        let expected = sign_transaction(&handle, &fields()).unwrap();

        std::thread::scope(|scope| {
            let workers: Vec<_> = (0..4)
                .map(|_| {
                    let handle = handle.clone();
                    scope.spawn(move || sign_transaction(&handle, &fields()).unwrap())
                })
                .collect();

            for worker in workers {
                assert_eq!(worker.join().unwrap(), expected);
            }
        });
    }

    #[test]
    fn test_handle_debug_redacted() {
        let handle = unlock_wallet(&keystore(&[0x46; 32]), &password(PASSWORD)).unwrap();
        let debug = format!("{:?}", handle);
        assert!(debug.contains("REDACTED"));
        assert!(!debug.contains("4646464646"));
    }

    #[test]
    fn test_session_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<WalletSession>();
        assert_send_sync::<SeedHandle>();
    }
}
