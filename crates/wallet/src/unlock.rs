//! Cancellable keystore unlock
//!
//! Key derivation is deliberately slow. The async unlock runs it on tokio's
//! blocking pool and races it against a [`CancellationToken`]. A cancelled
//! unlock returns [`WalletError::Cancelled`]; the KDF keeps running to
//! completion on its thread, and whatever it produces is dropped there.

use ethvault_crypto::keystore::UnlockPolicy;
use ethvault_crypto::SecretString;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{WalletError, WalletResult};
use crate::session::{unlock_document, SeedHandle};

/// Unlock a keystore off the async runtime, giving up when `token` fires
pub async fn unlock_wallet_cancellable(
    file_bytes: Vec<u8>,
    password: SecretString,
    policy: UnlockPolicy,
    token: CancellationToken,
) -> WalletResult<SeedHandle> {
    if token.is_cancelled() {
        return Err(WalletError::Cancelled);
    }

    let task =
        tokio::task::spawn_blocking(move || unlock_document(&file_bytes, &password, &policy));

    tokio::select! {
        biased;

        _ = token.cancelled() => {
            debug!("keystore unlock cancelled");
            Err(WalletError::Cancelled)
        }

        joined = task => match joined {
            Ok(result) => result,
            Err(err) => Err(WalletError::Internal(err.to_string())),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use ethvault_crypto::keystore::fixtures::KeystoreFixture;

    fn keystore(iterations: u32) -> Vec<u8> {
        KeystoreFixture::new()
            .secret(&[0x46; 32])
            .password("pw")
            .pbkdf2(iterations)
            .build_json()
            .unwrap()
            .into_bytes()
    }

    fn password() -> SecretString {
        SecretString::from("pw".to_string())
    }

    #[tokio::test]
    async fn test_async_unlock_completes() {
        let handle = unlock_wallet_cancellable(
            keystore(8),
            password(),
            UnlockPolicy::default(),
            CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(
            handle.address().unwrap(),
            "0x9d8A62f656a8d1615C1294fd71e9CFb3E4855A4F"
                .parse::<alloy_primitives::Address>()
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_async_unlock_wrong_password() {
        let err = unlock_wallet_cancellable(
            keystore(8),
            SecretString::from("nope".to_string()),
            UnlockPolicy::default(),
            CancellationToken::new(),
        )
        .await
        .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::AuthenticationFailed);
    }

    #[tokio::test]
    async fn test_already_cancelled_token() {
        let token = CancellationToken::new();
        token.cancel();

        let err = unlock_wallet_cancellable(keystore(8), password(), UnlockPolicy::default(), token)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Cancelled);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_cancel_during_derivation() {
        let document = keystore(100_000);
        let token = CancellationToken::new();

        let unlock = tokio::spawn(unlock_wallet_cancellable(
            document,
            password(),
            UnlockPolicy::default(),
            token.clone(),
        ));
        tokio::task::yield_now().await;
        token.cancel();

        let err = unlock.await.unwrap().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Cancelled);
    }
}
