//! Command implementations

use std::fs;
use std::path::{Path, PathBuf};

use alloy_primitives::U256;
use anyhow::{anyhow, bail, Context, Result};
use ethvault_crypto::keystore::{KeystoreDocument, UnlockPolicy};
use ethvault_tx::{Quantity, SignedTransaction, TransactionFields};
use ethvault_wallet::{unlock_wallet_cancellable, ErrorKind, SeedHandle, WalletError};
use serde::Serialize;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::client_config::{ClientConfig, OutputFormat};
use crate::password::get_password;

/// Exit code for any failure other than a wrong password
pub const EXIT_FAILURE: i32 = 1;

/// Exit code for a wrong password, so scripts can re-prompt
pub const EXIT_AUTH_FAILED: i32 = 2;

/// Map an error to the process exit code
pub fn exit_code(err: &anyhow::Error) -> i32 {
    let auth_failed = err.chain().any(|cause| {
        cause
            .downcast_ref::<WalletError>()
            .is_some_and(|e| e.kind() == ErrorKind::AuthenticationFailed)
    });

    if auth_failed {
        EXIT_AUTH_FAILED
    } else {
        EXIT_FAILURE
    }
}

fn resolve_keystore(config: &ClientConfig, home: &Path, explicit: Option<&Path>) -> Result<PathBuf> {
    config.effective_keystore(explicit).ok_or_else(|| {
        anyhow!(
            "No keystore given. Pass --keystore or set `keystore` in {}",
            ClientConfig::config_path(home).display()
        )
    })
}

/// Read, check and unlock a keystore, cancelling on Ctrl-C
async fn unlock_keystore(
    path: &Path,
    password_file: Option<&Path>,
    policy: UnlockPolicy,
) -> Result<SeedHandle> {
    let file_bytes =
        fs::read(path).with_context(|| format!("Failed to read keystore: {}", path.display()))?;

    // Reject malformed documents before asking for a password
    KeystoreDocument::from_slice(&file_bytes)
        .map_err(WalletError::from)
        .with_context(|| format!("Invalid keystore: {}", path.display()))?;

    let password = get_password(password_file, "Keystore password: ")?;

    let token = CancellationToken::new();
    let interrupt = {
        let token = token.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, cancelling unlock");
                token.cancel();
            }
        })
    };

    let result = unlock_wallet_cancellable(file_bytes, password, policy, token).await;
    interrupt.abort();

    Ok(result?)
}

fn word_hex(value: U256) -> String {
    format!("0x{}", hex::encode(value.to_be_bytes::<32>()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// `ethvault address`
pub async fn cmd_address(
    home: &Path,
    config: &ClientConfig,
    output: OutputFormat,
    keystore: Option<PathBuf>,
    password_file: Option<PathBuf>,
) -> Result<()> {
    let path = resolve_keystore(config, home, keystore.as_deref())?;
    let handle = unlock_keystore(&path, password_file.as_deref(), config.unlock_policy()).await?;

    let address = handle
        .address()
        .ok_or_else(|| anyhow!("Keystore does not hold a valid secp256k1 key"))?;

    match output {
        OutputFormat::Json => print_json(&json!({ "address": address }))?,
        OutputFormat::Text => println!("{}", address),
    }

    Ok(())
}

/// `ethvault sign`
#[allow(clippy::too_many_arguments)]
pub async fn cmd_sign(
    home: &Path,
    config: &ClientConfig,
    output: OutputFormat,
    keystore: Option<PathBuf>,
    password_file: Option<PathBuf>,
    tx: &Path,
    chain_id: Option<u64>,
) -> Result<()> {
    let content = fs::read_to_string(tx)
        .with_context(|| format!("Failed to read transaction file: {}", tx.display()))?;
    let mut fields: TransactionFields = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse transaction file: {}", tx.display()))?;

    // --chain-id wins over the file, the file wins over client.toml
    if let Some(chain_id) = chain_id {
        fields.chain_id = Some(Quantity::from(chain_id));
    } else if fields.chain_id.is_none() {
        fields.chain_id = config.chain_id.map(Quantity::from);
    }

    let path = resolve_keystore(config, home, keystore.as_deref())?;
    let handle = unlock_keystore(&path, password_file.as_deref(), config.unlock_policy()).await?;

    let signed = handle.sign(&fields)?;
    info!(hash = %signed.hash(), chain_id = ?signed.chain_id(), "Transaction signed");

    match output {
        OutputFormat::Json => {
            let signature = signed.signature();
            print_json(&json!({
                "raw": signed.raw(),
                "hash": signed.hash(),
                "from": handle.address(),
                "chainId": signed.chain_id(),
                "v": signature.v,
                "r": word_hex(signature.r),
                "s": word_hex(signature.s),
            }))?;
        }
        OutputFormat::Text => println!("{}", signed.raw()),
    }

    Ok(())
}

/// `ethvault inspect`
pub fn cmd_inspect(
    home: &Path,
    config: &ClientConfig,
    output: OutputFormat,
    keystore: Option<PathBuf>,
) -> Result<()> {
    let path = resolve_keystore(config, home, keystore.as_deref())?;
    let document = KeystoreDocument::load(&path)
        .map_err(WalletError::from)
        .with_context(|| format!("Invalid keystore: {}", path.display()))?;
    let summary = document.summary();

    match output {
        OutputFormat::Json => print_json(&summary)?,
        OutputFormat::Text => {
            println!("Keystore:   {}", path.display());
            println!("Version:    {}", summary.version);
            println!("ID:         {}", summary.id.as_deref().unwrap_or("-"));
            println!("Address:    {}", summary.address.as_deref().unwrap_or("-"));
            println!("KDF:        {} ({})", summary.kdf, summary.kdf_cost);
            println!("Cipher:     {}", summary.cipher);
            println!("Ciphertext: {} bytes", summary.ciphertext_len);
        }
    }

    Ok(())
}

/// `ethvault decode`
pub fn cmd_decode(output: OutputFormat, raw: &str) -> Result<()> {
    let bytes = ethvault_crypto::keystore::decode_hex(raw).context("Raw transaction is not hex")?;
    let signed = SignedTransaction::decode(&bytes).map_err(WalletError::from)?;
    let from = signed.recover_signer().map_err(WalletError::from)?;

    let request = signed.request();
    let signature = signed.signature();

    match output {
        OutputFormat::Json => print_json(&json!({
            "hash": signed.hash(),
            "from": from,
            "to": request.to,
            "nonce": request.nonce,
            "gasPrice": request.gas_price.to_string(),
            "gasLimit": request.gas_limit,
            "value": request.value.to_string(),
            "data": request.data,
            "chainId": request.chain_id,
            "v": signature.v,
            "r": word_hex(signature.r),
            "s": word_hex(signature.s),
        }))?,
        OutputFormat::Text => {
            println!("Hash:      {}", signed.hash());
            println!("From:      {}", from);
            match request.to {
                Some(to) => println!("To:        {}", to),
                None => println!("To:        (contract creation)"),
            }
            println!("Nonce:     {}", request.nonce);
            println!("Gas price: {}", request.gas_price);
            println!("Gas limit: {}", request.gas_limit);
            println!("Value:     {}", request.value);
            println!("Data:      {}", request.data);
            match request.chain_id {
                Some(chain_id) => println!("Chain ID:  {}", chain_id),
                None => println!("Chain ID:  (none, pre-EIP-155)"),
            }
            println!("V:         {}", signature.v);
            println!("R:         {}", word_hex(signature.r));
            println!("S:         {}", word_hex(signature.s));
        }
    }

    Ok(())
}

/// `ethvault config show`
pub fn cmd_config_show(home: &Path, output: OutputFormat) -> Result<()> {
    let config = ClientConfig::load(home)?;

    match output {
        OutputFormat::Json => print_json(&config)?,
        OutputFormat::Text => {
            println!("# {}", ClientConfig::config_path(home).display());
            print!("{}", toml::to_string_pretty(&config)?);
        }
    }

    Ok(())
}

/// `ethvault config init`
pub fn cmd_config_init(home: &Path, overwrite: bool) -> Result<()> {
    let path = ClientConfig::config_path(home);
    if path.exists() && !overwrite {
        bail!(
            "Configuration already exists at {}. Use --overwrite to replace.",
            path.display()
        );
    }

    ClientConfig::default().save(home)?;
    println!("Wrote {}", path.display());

    Ok(())
}

#[derive(Serialize)]
struct VersionInfo {
    name: String,
    version: String,
    git_commit: String,
    rust_version: String,
}

impl VersionInfo {
    fn new() -> Self {
        Self {
            name: "ethvault".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            git_commit: option_env!("GIT_COMMIT").unwrap_or("unknown").to_string(),
            rust_version: option_env!("CARGO_PKG_RUST_VERSION")
                .unwrap_or("unknown")
                .to_string(),
        }
    }
}

/// `ethvault version`
pub fn cmd_version(output: OutputFormat) -> Result<()> {
    let version_info = VersionInfo::new();

    match output {
        OutputFormat::Json => print_json(&version_info)?,
        OutputFormat::Text => {
            println!("{}: {}", version_info.name, version_info.version);
            println!("git commit: {}", version_info.git_commit);
            println!("rust version: {}", version_info.rust_version);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethvault_crypto::KeystoreError;

    #[test]
    fn test_exit_code_for_wrong_password() {
        let err = anyhow::Error::from(WalletError::from(KeystoreError::AuthenticationFailed));
        assert_eq!(exit_code(&err), EXIT_AUTH_FAILED);

        let wrapped = err.context("while signing");
        assert_eq!(exit_code(&wrapped), EXIT_AUTH_FAILED);
    }

    #[test]
    fn test_exit_code_for_other_errors() {
        let err = anyhow::Error::from(WalletError::from(KeystoreError::UnsupportedVersion(2)));
        assert_eq!(exit_code(&err), EXIT_FAILURE);
        assert_eq!(exit_code(&anyhow!("boom")), EXIT_FAILURE);
    }

    #[test]
    fn test_word_hex_is_padded() {
        assert_eq!(
            word_hex(U256::from(1u64)),
            "0x0000000000000000000000000000000000000000000000000000000000000001"
        );
    }

    #[test]
    fn test_resolve_keystore_requires_a_path() {
        let home = Path::new("/tmp/ethvault-home");
        let err = resolve_keystore(&ClientConfig::default(), home, None).unwrap_err();
        assert!(err.to_string().contains("--keystore"));
    }
}
