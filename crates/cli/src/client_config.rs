//! Client configuration
//!
//! Defaults for CLI commands, stored at `{home}/config/client.toml`.
//! A missing file means defaults.
//!
//! # Example client.toml
//!
//! ```toml
//! # Default EIP-155 chain id for `sign`
//! chain-id = 1
//!
//! # Default keystore for `address` and `sign`
//! keystore = "/home/user/.ethvault/keystore/UTC--2016-05-30--008aeeda.json"
//!
//! # CLI output format (text|json)
//! output = "text"
//!
//! # Refuse keystores whose KDF cost exceeds these before deriving anything
//! max-scrypt-n = 1048576
//! max-scrypt-memory = 1073741824
//! max-scrypt-work = 16777216
//! max-pbkdf2-c = 10000000
//! ```

use anyhow::{Context, Result};
use clap::ValueEnum;
use ethvault_crypto::keystore::{
    UnlockPolicy, DEFAULT_MAX_PBKDF2_C, DEFAULT_MAX_SCRYPT_MEMORY, DEFAULT_MAX_SCRYPT_N,
    DEFAULT_MAX_SCRYPT_WORK,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default client configuration filename.
pub const CLIENT_CONFIG_FILENAME: &str = "client.toml";

/// CLI output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Client configuration for CLI commands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ClientConfig {
    /// Default chain id for EIP-155 signing.
    ///
    /// Used when neither `--chain-id` nor the transaction file sets one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<u64>,

    /// Default keystore path. Empty means `--keystore` is required.
    #[serde(default)]
    pub keystore: String,

    /// CLI output format (text|json).
    #[serde(default)]
    pub output: OutputFormat,

    /// Largest scrypt `n` accepted.
    #[serde(default = "default_max_scrypt_n")]
    pub max_scrypt_n: u64,

    /// Largest scrypt working memory (`128 * r * n` bytes) accepted.
    #[serde(default = "default_max_scrypt_memory")]
    pub max_scrypt_memory: u64,

    /// Largest scrypt `p * r * n` accepted.
    #[serde(default = "default_max_scrypt_work")]
    pub max_scrypt_work: u64,

    /// Largest PBKDF2 iteration count accepted.
    #[serde(default = "default_max_pbkdf2_c")]
    pub max_pbkdf2_c: u32,
}

fn default_max_scrypt_n() -> u64 {
    DEFAULT_MAX_SCRYPT_N
}

fn default_max_scrypt_memory() -> u64 {
    DEFAULT_MAX_SCRYPT_MEMORY
}

fn default_max_scrypt_work() -> u64 {
    DEFAULT_MAX_SCRYPT_WORK
}

fn default_max_pbkdf2_c() -> u32 {
    DEFAULT_MAX_PBKDF2_C
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            chain_id: None,
            keystore: String::new(),
            output: OutputFormat::default(),
            max_scrypt_n: default_max_scrypt_n(),
            max_scrypt_memory: default_max_scrypt_memory(),
            max_scrypt_work: default_max_scrypt_work(),
            max_pbkdf2_c: default_max_pbkdf2_c(),
        }
    }
}

impl ClientConfig {
    /// Get the path to the client config file.
    pub fn config_path(home: &Path) -> PathBuf {
        home.join("config").join(CLIENT_CONFIG_FILENAME)
    }

    /// Load client configuration from file.
    ///
    /// If the file doesn't exist, returns default configuration.
    pub fn load(home: &Path) -> Result<Self> {
        let config_path = Self::config_path(home);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read client config: {}", config_path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse client config: {}", config_path.display()))
    }

    /// Save client configuration to file.
    pub fn save(&self, home: &Path) -> Result<()> {
        let config_path = Self::config_path(home);

        // Ensure config directory exists
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize client config")?;

        std::fs::write(&config_path, content)
            .with_context(|| format!("Failed to write client config: {}", config_path.display()))?;

        Ok(())
    }

    /// Resolve the keystore path.
    ///
    /// Returns in order of precedence:
    /// 1. The explicit path (from `--keystore`)
    /// 2. `keystore` from config (if non-empty)
    pub fn effective_keystore(&self, explicit: Option<&Path>) -> Option<PathBuf> {
        match explicit {
            Some(path) => Some(path.to_path_buf()),
            None if self.keystore.is_empty() => None,
            None => Some(PathBuf::from(&self.keystore)),
        }
    }

    /// KDF cost ceilings for unlocking.
    pub fn unlock_policy(&self) -> UnlockPolicy {
        UnlockPolicy {
            max_scrypt_n: self.max_scrypt_n,
            max_scrypt_memory: self.max_scrypt_memory,
            max_scrypt_work: self.max_scrypt_work,
            max_pbkdf2_c: self.max_pbkdf2_c,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.chain_id, None);
        assert_eq!(config.output, OutputFormat::Text);
        assert_eq!(config.unlock_policy(), UnlockPolicy::default());
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = tempdir().unwrap();
        let home = temp_dir.path();

        let config = ClientConfig {
            chain_id: Some(5),
            keystore: "/keys/main.json".to_string(),
            output: OutputFormat::Json,
            max_scrypt_n: 1 << 18,
            max_scrypt_memory: 1 << 28,
            max_scrypt_work: 1 << 20,
            max_pbkdf2_c: 1_000_000,
        };

        config.save(home).unwrap();

        let loaded = ClientConfig::load(home).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_file_returns_default() {
        let temp_dir = tempdir().unwrap();

        let config = ClientConfig::load(temp_dir.path()).unwrap();
        assert_eq!(config, ClientConfig::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let temp_dir = tempdir().unwrap();
        let path = ClientConfig::config_path(temp_dir.path());
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "chain-id = 1337\noutput = \"json\"\n").unwrap();

        let config = ClientConfig::load(temp_dir.path()).unwrap();
        assert_eq!(config.chain_id, Some(1337));
        assert_eq!(config.output, OutputFormat::Json);
        assert_eq!(config.max_scrypt_n, DEFAULT_MAX_SCRYPT_N);
        assert_eq!(config.max_scrypt_memory, DEFAULT_MAX_SCRYPT_MEMORY);
        assert_eq!(config.max_scrypt_work, DEFAULT_MAX_SCRYPT_WORK);
    }

    #[test]
    fn test_invalid_file_is_error() {
        let temp_dir = tempdir().unwrap();
        let path = ClientConfig::config_path(temp_dir.path());
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "output = \"yaml\"\n").unwrap();

        assert!(ClientConfig::load(temp_dir.path()).is_err());
    }

    #[test]
    fn test_effective_keystore() {
        let config = ClientConfig::default();
        assert_eq!(config.effective_keystore(None), None);
        assert_eq!(
            config.effective_keystore(Some(Path::new("/a.json"))),
            Some(PathBuf::from("/a.json"))
        );

        let config = ClientConfig {
            keystore: "/b.json".to_string(),
            ..Default::default()
        };
        assert_eq!(config.effective_keystore(None), Some(PathBuf::from("/b.json")));
        assert_eq!(
            config.effective_keystore(Some(Path::new("/a.json"))),
            Some(PathBuf::from("/a.json"))
        );
    }

    #[test]
    fn test_toml_format() {
        let config = ClientConfig {
            chain_id: Some(1),
            ..Default::default()
        };
        let toml_str = toml::to_string_pretty(&config).unwrap();

        // Verify kebab-case keys
        assert!(toml_str.contains("chain-id"));
        assert!(toml_str.contains("max-scrypt-n"));
        assert!(toml_str.contains("max-scrypt-memory"));
        assert!(toml_str.contains("max-scrypt-work"));
        assert!(toml_str.contains("max-pbkdf2-c"));
        assert!(toml_str.contains("output = \"text\""));
    }

    #[test]
    fn test_unlock_policy_carries_scrypt_ceilings() {
        let temp_dir = tempdir().unwrap();
        let path = ClientConfig::config_path(temp_dir.path());
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "max-scrypt-memory = 1048576
max-scrypt-work = 4096
").unwrap();

        let policy = ClientConfig::load(temp_dir.path()).unwrap().unlock_policy();
        assert_eq!(policy.max_scrypt_memory, 1 << 20);
        assert_eq!(policy.max_scrypt_work, 4096);
        assert_eq!(policy.max_scrypt_n, DEFAULT_MAX_SCRYPT_N);
    }
}
