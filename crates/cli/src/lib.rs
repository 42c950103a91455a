//! ethvault command line
//!
//! Unlocks Web3 Secret Storage (V3) keystores and signs legacy Ethereum
//! transactions from the terminal. The binary lives in `main.rs`; the
//! command bodies are here so they can be tested without a process.

pub mod client_config;
pub mod commands;
pub mod password;

pub use client_config::{ClientConfig, OutputFormat, CLIENT_CONFIG_FILENAME};
pub use commands::{exit_code, EXIT_AUTH_FAILED, EXIT_FAILURE};

/// Environment variable overriding the home directory
pub const ETHVAULT_HOME_ENV: &str = "ETHVAULT_HOME";

/// Home directory name under the user's home
pub const DEFAULT_HOME_DIR: &str = ".ethvault";
