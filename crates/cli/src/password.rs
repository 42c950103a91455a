//! Keystore password input

use anyhow::{Context, Result};
use ethvault_crypto::SecretString;
use std::fs;
use std::path::Path;
use zeroize::Zeroizing;

/// Read the password from a file or prompt interactively
pub fn get_password(password_file: Option<&Path>, prompt: &str) -> Result<SecretString> {
    match password_file {
        Some(file) => read_password_from_file(file),
        None => prompt_password(prompt),
    }
}

/// Read a password from a file
///
/// Only the trailing line ending is stripped; other whitespace is part of
/// the password.
pub fn read_password_from_file(path: &Path) -> Result<SecretString> {
    let content = Zeroizing::new(
        fs::read_to_string(path)
            .with_context(|| format!("Failed to read password file: {}", path.display()))?,
    );

    let password = content
        .strip_suffix("\r\n")
        .or_else(|| content.strip_suffix('\n'))
        .unwrap_or(content.as_str());

    Ok(SecretString::from(password.to_string()))
}

/// Prompt for the password without echo
pub fn prompt_password(prompt: &str) -> Result<SecretString> {
    let password = rpassword::prompt_password(prompt).context("Failed to read password")?;
    Ok(SecretString::from(password))
}
