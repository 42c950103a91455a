//! ethvault CLI

use anyhow::Result;
use clap::{Parser, Subcommand};
use ethvault_cli::commands::{
    cmd_address, cmd_config_init, cmd_config_show, cmd_decode, cmd_inspect, cmd_sign,
    cmd_version,
};
use ethvault_cli::{exit_code, ClientConfig, OutputFormat, DEFAULT_HOME_DIR, ETHVAULT_HOME_ENV};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Ethereum keystore unlock and transaction signing
#[derive(Parser)]
#[command(name = "ethvault")]
#[command(version)]
#[command(about = "Unlock Ethereum V3 keystores and sign transactions", long_about = None)]
#[command(propagate_version = true)]
#[command(arg_required_else_help = true)]
struct Cli {
    /// Directory for client configuration
    #[arg(long, global = true, default_value_os_t = default_home_dir())]
    home: PathBuf,

    /// Output format (text|json), overrides client.toml
    #[arg(long, global = true, value_enum)]
    output: Option<OutputFormat>,

    /// The logging level (trace|debug|info|warn|error)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// The logging format (json|plain)
    #[arg(long, global = true, default_value = "plain")]
    log_format: String,

    /// Disable colored logs
    #[arg(long, global = true, default_value = "false")]
    log_no_color: bool,

    /// Print out the full error chain on failure
    #[arg(long, global = true, default_value = "false")]
    trace: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Unlock a keystore and print its address
    Address {
        /// Keystore file (overrides client.toml)
        #[arg(long)]
        keystore: Option<PathBuf>,

        /// Read the password from this file instead of prompting
        #[arg(long)]
        password_file: Option<PathBuf>,
    },

    /// Sign a transaction described by a JSON file
    Sign {
        /// Transaction JSON (nonce, gasPrice, gasLimit, to, value, data, chainId)
        #[arg(long)]
        tx: PathBuf,

        /// EIP-155 chain id (overrides the file and client.toml)
        #[arg(long)]
        chain_id: Option<u64>,

        /// Keystore file (overrides client.toml)
        #[arg(long)]
        keystore: Option<PathBuf>,

        /// Read the password from this file instead of prompting
        #[arg(long)]
        password_file: Option<PathBuf>,
    },

    /// Show keystore metadata without unlocking
    Inspect {
        /// Keystore file (overrides client.toml)
        #[arg(long)]
        keystore: Option<PathBuf>,
    },

    /// Decode a raw signed transaction and recover its sender
    Decode {
        /// Raw transaction hex, with or without 0x
        #[arg(long)]
        raw: String,
    },

    /// Utilities for managing client configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Print the application binary version information
    Version,
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Write a default client.toml
    Init {
        /// Overwrite existing configuration
        #[arg(long, default_value = "false")]
        overwrite: bool,
    },
}

fn default_home_dir() -> PathBuf {
    if let Ok(home) = std::env::var(ETHVAULT_HOME_ENV) {
        return PathBuf::from(home);
    }

    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_HOME_DIR)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(&cli.log_level, &cli.log_format, cli.log_no_color);

    let result = run(&cli).await;

    if let Err(e) = &result {
        if cli.trace {
            eprintln!("Error: {:?}", e);
        } else {
            eprintln!("Error: {:#}", e);
        }
        std::process::exit(exit_code(e));
    }

    Ok(())
}

async fn run(cli: &Cli) -> Result<()> {
    let config = ClientConfig::load(&cli.home)?;
    let output = cli.output.unwrap_or(config.output);

    match &cli.command {
        Commands::Address {
            keystore,
            password_file,
        } => {
            cmd_address(
                &cli.home,
                &config,
                output,
                keystore.clone(),
                password_file.clone(),
            )
            .await
        }

        Commands::Sign {
            tx,
            chain_id,
            keystore,
            password_file,
        } => {
            cmd_sign(
                &cli.home,
                &config,
                output,
                keystore.clone(),
                password_file.clone(),
                tx,
                *chain_id,
            )
            .await
        }

        Commands::Inspect { keystore } => cmd_inspect(&cli.home, &config, output, keystore.clone()),

        Commands::Decode { raw } => cmd_decode(output, raw),

        Commands::Config { command } => match command {
            ConfigCommands::Show => cmd_config_show(&cli.home, output),
            ConfigCommands::Init { overwrite } => cmd_config_init(&cli.home, *overwrite),
        },

        Commands::Version => cmd_version(output),
    }
}

fn init_tracing(log_level: &str, log_format: &str, no_color: bool) {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::WARN,
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string()));

    // stdout carries command output only
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(true)
        .with_ansi(!no_color);

    match log_format {
        "json" => subscriber.json().init(),
        _ => subscriber.init(),
    }
}
