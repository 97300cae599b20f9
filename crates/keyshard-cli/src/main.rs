//! keyshard: offline account generator with Shamir share backup
//!
//! # Usage
//!
//! ```bash
//! keyshard generate --words 24 --shares 5 --threshold 3
//! keyshard reconstruct --use 1,3,5
//! ```
//!
//! Secrets are read from stdin, prompts go to stderr and the resulting
//! JSON to stdout.

mod commands;
mod config;
mod error;
mod prompt;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use config::Config;
use error::CliError;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "keyshard", version, about = "Offline account generator with Shamir share backup")]
struct Cli {
    /// Config file path
    #[arg(short, long, global = true, default_value = "keyshard.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate an account and split its secret into share files
    Generate {
        /// Mnemonic length (multiple of 3)
        #[arg(long)]
        words: Option<usize>,

        /// Number of shares to write
        #[arg(long)]
        shares: Option<u8>,

        #[command(flatten)]
        sharing: SharingArgs,

        /// Only print the address
        #[arg(long)]
        no_display: bool,
    },
    /// Rebuild the mnemonic and private key from share files
    Reconstruct {
        #[command(flatten)]
        sharing: SharingArgs,

        /// Share indices to use, e.g. 1,3,5 (default: a random subset)
        #[arg(long = "use", value_delimiter = ',')]
        use_shares: Option<Vec<u8>>,
    },
}

#[derive(Args, Debug)]
struct SharingArgs {
    /// Shares needed to reconstruct
    #[arg(long)]
    threshold: Option<u8>,

    /// Directory holding the share files
    #[arg(long)]
    shares_dir: Option<PathBuf>,
}

impl SharingArgs {
    fn apply(&self, config: &mut Config) {
        if let Some(t) = self.threshold {
            config.sharing.threshold = t;
        }
        if let Some(ref dir) = self.shares_dir {
            config.sharing.shares_dir = dir.clone();
        }
    }
}

fn main() -> ExitCode {
    // Keep secret material out of core files
    keyshard_core::memory::disable_core_dumps();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            error::exit_status(&e)
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli).map_err(CliError::Config)?;

    env_logger::Builder::new()
        .parse_filters(&config.logging.log_level)
        .init();
    log::debug!("Loaded configuration from {}", cli.config.display());

    match cli.command {
        Command::Generate { no_display, .. } => {
            let mut prompter = prompt::Prompter::stdio();
            commands::generate(&config, &mut prompter, &mut std::io::stdout(), !no_display)
        }
        Command::Reconstruct { ref use_shares, .. } => {
            commands::reconstruct(&config, use_shares.as_deref(), &mut std::io::stdout())
        }
    }
}

/// File, then env, then flags; validated.
fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::from_file(&cli.config)?;
    config.apply_env_overrides()?;

    match &cli.command {
        Command::Generate {
            words,
            shares,
            sharing,
            ..
        } => {
            if let Some(w) = words {
                config.generation.word_count = *w;
            }
            if let Some(n) = shares {
                config.sharing.total_shares = *n;
            }
            sharing.apply(&mut config);
        }
        Command::Reconstruct { sharing, .. } => sharing.apply(&mut config),
    }

    config.validate()?;
    Ok(config)
}
