//! CLI configuration: TOML file + environment variable overrides.
//!
//! Priority: command-line flags > environment variables > config file > defaults.

use anyhow::{Context, Result};
use keyshard_core::account::DEFAULT_WORD_COUNT;
use keyshard_core::entropy::entropy_len;
use keyshard_core::keys::DEFAULT_PATH;
use keyshard_core::{AccountParams, AddressConfig, DerivationPath};
use keyshard_shamir::SharingScheme;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub generation: GenerationSection,

    #[serde(default)]
    pub sharing: SharingSection,

    #[serde(default)]
    pub address: AddressSection,

    #[serde(default)]
    pub logging: LoggingSection,
}

/// Mnemonic and key derivation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationSection {
    /// Mnemonic length, a positive multiple of 3
    #[serde(default = "default_word_count")]
    pub word_count: usize,

    /// BIP-32 path of the account key
    #[serde(default = "default_derivation_path")]
    pub derivation_path: String,
}

impl Default for GenerationSection {
    fn default() -> Self {
        Self {
            word_count: default_word_count(),
            derivation_path: default_derivation_path(),
        }
    }
}

/// Shamir parameters and share location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharingSection {
    #[serde(default = "default_total_shares")]
    pub total_shares: u8,

    #[serde(default = "default_threshold")]
    pub threshold: u8,

    /// Directory holding `share_<i>` files
    #[serde(default = "default_shares_dir")]
    pub shares_dir: PathBuf,
}

impl Default for SharingSection {
    fn default() -> Self {
        Self {
            total_shares: default_total_shares(),
            threshold: default_threshold(),
            shares_dir: default_shares_dir(),
        }
    }
}

/// Bech32 human-readable prefixes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddressSection {
    #[serde(default = "default_account_prefix")]
    pub account_prefix: String,

    #[serde(default = "default_pubkey_prefix")]
    pub pubkey_prefix: String,
}

impl Default for AddressSection {
    fn default() -> Self {
        Self {
            account_prefix: default_account_prefix(),
            pubkey_prefix: default_pubkey_prefix(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSection {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

// ============================================================================
// Default value functions
// ============================================================================

fn default_word_count() -> usize {
    DEFAULT_WORD_COUNT
}

fn default_derivation_path() -> String {
    DEFAULT_PATH.to_string()
}

fn default_total_shares() -> u8 {
    5
}

fn default_threshold() -> u8 {
    3
}

fn default_shares_dir() -> PathBuf {
    PathBuf::from("shares")
}

fn default_account_prefix() -> String {
    "somm".to_string()
}

fn default_pubkey_prefix() -> String {
    "sommpub".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

// ============================================================================
// Loading & overrides
// ============================================================================

impl Config {
    /// Load configuration from a TOML file. A missing file yields the defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config =
            toml::from_str(&contents).with_context(|| "Failed to parse TOML config")?;
        Ok(config)
    }

    /// Apply environment variable overrides.
    ///
    /// Supported env vars:
    /// - `KEYSHARD_WORD_COUNT`
    /// - `KEYSHARD_DERIVATION_PATH`
    /// - `KEYSHARD_TOTAL_SHARES`
    /// - `KEYSHARD_THRESHOLD`
    /// - `KEYSHARD_SHARES_DIR`
    /// - `KEYSHARD_ACCOUNT_PREFIX`
    /// - `KEYSHARD_PUBKEY_PREFIX`
    /// - `KEYSHARD_LOG_LEVEL`
    ///
    /// A numeric variable that does not parse is an error.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(v) = var("KEYSHARD_WORD_COUNT") {
            self.generation.word_count = parse_number("KEYSHARD_WORD_COUNT", &v)?;
        }
        if let Some(v) = var("KEYSHARD_DERIVATION_PATH") {
            self.generation.derivation_path = v;
        }
        if let Some(v) = var("KEYSHARD_TOTAL_SHARES") {
            self.sharing.total_shares = parse_number("KEYSHARD_TOTAL_SHARES", &v)?;
        }
        if let Some(v) = var("KEYSHARD_THRESHOLD") {
            self.sharing.threshold = parse_number("KEYSHARD_THRESHOLD", &v)?;
        }
        if let Some(v) = var("KEYSHARD_SHARES_DIR") {
            self.sharing.shares_dir = PathBuf::from(v);
        }
        if let Some(v) = var("KEYSHARD_ACCOUNT_PREFIX") {
            self.address.account_prefix = v;
        }
        if let Some(v) = var("KEYSHARD_PUBKEY_PREFIX") {
            self.address.pubkey_prefix = v;
        }
        if let Some(v) = var("KEYSHARD_LOG_LEVEL") {
            self.logging.log_level = v;
        }
        Ok(())
    }

    pub fn account_params(&self) -> Result<AccountParams> {
        let path: DerivationPath = self
            .generation
            .derivation_path
            .parse()
            .context("generation.derivation_path is invalid")?;
        let address = AddressConfig::new(&self.address.account_prefix, &self.address.pubkey_prefix)
            .context("address prefixes are invalid")?;
        Ok(AccountParams {
            word_count: self.generation.word_count,
            path,
            address,
        })
    }

    pub fn scheme(&self) -> Result<SharingScheme> {
        SharingScheme::new(self.sharing.threshold, self.sharing.total_shares)
            .context("sharing parameters are invalid")
    }

    /// Validate that the configuration is usable.
    pub fn validate(&self) -> Result<()> {
        entropy_len(self.generation.word_count).context("generation.word_count is invalid")?;
        anyhow::ensure!(
            !self.sharing.shares_dir.as_os_str().is_empty(),
            "sharing.shares_dir must not be empty"
        );
        anyhow::ensure!(
            self.logging.log_level.parse::<log::LevelFilter>().is_ok(),
            "logging.log_level must be one of off, error, warn, info, debug, trace"
        );

        self.scheme()?;
        self.account_params()?;
        Ok(())
    }
}

fn parse_number<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("{} must be a number, got {:?}", key, value))
}

// ============================================================================
// Tests
// ============================================================================
