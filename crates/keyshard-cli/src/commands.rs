//! `generate` and `reconstruct`

use crate::config::Config;
use crate::error::CliError;
use crate::prompt::Prompter;
use anyhow::{Context, Result};
use keyshard_core::{generate_account, Mnemonic};
use keyshard_shamir::{recover_record, split_record, ShamirError, ShareStore, StoreError};
use rand::rngs::OsRng;
use rand::seq::SliceRandom;
use serde::Serialize;
use std::io::{BufRead, Write};
use zeroize::Zeroizing;

/// Generate an account, write its shares, print it.
pub fn generate<R: BufRead, W: Write>(
    config: &Config,
    prompter: &mut Prompter<R, W>,
    out: &mut impl Write,
    display: bool,
) -> Result<()> {
    let params = config.account_params().map_err(CliError::Config)?;
    let scheme = config.scheme().map_err(CliError::Config)?;

    // fail before asking for secrets
    let store = ShareStore::new(&config.sharing.shares_dir);
    if !store.available()?.is_empty() {
        return Err(StoreError::ExistingShares {
            dir: store.dir().to_path_buf(),
        }
        .into());
    }

    let entropy = prompter.user_entropy()?;
    let passphrase = prompter.passphrase()?;

    let account = generate_account(&params, &entropy, &passphrase)
        .context("Account generation failed")?;
    drop(entropy);
    drop(passphrase);

    let set = split_record(&account.sensitive_record(), &scheme)
        .context("Splitting the account secret failed")?;
    store.write_set(&set)?;

    log::info!(
        "Account {} backed up as {}-of-{} shares in {}",
        account.address(),
        scheme.threshold,
        scheme.total_shares,
        store.dir().display()
    );

    if display {
        print_json(out, &account.display())?;
    } else {
        writeln!(out, "{}", account.address())?;
    }
    Ok(())
}

/// Rebuild the secret record from `threshold` shares on disk.
///
/// `use_shares` picks the share indices; otherwise a random subset of
/// the available shares is used.
pub fn reconstruct(config: &Config, use_shares: Option<&[u8]>, out: &mut impl Write) -> Result<()> {
    let threshold = config.scheme().map_err(CliError::Config)?.threshold;
    let store = ShareStore::new(&config.sharing.shares_dir);

    let mut indices = match use_shares {
        Some(indices) => indices.to_vec(),
        None => {
            let available = store.available()?;
            if available.len() < threshold as usize {
                return Err(ShamirError::InsufficientShares {
                    have: available.len(),
                    need: threshold,
                })
                .with_context(|| format!("Not enough shares in {}", store.dir().display()));
            }
            available
                .choose_multiple(&mut OsRng, threshold as usize)
                .copied()
                .collect()
        }
    };
    indices.sort_unstable();
    log::info!("Shares used to reconstruct: {:?}", indices);

    let shares = store.read_many(&indices)?;
    let record = recover_record(&shares, threshold).context("Reconstruction failed")?;

    Mnemonic::parse(record.mnemonic()).map_err(|e| {
        CliError::Reconstruction(format!("Recovered mnemonic is invalid: {}", e))
    })?;
    record
        .private_key_bytes()
        .context("Recovered private key is invalid")?;

    print_json(out, &record)
}

fn print_json<T: Serialize>(out: &mut impl Write, value: &T) -> Result<()> {
    let json = Zeroizing::new(serde_json::to_string_pretty(value)?);
    writeln!(out, "{}", json.as_str())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{classify, exit_code};
    use keyshard_core::ErrorClass;
    use std::io::Cursor;
    use tempfile::TempDir;

    const INPUT: &str = "a long enough string of random user entropy\nhunter2\n";

    fn config(dir: &TempDir) -> Config {
        let mut config = Config::default();
        config.generation.word_count = 12;
        config.sharing.shares_dir = dir.path().join("shares");
        config
    }

    fn run_generate(config: &Config, input: &str) -> Result<String> {
        let mut prompter = Prompter::new(Cursor::new(input.as_bytes().to_vec()), Vec::new());
        let mut out = Vec::new();
        generate(config, &mut prompter, &mut out, true)?;
        Ok(String::from_utf8(out)?)
    }

    fn run_reconstruct(config: &Config, use_shares: Option<&[u8]>) -> Result<serde_json::Value> {
        let mut out = Vec::new();
        reconstruct(config, use_shares, &mut out)?;
        Ok(serde_json::from_slice(&out)?)
    }

    #[test]
    fn test_generate_then_reconstruct() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir);

        let shown: serde_json::Value =
            serde_json::from_str(&run_generate(&config, INPUT).unwrap()).unwrap();
        assert!(shown["address"].as_str().unwrap().starts_with("somm1"));
        assert_eq!(shown["mnemonic"].as_str().unwrap().split(' ').count(), 12);

        let store = ShareStore::new(&config.sharing.shares_dir);
        assert_eq!(store.available().unwrap(), vec![1, 2, 3, 4, 5]);

        for subset in [[1u8, 3, 5], [2, 4, 5]] {
            let recovered = run_reconstruct(&config, Some(&subset)).unwrap();
            assert_eq!(recovered["mnemonic"], shown["mnemonic"]);
            assert_eq!(recovered["privateKey"], shown["privateKey"]);
        }

        let random = run_reconstruct(&config, None).unwrap();
        assert_eq!(random["privateKey"], shown["privateKey"]);
    }

    #[test]
    fn test_no_display_prints_address_only() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir);
        let mut prompter = Prompter::new(Cursor::new(INPUT.as_bytes().to_vec()), Vec::new());
        let mut out = Vec::new();
        generate(&config, &mut prompter, &mut out, false).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.trim().starts_with("somm1"));
        assert!(!text.contains("mnemonic"));
    }

    #[test]
    fn test_short_entropy_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir);

        let err = run_generate(&config, "short\n\n").unwrap_err();
        assert_eq!(exit_code(classify(&err)), 2);
        assert!(ShareStore::new(&config.sharing.shares_dir)
            .available()
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_existing_shares_block_generation() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir);
        run_generate(&config, INPUT).unwrap();

        let err = run_generate(&config, INPUT).unwrap_err();
        assert_eq!(classify(&err), ErrorClass::Config);
    }

    #[test]
    fn test_too_few_shares_on_disk() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir);
        run_generate(&config, INPUT).unwrap();

        let store = ShareStore::new(&config.sharing.shares_dir);
        for index in [1, 2, 3] {
            std::fs::remove_file(store.share_path(index)).unwrap();
        }
        let err = run_reconstruct(&config, None).unwrap_err();
        assert_eq!(exit_code(classify(&err)), 4);
    }

    #[test]
    fn test_explicit_subset_below_threshold() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir);
        run_generate(&config, INPUT).unwrap();

        let err = run_reconstruct(&config, Some(&[1, 2])).unwrap_err();
        assert_eq!(classify(&err), ErrorClass::Reconstruction);
    }

    #[test]
    fn test_corrupted_share_is_reported() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir);
        run_generate(&config, INPUT).unwrap();

        let store = ShareStore::new(&config.sharing.shares_dir);
        let path = store.share_path(2);
        let mut bytes = std::fs::read(&path).unwrap();
        for b in &mut bytes[1..] {
            *b ^= 0x5A;
        }
        std::fs::write(&path, bytes).unwrap();

        let err = run_reconstruct(&config, Some(&[1, 2, 3])).unwrap_err();
        assert_eq!(classify(&err), ErrorClass::Reconstruction);
    }
}
