//! Exit codes from classified errors

use crate::prompt::PromptError;
use keyshard_core::{
    AccountError, AddressError, EntropyError, ErrorClass, KeyError, MnemonicError, RecordError,
};
use keyshard_shamir::{BackupError, ShamirError, StoreError};
use std::process::ExitCode;
use thiserror::Error;

/// Failures detected by the CLI itself.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Configuration error: {0:#}")]
    Config(anyhow::Error),
    #[error("{0}")]
    Reconstruction(String),
}

impl CliError {
    /// A configuration failure caused by a library error keeps that
    /// error's class, e.g. a bad derivation path is an input error.
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Config(inner) => inner
                .chain()
                .find_map(library_class)
                .unwrap_or(ErrorClass::Config),
            Self::Reconstruction(_) => ErrorClass::Reconstruction,
        }
    }
}

/// Class of the outermost classified error in the chain.
pub fn classify(err: &anyhow::Error) -> ErrorClass {
    err.chain()
        .find_map(|cause| match cause.downcast_ref::<CliError>() {
            Some(e) => Some(e.class()),
            None => library_class(cause),
        })
        .unwrap_or(ErrorClass::Fatal)
}

fn library_class(cause: &(dyn std::error::Error + 'static)) -> Option<ErrorClass> {
    let class = if let Some(e) = cause.downcast_ref::<PromptError>() {
        e.class()
    } else if let Some(e) = cause.downcast_ref::<AccountError>() {
        e.class()
    } else if let Some(e) = cause.downcast_ref::<BackupError>() {
        e.class()
    } else if let Some(e) = cause.downcast_ref::<StoreError>() {
        e.class()
    } else if let Some(e) = cause.downcast_ref::<ShamirError>() {
        e.class()
    } else if let Some(e) = cause.downcast_ref::<RecordError>() {
        e.class()
    } else if let Some(e) = cause.downcast_ref::<EntropyError>() {
        e.class()
    } else if let Some(e) = cause.downcast_ref::<MnemonicError>() {
        e.class()
    } else if let Some(e) = cause.downcast_ref::<KeyError>() {
        e.class()
    } else if let Some(e) = cause.downcast_ref::<AddressError>() {
        e.class()
    } else {
        return None;
    };
    Some(class)
}

pub fn exit_code(class: ErrorClass) -> u8 {
    match class {
        ErrorClass::Fatal => 1,
        ErrorClass::Input => 2,
        ErrorClass::Config => 3,
        ErrorClass::Reconstruction => 4,
    }
}

pub fn exit_status(err: &anyhow::Error) -> ExitCode {
    ExitCode::from(exit_code(classify(err)))
}
