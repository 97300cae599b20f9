//! Interactive prompts for the secret inputs.
//!
//! Questions go to stderr so stdout carries only the JSON output.

use keyshard_core::entropy::MIN_USER_ENTROPY_CHARS;
use keyshard_core::ErrorClass;
use std::io::{self, BufRead, Write};
use thiserror::Error;
use zeroize::Zeroizing;

#[derive(Error, Debug)]
pub enum PromptError {
    #[error("Input closed before an answer was given")]
    Closed,
    #[error("Entropy must be at least {min} characters, got {chars}")]
    EntropyTooShort { chars: usize, min: usize },
    #[error("Terminal I/O failed: {0}")]
    Io(#[from] io::Error),
}

impl PromptError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Closed | Self::EntropyTooShort { .. } => ErrorClass::Input,
            Self::Io(_) => ErrorClass::Fatal,
        }
    }
}

pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl Prompter<io::StdinLock<'static>, io::Stderr> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stderr())
    }
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// One line, surrounding whitespace trimmed.
    fn ask(&mut self, question: &str) -> Result<Zeroizing<String>, PromptError> {
        write!(self.output, "{}: ", question)?;
        self.output.flush()?;

        let mut line = Zeroizing::new(String::new());
        if self.input.read_line(&mut line)? == 0 {
            return Err(PromptError::Closed);
        }
        Ok(Zeroizing::new(line.trim().to_string()))
    }

    pub fn user_entropy(&mut self) -> Result<Zeroizing<String>, PromptError> {
        let entropy = self.ask(&format!(
            "Please enter at least {} random characters",
            MIN_USER_ENTROPY_CHARS
        ))?;
        let chars = entropy.chars().count();
        if chars < MIN_USER_ENTROPY_CHARS {
            return Err(PromptError::EntropyTooShort {
                chars,
                min: MIN_USER_ENTROPY_CHARS,
            });
        }
        Ok(entropy)
    }

    /// May be empty.
    pub fn passphrase(&mut self) -> Result<Zeroizing<String>, PromptError> {
        self.ask("Please enter your passphrase (optional)")
    }
}
