//! Mnemonic encoding
//!
//! Each word is an 11-bit big-endian group of the entropy bitstream,
//! bit 0 being the most significant bit of byte 0, looked up in the
//! English BIP-39 word list.
//!
//! Unlike BIP-39 there is no checksum and the word count only has to be a
//! multiple of 3. Phrases produced here will be rejected by BIP-39
//! wallets, and there is no way back from words to entropy. Recovery
//! goes through Shamir shares of the phrase itself.

use crate::entropy::BITS_PER_WORD;
use crate::ErrorClass;
use bip39::Language;
use thiserror::Error;
use zeroize::Zeroizing;

#[derive(Error, Debug)]
pub enum MnemonicError {
    #[error("Mnemonic word count must be a positive multiple of 3, got {0}")]
    InvalidWordCount(usize),
    #[error("Word {position} is not in the word list")]
    UnknownWord { position: usize },
}

impl MnemonicError {
    pub fn class(&self) -> ErrorClass {
        ErrorClass::Input
    }
}

/// The 2048-entry English word list, indexed by 11-bit value.
pub fn word_list() -> &'static [&'static str; 2048] {
    Language::English.word_list()
}

/// A space-separated word phrase. Wiped on drop.
#[derive(Clone, PartialEq, Eq)]
pub struct Mnemonic {
    phrase: Zeroizing<String>,
}

impl Mnemonic {
    /// Validate an existing phrase.
    ///
    /// Checks word membership and count only; the entropy behind it is
    /// not recoverable. Whitespace is normalised to single spaces.
    pub fn parse(phrase: &str) -> Result<Self, MnemonicError> {
        let mut normalised = Zeroizing::new(String::with_capacity(phrase.len()));
        let mut count = 0;
        for (position, word) in phrase.split_whitespace().enumerate() {
            if Language::English.find_word(word).is_none() {
                return Err(MnemonicError::UnknownWord { position });
            }
            if position > 0 {
                normalised.push(' ');
            }
            normalised.push_str(word);
            count += 1;
        }
        check_word_count(count)?;
        Ok(Self { phrase: normalised })
    }

    pub fn as_str(&self) -> &str {
        &self.phrase
    }

    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.phrase.split(' ')
    }

    pub fn word_count(&self) -> usize {
        self.words().count()
    }
}

impl std::fmt::Debug for Mnemonic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Mnemonic({} words, redacted)", self.word_count())
    }
}

fn check_word_count(count: usize) -> Result<(), MnemonicError> {
    if count == 0 || count % 3 != 0 {
        return Err(MnemonicError::InvalidWordCount(count));
    }
    Ok(())
}

/// Encode every whole 11-bit group of `entropy` as a word.
pub fn encode(entropy: &[u8]) -> Result<Mnemonic, MnemonicError> {
    encode_words(entropy, entropy.len() * 8 / BITS_PER_WORD)
}

/// Encode the first `word_count` 11-bit groups of `entropy`.
///
/// Bits past the end of the buffer read as zero.
pub fn encode_words(entropy: &[u8], word_count: usize) -> Result<Mnemonic, MnemonicError> {
    check_word_count(word_count)?;

    let words = word_list();
    let mut phrase = Zeroizing::new(String::with_capacity(word_count * 9));
    for i in 0..word_count {
        if i > 0 {
            phrase.push(' ');
        }
        phrase.push_str(words[word_index(entropy, i) as usize]);
    }
    Ok(Mnemonic { phrase })
}

/// 11-bit group `i`, MSB first, clamped to the buffer.
fn word_index(entropy: &[u8], i: usize) -> u16 {
    let bit = i * BITS_PER_WORD;
    let start = bit / 8;
    let byte_at = |n: usize| entropy.get(start + n).copied().unwrap_or(0) as u32;

    // the group always fits in the 24-bit window starting at `start`
    let window = (byte_at(0) << 16) | (byte_at(1) << 8) | byte_at(2);
    let shift = 24 - (bit % 8) - BITS_PER_WORD;
    ((window >> shift) & 0x7FF) as u16
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entropy::{entropy_len, mix_entropy};

    #[test]
    fn test_all_zero_entropy_is_first_word() {
        let mnemonic = encode(&[0u8; 33]).unwrap();
        assert_eq!(mnemonic.word_count(), 24);
        assert!(mnemonic.words().all(|w| w == "abandon"));
    }

    #[test]
    fn test_all_ones_entropy_is_last_word() {
        let mnemonic = encode(&[0xFF; 33]).unwrap();
        assert!(mnemonic.words().all(|w| w == "zoo"));
    }

    #[test]
    fn test_groups_cross_byte_boundaries() {
        // bits: 00000000 001|11111 111111|00 ...
        let mut entropy = [0u8; 33];
        entropy[1] = 0x3F;
        entropy[2] = 0xFC;

        let mnemonic = encode(&entropy).unwrap();
        let words: Vec<&str> = mnemonic.words().collect();
        assert_eq!(words[0], "ability");
        assert_eq!(words[1], "zoo");
        assert_eq!(words[2], "abandon");
    }

    #[test]
    fn test_last_group_of_24_words() {
        // the final word is bits 253..264: the low 3 bits of byte 31 and all of byte 32
        let mut entropy = [0u8; 33];
        entropy[31] = 0b0000_0101;
        entropy[32] = 0b1000_0001;

        let mnemonic = encode(&entropy).unwrap();
        let last = mnemonic.words().last().unwrap();
        assert_eq!(last, word_list()[0b101_1000_0001]);
    }

    #[test]
    fn test_read_past_end_is_zero_padded() {
        // two bytes, but three words need 33 bits
        let mnemonic = encode_words(&[0xFF, 0xFF], 3).unwrap();
        let words: Vec<&str> = mnemonic.words().collect();
        assert_eq!(words[0], "zoo");
        // bits 11..16 are ones, the rest falls off the end
        assert_eq!(words[1], word_list()[0b11111_000000]);
        assert_eq!(words[2], "abandon");
    }

    #[test]
    fn test_word_count_matches_for_every_multiple_of_three() {
        for words in (3..=48).step_by(3) {
            let entropy = vec![0xA5u8; entropy_len(words).unwrap()];
            let mnemonic = encode(&entropy).unwrap();
            assert_eq!(mnemonic.word_count(), words, "for {} words", words);
            assert!(mnemonic.words().all(|w| word_list().contains(&w)));
        }
    }

    #[test]
    fn test_mixed_entropy_encodes_valid_words() {
        let entropy =
            mix_entropy(24, "abcdefghijklmnopqrstuvwxyzabcdefghijklmnopqrstuvwxyz").unwrap();
        let mnemonic = encode(entropy.as_bytes()).unwrap();
        assert_eq!(mnemonic.word_count(), 24);
        assert!(mnemonic.words().all(|w| word_list().contains(&w)));
    }

    #[test]
    fn test_invalid_word_counts() {
        // 16 bytes → 11 whole words
        assert!(matches!(
            encode(&[0u8; 16]),
            Err(MnemonicError::InvalidWordCount(11))
        ));
        assert!(matches!(
            encode(&[]),
            Err(MnemonicError::InvalidWordCount(0))
        ));
        assert!(encode_words(&[0u8; 33], 4).is_err());
    }

    #[test]
    fn test_parse_roundtrips_encoded_phrase() {
        let encoded = encode(&[0x5Au8; 33]).unwrap();
        let parsed = Mnemonic::parse(encoded.as_str()).unwrap();
        assert_eq!(parsed, encoded);
    }

    #[test]
    fn test_parse_normalises_whitespace() {
        let parsed = Mnemonic::parse("  zoo\tzoo\n zoo ").unwrap();
        assert_eq!(parsed.as_str(), "zoo zoo zoo");
    }

    #[test]
    fn test_parse_rejects_unknown_word_and_bad_count() {
        assert!(matches!(
            Mnemonic::parse("zoo zoo notaword"),
            Err(MnemonicError::UnknownWord { position: 2 })
        ));
        assert!(matches!(
            Mnemonic::parse("zoo zoo"),
            Err(MnemonicError::InvalidWordCount(2))
        ));
        assert!(Mnemonic::parse("").is_err());
    }

    #[test]
    fn test_debug_is_redacted() {
        let mnemonic = encode(&[0u8; 33]).unwrap();
        let shown = format!("{:?}", mnemonic);
        assert!(!shown.contains("abandon"));
        assert!(shown.contains("24 words"));
    }
}
