use thiserror::Error;

use crate::alphabet::{Alphabet, DEFAULT_CODE_CHARS};

/// Largest supported bit width.
pub const MAX_BITS: u32 = 64;

/// Errors for invalid codec configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Bit width {0} is outside the supported range 1..=64")]
    InvalidBitWidth(u32),
    #[error("Multiplier {0} is even and has no inverse")]
    EvenMultiplier(u64),
    #[error("Constant {value} does not fit in {bits} bits")]
    ConstantTooWide { value: u64, bits: u32 },
    #[error("Alphabet must have 32 characters, got {0}")]
    InvalidAlphabetLength(usize),
    #[error("Alphabet character {0:?} is not URL safe")]
    InvalidAlphabetCharacter(char),
    #[error("Alphabet character {0:?} appears more than once")]
    DuplicateAlphabetCharacter(char),
}

/// Configuring an obfuscated identifier codec.
///
/// The bit width is validated up front; the rest of the settings default to
/// an empty seed, the built-in alphabet and derived mixing constants.
#[derive(Clone, Debug)]
pub struct Config<'a> {
    pub(crate) bits: u32,
    pub(crate) seed: &'a [u8],
    pub(crate) alphabet: Alphabet,
    pub(crate) constants: Option<(u64, u64)>,
}

impl<'a> Config<'a> {
    /// Creates a new configuration for values of `bits` bits.
    /// The value must be between 1 and 64.
    pub fn new(bits: u32) -> Result<Self, ConfigError> {
        if bits == 0 || bits > MAX_BITS {
            return Err(ConfigError::InvalidBitWidth(bits));
        }
        Ok(Config {
            bits,
            seed: b"",
            alphabet: Alphabet::default(),
            constants: None,
        })
    }

    /// Sets the seed the mixing constants are derived from. Two fields with
    /// the same width but different seeds produce unrelated sequences.
    pub fn seed(mut self, seed: &'a [u8]) -> Self {
        self.seed = seed;
        self
    }

    /// Sets the 32 code characters used for the external representation.
    /// The default is `abcdefghijkmnpqrstuvwxyz23456789`.
    pub fn alphabet(mut self, code_chars: &str) -> Result<Self, ConfigError> {
        self.alphabet = Alphabet::new(code_chars)?;
        Ok(self)
    }

    /// Uses explicit mixing constants instead of deriving them from the seed.
    /// The multiplier must be odd and both values must fit in the bit width.
    pub fn constants(mut self, multiplier: u64, mask: u64) -> Result<Self, ConfigError> {
        if multiplier & 1 == 0 {
            return Err(ConfigError::EvenMultiplier(multiplier));
        }
        let limit = value_mask(self.bits);
        for value in [multiplier, mask] {
            if value & !limit != 0 {
                return Err(ConfigError::ConstantTooWide {
                    value,
                    bits: self.bits,
                });
            }
        }
        self.constants = Some((multiplier, mask));
        Ok(self)
    }

    pub fn bits(&self) -> u32 {
        self.bits
    }

    pub fn uses_default_alphabet(&self) -> bool {
        self.alphabet.as_str() == DEFAULT_CODE_CHARS
    }
}

/// All ones in the low `bits` bits.
pub(crate) fn value_mask(bits: u32) -> u64 {
    if bits >= 64 {
        u64::MAX
    } else {
        (1u64 << bits) - 1
    }
}
