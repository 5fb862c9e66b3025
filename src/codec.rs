use thiserror::Error as ThisError;

use crate::alphabet::BITS_PER_CHAR;
use crate::{CodecParams, Config, ConfigError};

/// Errors for malformed external identifiers.
#[derive(Debug, ThisError, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("Identifier has {received} characters, expected {expected}")]
    InvalidLength { received: usize, expected: usize },
    #[error("Invalid character {character:?} at position {position}")]
    InvalidCharacter { character: char, position: usize },
    #[error("Identifier does not fit in {bits} bits")]
    OutOfRange { bits: u32 },
}

/// Error returned for encode/decode errors.
#[derive(Debug, ThisError, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Value {value} is outside the {bits} bit domain")]
    Domain { value: u64, bits: u32 },
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl Error {
    /// True for errors caused by a malformed identifier string. Web handlers
    /// usually answer these with "not found".
    pub fn is_format_error(&self) -> bool {
        matches!(self, Error::Format(_))
    }
}

fn check_domain(params: &CodecParams, value: u64) -> Result<(), Error> {
    if params.contains(value) {
        Ok(())
    } else {
        Err(Error::Domain {
            value,
            bits: params.bits,
        })
    }
}

/// Mixes a plain value: multiply by the odd multiplier modulo 2^bits, then
/// XOR with the mask.
///
/// # Examples
///
/// ```
/// use obfid_rs::{encode, CodecParams, Config};
///
/// let config = Config::new(8).unwrap().constants(167, 0b1011_0011).unwrap();
/// let params = CodecParams::new(&config);
/// assert_eq!(encode(&params, 5).unwrap(), ((5 * 167) % 256) ^ 0b1011_0011);
/// ```
pub fn encode(params: &CodecParams, value: u64) -> Result<u64, Error> {
    check_domain(params, value)?;
    Ok((value.wrapping_mul(params.multiplier) & params.max_value()) ^ params.mask)
}

/// Reverses `encode`: XOR with the mask, then multiply by the inverse of the
/// multiplier modulo 2^bits.
pub fn decode(params: &CodecParams, value: u64) -> Result<u64, Error> {
    check_domain(params, value)?;
    let plain = (value ^ params.mask).wrapping_mul(params.inverse) & params.max_value();
    debug_assert_eq!(encode(params, plain), Ok(value));
    Ok(plain)
}

/// Renders an (already obfuscated) value as a fixed-width code, most
/// significant digit first.
pub fn render(params: &CodecParams, value: u64) -> Result<String, Error> {
    check_domain(params, value)?;
    let width = params.width();
    let mut digits = Vec::with_capacity(width);
    let mut rest = value;
    for _ in 0..width {
        digits.push(params.alphabet.char_for((rest & 0x1f) as u8));
        rest >>= BITS_PER_CHAR;
    }
    Ok(digits.into_iter().rev().collect())
}

/// Parses a code produced by `render` back into its integer value.
pub fn parse(params: &CodecParams, text: &str) -> Result<u64, Error> {
    let expected = params.width();
    let received = text.chars().count();
    if received != expected {
        return Err(FormatError::InvalidLength { received, expected }.into());
    }

    // 13 characters carry 65 bits, one more than a u64 holds.
    let mut value: u128 = 0;
    for (position, character) in text.chars().enumerate() {
        let digit = params
            .alphabet
            .digit_for(character)
            .ok_or(FormatError::InvalidCharacter {
                character,
                position,
            })?;
        value = (value << BITS_PER_CHAR) | digit as u128;
    }

    if value > params.max_value() as u128 {
        return Err(FormatError::OutOfRange { bits: params.bits }.into());
    }
    Ok(value as u64)
}

/// Core encoder/decoder.
#[derive(Clone, Debug)]
pub struct Codec {
    params: CodecParams,
}

impl Codec {
    /// Creates a new `Codec` from a validated configuration.
    ///
    /// # Examples
    ///
    /// ```
    /// use obfid_rs::{Codec, Config};
    ///
    /// let codec = Codec::new(&Config::new(30).unwrap().seed(b"articles"));
    /// let code = codec.obfuscate(12345).unwrap();
    /// assert_eq!(code.len(), 6);
    /// assert_eq!(codec.deobfuscate(&code).unwrap(), 12345);
    /// ```
    pub fn new(config: &Config) -> Codec {
        Codec {
            params: CodecParams::new(config),
        }
    }

    pub fn params(&self) -> &CodecParams {
        &self.params
    }

    pub fn encode(&self, value: u64) -> Result<u64, Error> {
        encode(&self.params, value)
    }

    pub fn decode(&self, value: u64) -> Result<u64, Error> {
        decode(&self.params, value)
    }

    pub fn render(&self, value: u64) -> Result<String, Error> {
        render(&self.params, value)
    }

    pub fn parse(&self, text: &str) -> Result<u64, Error> {
        parse(&self.params, text)
    }

    /// Turns a plain value into its external identifier.
    pub fn obfuscate(&self, plain: u64) -> Result<String, Error> {
        self.render(self.encode(plain)?)
    }

    /// Turns an external identifier back into the plain value.
    pub fn deobfuscate(&self, text: &str) -> Result<u64, Error> {
        self.decode(self.parse(text)?)
    }
}

impl From<CodecParams> for Codec {
    fn from(params: CodecParams) -> Codec {
        Codec { params }
    }
}
