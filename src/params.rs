use hkdf::Hkdf;
use sha2::Sha256;
use tracing::debug;

use crate::alphabet::Alphabet;
use crate::config::value_mask;
use crate::{Config, ConfigError};

/// The immutable parameter set of a codec: bit width, mixing constants and
/// code alphabet.
///
/// The same configuration always yields the same parameters, so identifiers
/// issued by one process stay decodable by the next.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CodecParams {
    pub(crate) bits: u32,
    pub(crate) multiplier: u64,
    pub(crate) inverse: u64,
    pub(crate) mask: u64,
    pub(crate) alphabet: Alphabet,
}

/// Derives the parameters for `bits` wide values with the default seed and
/// alphabet.
///
/// # Examples
///
/// ```
/// use obfid_rs::{configure, ConfigError};
///
/// let params = configure(16).unwrap();
/// assert_eq!(params, configure(16).unwrap());
/// assert_eq!(configure(0), Err(ConfigError::InvalidBitWidth(0)));
/// ```
pub fn configure(bits: u32) -> Result<CodecParams, ConfigError> {
    Ok(CodecParams::new(&Config::new(bits)?))
}

impl CodecParams {
    /// Creates the parameter set for a validated configuration.
    ///
    /// Unless explicit constants were given, the multiplier and mask are
    /// expanded from the seed with HKDF-SHA256, using the bit width in the
    /// info string so that every width gets its own constants.
    pub fn new(config: &Config) -> CodecParams {
        let bits = config.bits;
        let limit = value_mask(bits);
        let (multiplier, mask) = match config.constants {
            Some(constants) => constants,
            None => {
                let hkdf = Hkdf::<Sha256>::new(None, config.seed);
                let multiplier = expand_u64(&hkdf, &format!("{}/multiplier", bits));
                let mask = expand_u64(&hkdf, &format!("{}/mask", bits));
                ((multiplier & limit) | 1, mask & limit)
            }
        };
        let inverse = mod_inverse(multiplier) & limit;
        debug!(bits, multiplier, mask, "derived codec parameters");

        CodecParams {
            bits,
            multiplier,
            inverse,
            mask,
            alphabet: config.alphabet.clone(),
        }
    }

    pub fn bits(&self) -> u32 {
        self.bits
    }

    pub fn multiplier(&self) -> u64 {
        self.multiplier
    }

    /// The inverse of the multiplier modulo 2^bits.
    pub fn inverse(&self) -> u64 {
        self.inverse
    }

    pub fn mask(&self) -> u64 {
        self.mask
    }

    pub fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    /// Largest value in the domain.
    pub fn max_value(&self) -> u64 {
        value_mask(self.bits)
    }

    /// Length of every rendered identifier.
    pub fn width(&self) -> usize {
        Alphabet::width(self.bits)
    }

    pub(crate) fn contains(&self, value: u64) -> bool {
        value & !self.max_value() == 0
    }
}

fn expand_u64(hkdf: &Hkdf<Sha256>, info: &str) -> u64 {
    let mut bytes = [0u8; 8];
    hkdf.expand(info.as_bytes(), &mut bytes)
        .expect("Length 8 should be valid");
    u64::from_le_bytes(bytes)
}

/// Inverse of an odd `m` modulo 2^64.
///
/// Each Newton step `x = x * (2 - m * x)` doubles the number of correct low
/// bits. `m` is its own inverse modulo 8, so five steps reach 96 bits.
/// Truncating the result gives the inverse modulo any smaller power of two.
pub(crate) fn mod_inverse(m: u64) -> u64 {
    debug_assert!(m & 1 == 1);
    let mut x = m;
    for _ in 0..5 {
        x = x.wrapping_mul(2u64.wrapping_sub(m.wrapping_mul(x)));
    }
    x
}
