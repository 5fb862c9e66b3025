use std::fmt;

use crate::ConfigError;

/// The built-in code characters. Leaves out `0`, `1`, `l` and `o` so codes
/// are easy to read back and type.
pub const DEFAULT_CODE_CHARS: &str = "abcdefghijkmnpqrstuvwxyz23456789";

/// Number of code characters; each one carries 5 bits.
pub const ALPHABET_SIZE: usize = 32;

pub(crate) const BITS_PER_CHAR: u32 = 5;

const INVALID: u8 = 0xff;

/// A 32-character code alphabet with a reverse lookup table.
#[derive(Clone, PartialEq, Eq)]
pub struct Alphabet {
    chars: [u8; ALPHABET_SIZE],
    lookup: [u8; 256],
    case_insensitive: bool,
}

impl Alphabet {
    /// Builds an alphabet from exactly 32 distinct URL safe ASCII characters.
    pub fn new(code_chars: &str) -> Result<Alphabet, ConfigError> {
        let count = code_chars.chars().count();
        if count != ALPHABET_SIZE {
            return Err(ConfigError::InvalidAlphabetLength(count));
        }

        let mut chars = [0u8; ALPHABET_SIZE];
        let mut lookup = [INVALID; 256];
        for (digit, c) in code_chars.chars().enumerate() {
            if !is_url_safe(c) {
                return Err(ConfigError::InvalidAlphabetCharacter(c));
            }
            let byte = c as u8;
            if lookup[byte as usize] != INVALID {
                return Err(ConfigError::DuplicateAlphabetCharacter(c));
            }
            chars[digit] = byte;
            lookup[byte as usize] = digit as u8;
        }

        // Accept the other case too, unless that would make two digits collide.
        let case_insensitive = chars.iter().all(|&b| {
            let other = flip_case(b);
            other == b || lookup[other as usize] == INVALID
        });
        if case_insensitive {
            for (digit, &b) in chars.iter().enumerate() {
                lookup[flip_case(b) as usize] = digit as u8;
            }
        }

        Ok(Alphabet {
            chars,
            lookup,
            case_insensitive,
        })
    }

    /// The character for a digit in `0..32`.
    pub(crate) fn char_for(&self, digit: u8) -> char {
        self.chars[digit as usize & (ALPHABET_SIZE - 1)] as char
    }

    /// The digit for a character, if the character belongs to the alphabet.
    pub(crate) fn digit_for(&self, c: char) -> Option<u8> {
        if !c.is_ascii() {
            return None;
        }
        match self.lookup[c as usize] {
            INVALID => None,
            digit => Some(digit),
        }
    }

    /// Whether parsing ignores ASCII case.
    pub fn is_case_insensitive(&self) -> bool {
        self.case_insensitive
    }

    pub fn as_str(&self) -> &str {
        // Only ASCII bytes are ever stored.
        std::str::from_utf8(&self.chars).unwrap_or_default()
    }

    /// Number of characters needed for values of `bits` bits.
    pub fn width(bits: u32) -> usize {
        bits.div_ceil(BITS_PER_CHAR) as usize
    }
}

impl Default for Alphabet {
    fn default() -> Self {
        Alphabet::new(DEFAULT_CODE_CHARS).expect("Default alphabet should be valid")
    }
}

impl fmt::Debug for Alphabet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Alphabet({:?})", self.as_str())
    }
}

fn is_url_safe(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '~')
}

fn flip_case(b: u8) -> u8 {
    if b.is_ascii_lowercase() {
        b.to_ascii_uppercase()
    } else {
        b.to_ascii_lowercase()
    }
}
