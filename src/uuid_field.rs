//! A text field holding a UUID in the standard hyphenated form, filled with a
//! random value by default.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Length of the hyphenated form.
pub const MAX_LENGTH: usize = 36;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UuidField(Uuid);

impl UuidField {
    /// A random (version 4) UUID.
    pub fn random() -> Self {
        UuidField(Uuid::new_v4())
    }

    /// A time ordered (version 7) UUID.
    pub fn time_based() -> Self {
        UuidField(Uuid::now_v7())
    }

    pub fn uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for UuidField {
    fn default() -> Self {
        UuidField::random()
    }
}

impl From<Uuid> for UuidField {
    fn from(uuid: Uuid) -> Self {
        UuidField(uuid)
    }
}

impl FromStr for UuidField {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(UuidField(Uuid::parse_str(s)?))
    }
}

impl fmt::Display for UuidField {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_random_v4() {
        let a = UuidField::default();
        let b = UuidField::default();
        assert_ne!(a, b);
        assert_eq!(a.uuid().get_version_num(), 4);
        assert_eq!(a.to_string().len(), MAX_LENGTH);
    }

    #[test]
    fn test_time_based() {
        let a = UuidField::time_based();
        assert_eq!(a.uuid().get_version_num(), 7);
    }

    #[test]
    fn test_parse_and_serde() {
        let text = "59142369-adeb-8ef9-a1be-28f61c05d4d6";
        let field: UuidField = text.parse().unwrap();
        assert_eq!(field.to_string(), text);
        assert_eq!(serde_json::to_string(&field).unwrap(), format!("\"{}\"", text));
        assert!("not-a-uuid".parse::<UuidField>().is_err());
    }
}
