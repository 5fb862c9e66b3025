//! Slugs restricted to lower case letters, digits and hyphens, starting with
//! a letter and ending with a letter or digit.

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Pattern a restricted slug must match.
pub static RESTRICTED_SLUG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z](?:[a-z0-9-]*[a-z0-9])?$").expect("Slug pattern should compile")
});

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error(
    "Slugs must consist of lower case letters, numbers and hyphens, starting with a letter, \
     and ending with a letter or a number, got {0:?}"
)]
pub struct SlugError(pub String);

pub fn validate_restricted_slug(value: &str) -> Result<(), SlugError> {
    if RESTRICTED_SLUG_RE.is_match(value) {
        Ok(())
    } else {
        Err(SlugError(value.to_string()))
    }
}

/// A validated slug.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RestrictedSlug(String);

impl RestrictedSlug {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RestrictedSlug {
    type Error = SlugError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        validate_restricted_slug(&value)?;
        Ok(RestrictedSlug(value))
    }
}

impl FromStr for RestrictedSlug {
    type Err = SlugError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RestrictedSlug::try_from(s.to_string())
    }
}

impl From<RestrictedSlug> for String {
    fn from(slug: RestrictedSlug) -> Self {
        slug.0
    }
}

impl AsRef<str> for RestrictedSlug {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RestrictedSlug {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_slugs() {
        for slug in ["a", "ab", "a1", "hello-world", "x-1-y", "release-2024"] {
            assert!(validate_restricted_slug(slug).is_ok(), "{}", slug);
        }
    }

    #[test]
    fn test_invalid_slugs() {
        for slug in [
            "", "1abc", "-abc", "abc-", "Abc", "ab_c", "ab c", "héllo", "abc\n",
        ] {
            assert_eq!(
                validate_restricted_slug(slug),
                Err(SlugError(slug.to_string())),
                "{:?}",
                slug
            );
        }
    }

    #[test]
    fn test_newtype() {
        let slug: RestrictedSlug = "my-page".parse().unwrap();
        assert_eq!(slug.as_str(), "my-page");
        assert_eq!(slug.to_string(), "my-page");
        assert!("My-Page".parse::<RestrictedSlug>().is_err());
    }

    #[test]
    fn test_serde() {
        let slug: RestrictedSlug = serde_json::from_str("\"news-item\"").unwrap();
        assert_eq!(serde_json::to_string(&slug).unwrap(), "\"news-item\"");
        assert!(serde_json::from_str::<RestrictedSlug>("\"news_item\"").is_err());
    }
}
