//! Quick-retrieve tokens and the keys derived from them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Namespace of every location entry in the cache store.
pub const LOCATION_KEY_PREFIX: &str = "location:";

/// Longest accepted token.
pub const MAX_TOKEN_LEN: usize = 128;

/// Reasons a raw token is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum InvalidToken {
    #[error("token is empty")]
    Empty,
    #[error("token exceeds 128 characters")]
    TooLong,
    #[error("token contains unsupported character '{0}'")]
    Character(char),
}

/// A validated quick-retrieve token.
///
/// Tokens match `[A-Za-z0-9_-]{1,128}`, which keeps them valid for every
/// cache backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct LocationToken(String);

impl LocationToken {
    /// Validates and wraps a raw token.
    pub fn new(token: impl Into<String>) -> Result<Self, InvalidToken> {
        let token = token.into();
        if token.is_empty() {
            return Err(InvalidToken::Empty);
        }
        if token.len() > MAX_TOKEN_LEN {
            return Err(InvalidToken::TooLong);
        }
        if let Some(c) = token
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_')))
        {
            return Err(InvalidToken::Character(c));
        }

        Ok(Self(token))
    }

    /// Returns the raw token.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the logical cache key, `location:<token>`.
    pub fn cache_key(&self) -> String {
        format!("{LOCATION_KEY_PREFIX}{}", self.0)
    }

    /// Parses a logical cache key back into its token.
    pub fn from_cache_key(key: &str) -> Option<Self> {
        key.strip_prefix(LOCATION_KEY_PREFIX)
            .and_then(|token| Self::new(token).ok())
    }
}

impl fmt::Display for LocationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for LocationToken {
    type Err = InvalidToken;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl<'de> Deserialize<'de> for LocationToken {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::new(raw).map_err(serde::de::Error::custom)
    }
}

impl AsRef<str> for LocationToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_valid_tokens() {
        let token = LocationToken::new("abc123").unwrap();
        assert_eq!(token.cache_key(), "location:abc123");
        assert!(LocationToken::new("BKK_north-1").is_ok());
        assert!(LocationToken::new("a".repeat(MAX_TOKEN_LEN)).is_ok());
    }

    #[test]
    fn rejects_invalid_tokens() {
        assert_eq!(LocationToken::new(""), Err(InvalidToken::Empty));
        assert_eq!(
            LocationToken::new("a".repeat(MAX_TOKEN_LEN + 1)),
            Err(InvalidToken::TooLong)
        );
        assert_eq!(
            LocationToken::new("loc:1"),
            Err(InvalidToken::Character(':'))
        );
        assert_eq!(
            LocationToken::new("a b"),
            Err(InvalidToken::Character(' '))
        );
    }

    #[test]
    fn parses_cache_keys() {
        let token = LocationToken::from_cache_key("location:1609350").unwrap();
        assert_eq!(token.as_str(), "1609350");
        assert!(LocationToken::from_cache_key("weather:1").is_none());
        assert!(LocationToken::from_cache_key("location:").is_none());
    }

    #[test]
    fn deserialization_validates() {
        let token: LocationToken = serde_json::from_str("\"abc123\"").unwrap();
        assert_eq!(token.as_str(), "abc123");
        assert!(serde_json::from_str::<LocationToken>("\"a.b\"").is_err());
    }
}
