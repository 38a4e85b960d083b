//! Key-value key types and traits.

use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Marker trait for KV key types.
///
/// This trait defines how keys are formatted for storage in NATS KV.
pub trait KvKey: fmt::Debug + fmt::Display + FromStr + Clone + Send + Sync + 'static {}

/// Key for cached location entries, stored as `location.<token>`.
///
/// NATS KV keys may not contain `:`, so the `location:` namespace used by the
/// gateway is mapped onto a dot-separated subject token.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LocationKey(String);

impl LocationKey {
    /// Namespace prefix shared by every location key.
    pub const PREFIX: &'static str = "location.";

    /// Creates a key for the given token.
    pub fn new(token: impl Into<String>) -> Result<Self, Error> {
        let token = token.into();
        if token.is_empty() {
            return Err(Error::invalid_key(token, "token cannot be empty"));
        }

        if let Some(c) = token
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '=')))
        {
            return Err(Error::invalid_key(
                token.clone(),
                format!("unsupported character '{c}'"),
            ));
        }

        Ok(Self(token))
    }

    /// Returns the token without the namespace prefix.
    #[inline]
    pub fn token(&self) -> &str {
        &self.0
    }
}

impl KvKey for LocationKey {}

impl fmt::Display for LocationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", Self::PREFIX, self.0)
    }
}

impl FromStr for LocationKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s
            .strip_prefix(Self::PREFIX)
            .ok_or_else(|| Error::invalid_key(s, "missing 'location.' prefix"))?;
        Self::new(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_key_format() {
        let key = LocationKey::new("abc123").unwrap();
        assert_eq!(key.to_string(), "location.abc123");
        assert_eq!(key.token(), "abc123");
    }

    #[test]
    fn test_location_key_parse() {
        let key: LocationKey = "location.1609350".parse().unwrap();
        assert_eq!(key.token(), "1609350");

        assert!("session.abc".parse::<LocationKey>().is_err());
        assert!("location.".parse::<LocationKey>().is_err());
    }

    #[test]
    fn test_location_key_rejects_subject_characters() {
        assert!(LocationKey::new("a.b").is_err());
        assert!(LocationKey::new("a:b").is_err());
        assert!(LocationKey::new("a b").is_err());
        assert!(LocationKey::new("a*").is_err());
        assert!(LocationKey::new("Bangkok_TH-1").is_ok());
    }
}
