//! Record key (rkey) type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, InvalidInputError};

/// Maximum length of a record key.
const MAX_LENGTH: usize = 512;

/// A validated AT Protocol record key.
///
/// Record keys identify individual records within a collection.
/// They can be TIDs (timestamp identifiers) or other valid key formats.
///
/// # Example
///
/// ```
/// use atkit_core::RecordKey;
///
/// let rkey = RecordKey::new("3jui7kd54zh2y").unwrap();
/// assert_eq!(rkey.as_str(), "3jui7kd54zh2y");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RecordKey(String);

impl RecordKey {
    /// Create a new record key from a string, validating the format.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not a valid record key.
    pub fn new(s: impl Into<String>) -> Result<Self, Error> {
        let s = s.into();
        Self::validate(&s)?;
        Ok(Self(s))
    }

    /// Returns true if `s` is a valid record key.
    pub fn is_valid(s: &str) -> bool {
        Self::validate(s).is_ok()
    }

    /// Returns the record key string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(s: &str) -> Result<(), Error> {
        let fail = |reason: String| -> Error {
            InvalidInputError::Rkey {
                value: s.to_string(),
                reason,
            }
            .into()
        };

        if s.is_empty() {
            return Err(fail("cannot be empty".to_string()));
        }

        if s.len() > MAX_LENGTH {
            return Err(fail("exceeds maximum length of 512 characters".to_string()));
        }

        if s == "." || s == ".." {
            return Err(fail("cannot be '.' or '..'".to_string()));
        }

        if let Some(c) = s
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '~' | '.' | ':' | '-')))
        {
            return Err(fail(format!("contains invalid character '{}'", c)));
        }

        Ok(())
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RecordKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for RecordKey {
    type Error = Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<RecordKey> for String {
    fn from(rkey: RecordKey) -> Self {
        rkey.0
    }
}

impl AsRef<str> for RecordKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_tid_rkey() {
        let rkey = RecordKey::new("3jui7kd54zh2y").unwrap();
        assert_eq!(rkey.as_str(), "3jui7kd54zh2y");
    }

    #[test]
    fn valid_single_char() {
        assert!(RecordKey::new("a").is_ok());
    }

    #[test]
    fn valid_punctuation() {
        assert!(RecordKey::is_valid("self"));
        assert!(RecordKey::is_valid("lang:en"));
        assert!(RecordKey::is_valid("a_b~c.d-e"));
        assert!(RecordKey::is_valid("..."));
    }

    #[test]
    fn length_bounds() {
        assert!(RecordKey::new("").is_err());
        assert!(RecordKey::new("a".repeat(512)).is_ok());
        assert!(RecordKey::new("a".repeat(513)).is_err());
    }

    #[test]
    fn invalid_dot() {
        assert!(RecordKey::new(".").is_err());
    }

    #[test]
    fn invalid_double_dot() {
        assert!(RecordKey::new("..").is_err());
    }

    #[test]
    fn invalid_character() {
        assert!(RecordKey::new("test/key").is_err());
        assert!(RecordKey::new("test key").is_err());
        assert!(RecordKey::new("caf\u{e9}").is_err());
    }
}
