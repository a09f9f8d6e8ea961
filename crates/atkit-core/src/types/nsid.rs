//! Namespaced Identifier (NSID) type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, InvalidInputError};

/// Maximum total length of an NSID.
const MAX_LENGTH: usize = 317;

/// Maximum length of a single segment.
const MAX_SEGMENT_LENGTH: usize = 63;

/// A validated AT Protocol Namespaced Identifier (NSID).
///
/// NSIDs use reverse-DNS notation to name lexicon types and collections.
/// Everything before the last segment is the domain authority; the last
/// segment is the name.
///
/// # Example
///
/// ```
/// use atkit_core::Nsid;
///
/// let nsid = Nsid::new("app.bsky.feed.post").unwrap();
/// assert_eq!(nsid.authority(), "app.bsky.feed");
/// assert_eq!(nsid.name(), "post");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Nsid(String);

impl Nsid {
    /// Create a new NSID from a string, validating the format.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not a valid NSID format.
    pub fn new(s: impl Into<String>) -> Result<Self, Error> {
        let s = s.into();
        Self::validate(&s)?;
        Ok(Self(s))
    }

    /// Returns true if `s` is a valid NSID.
    pub fn is_valid(s: &str) -> bool {
        Self::validate(s).is_ok()
    }

    /// Returns the authority portion (all but the last segment).
    ///
    /// For "app.bsky.feed.post", returns "app.bsky.feed".
    pub fn authority(&self) -> &str {
        self.0.rsplit_once('.').map(|(a, _)| a).unwrap_or("")
    }

    /// Returns the name portion (the last segment).
    ///
    /// For "app.bsky.feed.post", returns "post".
    pub fn name(&self) -> &str {
        self.0.rsplit_once('.').map(|(_, n)| n).unwrap_or(&self.0)
    }

    /// Returns the full NSID string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the segments of the NSID.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('.')
    }

    fn validate(s: &str) -> Result<(), Error> {
        let fail = |reason: String| -> Error {
            InvalidInputError::Nsid {
                value: s.to_string(),
                reason,
            }
            .into()
        };

        if s.is_empty() {
            return Err(fail("cannot be empty".to_string()));
        }

        if s.len() > MAX_LENGTH {
            return Err(fail("exceeds maximum length of 317 characters".to_string()));
        }

        let segments: Vec<&str> = s.split('.').collect();
        if segments.len() < 3 {
            return Err(fail(
                "must have at least 3 segments (e.g., 'com.example.record')".to_string(),
            ));
        }

        let last = segments.len() - 1;
        for (i, segment) in segments.iter().enumerate() {
            if segment.is_empty() {
                return Err(fail(format!("segment {} is empty", i + 1)));
            }

            if segment.len() > MAX_SEGMENT_LENGTH {
                return Err(fail(format!("segment '{}' exceeds 63 characters", segment)));
            }

            if i == last {
                // The name segment is letters only
                if !segment.bytes().all(|b| b.is_ascii_alphabetic()) {
                    return Err(fail(format!("name '{}' must contain only letters", segment)));
                }
                continue;
            }

            if let Some(c) = segment
                .chars()
                .find(|c| !(c.is_ascii_alphanumeric() || *c == '-'))
            {
                return Err(fail(format!(
                    "segment '{}' contains invalid character '{}'",
                    segment, c
                )));
            }

            if segment.starts_with('-') || segment.ends_with('-') {
                return Err(fail(format!(
                    "segment '{}' must not start or end with a hyphen",
                    segment
                )));
            }

            if i == 0 && segment.starts_with(|c: char| c.is_ascii_digit()) {
                return Err(fail(format!(
                    "first segment '{}' must not start with a digit",
                    segment
                )));
            }
        }

        Ok(())
    }
}

impl fmt::Display for Nsid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Nsid {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Nsid {
    type Error = Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<Nsid> for String {
    fn from(nsid: Nsid) -> Self {
        nsid.0
    }
}

impl AsRef<str> for Nsid {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_nsid() {
        let nsid = Nsid::new("app.bsky.feed.post").unwrap();
        assert_eq!(nsid.authority(), "app.bsky.feed");
        assert_eq!(nsid.name(), "post");
        assert_eq!(nsid.segments().count(), 4);
    }

    #[test]
    fn valid_three_segment_nsid() {
        let nsid = Nsid::new("com.example.record").unwrap();
        assert_eq!(nsid.authority(), "com.example");
        assert_eq!(nsid.name(), "record");
    }

    #[test]
    fn authority_allows_digits_and_internal_hyphens() {
        assert!(Nsid::is_valid("com.ex-ample2.v1.fooBar"));
        assert!(Nsid::is_valid("a1.b.c"));
    }

    #[test]
    fn invalid_too_few_segments() {
        assert!(Nsid::new("a.b").is_err());
    }

    #[test]
    fn invalid_first_segment_starts_with_digit() {
        assert!(Nsid::new("123.a.bc").is_err());
    }

    #[test]
    fn invalid_name_contains_digit() {
        assert!(Nsid::new("a.b.c1").is_err());
    }

    #[test]
    fn invalid_name_contains_hyphen() {
        assert!(Nsid::new("com.example.foo-bar").is_err());
    }

    #[test]
    fn invalid_empty_segment() {
        assert!(Nsid::new("app..feed.post").is_err());
    }

    #[test]
    fn invalid_hyphen_boundaries() {
        assert!(Nsid::new("com.-example.record").is_err());
        assert!(Nsid::new("com.example-.record").is_err());
    }

    #[test]
    fn invalid_segment_too_long() {
        let seg = "a".repeat(64);
        assert!(Nsid::new(format!("com.{}.record", seg)).is_err());
    }

    #[test]
    fn invalid_total_length() {
        let seg = "a".repeat(63);
        let s = format!("{0}.{0}.{0}.{0}.{0}.abc", seg);
        assert!(s.len() > 317);
        assert!(Nsid::new(s).is_err());
    }
}
