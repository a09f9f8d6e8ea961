//! Handle type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, InvalidInputError};

/// Maximum length of a handle.
const MAX_LENGTH: usize = 253;

/// Maximum length of a single label.
const MAX_LABEL_LENGTH: usize = 63;

/// Reserved value meaning "this account has no valid handle".
const INVALID_HANDLE: &str = "handle.invalid";

/// Top-level domains that may never be used for a handle.
const DISALLOWED_TLDS: &[&str] = &[
    "alt", "arpa", "example", "internal", "invalid", "local", "localhost", "onion",
];

/// A validated AT Protocol handle.
///
/// Handles are domain names bound to a DID. They are case-insensitive and
/// stored lower-cased, so equality and display use the normalized form.
///
/// # Example
///
/// ```
/// use atkit_core::Handle;
///
/// let handle = Handle::new("Alice.Bsky.Social").unwrap();
/// assert_eq!(handle.as_str(), "alice.bsky.social");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Handle(String);

impl Handle {
    /// Create a new handle from a string, validating and normalizing it.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not a valid handle.
    pub fn new(s: impl Into<String>) -> Result<Self, Error> {
        let s = s.into().to_ascii_lowercase();
        if s != INVALID_HANDLE {
            Self::validate(&s)?;
        }
        Ok(Self(s))
    }

    /// Returns true if `s` is a valid handle.
    pub fn is_valid(s: &str) -> bool {
        Self::new(s).is_ok()
    }

    /// The reserved `handle.invalid` value.
    pub fn invalid() -> Self {
        Self(INVALID_HANDLE.to_string())
    }

    /// Returns true if this is the reserved `handle.invalid` value.
    pub fn is_invalid_sentinel(&self) -> bool {
        self.0 == INVALID_HANDLE
    }

    /// Returns the top-level label.
    pub fn tld(&self) -> &str {
        self.0.rsplit('.').next().unwrap_or("")
    }

    /// Returns the normalized handle string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(s: &str) -> Result<(), Error> {
        let fail = |reason: String| -> Error {
            InvalidInputError::Handle {
                value: s.to_string(),
                reason,
            }
            .into()
        };

        if s.len() > MAX_LENGTH {
            return Err(fail("exceeds maximum length of 253 characters".to_string()));
        }

        let labels: Vec<&str> = s.split('.').collect();
        if labels.len() < 2 {
            return Err(fail("must contain at least one '.'".to_string()));
        }

        for label in &labels {
            if label.is_empty() {
                return Err(fail("contains an empty label".to_string()));
            }
            if label.len() > MAX_LABEL_LENGTH {
                return Err(fail(format!("label '{}' exceeds 63 characters", label)));
            }
            if let Some(c) = label
                .chars()
                .find(|c| !(c.is_ascii_alphanumeric() || *c == '-'))
            {
                return Err(fail(format!("label '{}' contains invalid character '{}'", label, c)));
            }
            if label.starts_with('-') || label.ends_with('-') {
                return Err(fail(format!(
                    "label '{}' must not start or end with a hyphen",
                    label
                )));
            }
        }

        let tld = labels[labels.len() - 1];
        if !tld.starts_with(|c: char| c.is_ascii_alphabetic()) {
            return Err(fail("top-level label must start with a letter".to_string()));
        }

        if DISALLOWED_TLDS.contains(&tld) {
            return Err(fail(format!("top-level domain '.{}' is not allowed", tld)));
        }

        Ok(())
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Handle {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Handle {
    type Error = Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<Handle> for String {
    fn from(handle: Handle) -> Self {
        handle.0
    }
}

impl AsRef<str> for Handle {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
