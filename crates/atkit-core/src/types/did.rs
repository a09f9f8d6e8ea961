//! Decentralized Identifier (DID) type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, InvalidInputError};

/// Maximum length of a DID string.
const MAX_LENGTH: usize = 2048;

/// A validated Decentralized Identifier (DID).
///
/// DIDs in the AT Protocol typically use the `did:plc:` or `did:web:` methods,
/// but any method matching the generic grammar is accepted.
///
/// # Example
///
/// ```
/// use atkit_core::Did;
///
/// let did = Did::new("did:plc:z72i7hdynmk6r22z27h6tvur").unwrap();
/// assert_eq!(did.method(), "plc");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Did(String);

impl Did {
    /// Create a new DID from a string, validating the format.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not a valid DID format.
    pub fn new(s: impl Into<String>) -> Result<Self, Error> {
        let s = s.into();
        Self::validate(&s)?;
        Ok(Self(s))
    }

    /// Returns true if `s` is a valid DID.
    pub fn is_valid(s: &str) -> bool {
        Self::validate(s).is_ok()
    }

    /// Build the `did:web` DID for a host name.
    ///
    /// Ports are percent-encoded as the did:web method requires.
    pub fn web(host: &str) -> Result<Self, Error> {
        Self::new(format!("did:web:{}", host.replace(':', "%3A")))
    }

    /// Returns the DID method (e.g., "plc" for "did:plc:...").
    pub fn method(&self) -> &str {
        self.0
            .strip_prefix("did:")
            .and_then(|s| s.split(':').next())
            .unwrap_or("")
    }

    /// Returns the method-specific identifier.
    pub fn identifier(&self) -> &str {
        self.0
            .strip_prefix("did:")
            .and_then(|s| s.split_once(':'))
            .map(|(_, id)| id)
            .unwrap_or("")
    }

    /// Returns true for `did:plc` identifiers.
    pub fn is_plc(&self) -> bool {
        self.method() == "plc"
    }

    /// Returns true for `did:web` identifiers.
    pub fn is_web(&self) -> bool {
        self.method() == "web"
    }

    /// Returns the full DID string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(s: &str) -> Result<(), Error> {
        let fail = |reason: &str| -> Error {
            InvalidInputError::Did {
                value: s.to_string(),
                reason: reason.to_string(),
            }
            .into()
        };

        if s.len() > MAX_LENGTH {
            return Err(fail("exceeds maximum length of 2048 characters"));
        }

        // Format: did:<method>:<method-specific-id>
        let rest = s
            .strip_prefix("did:")
            .ok_or_else(|| fail("must start with 'did:'"))?;

        let (method, identifier) = rest
            .split_once(':')
            .ok_or_else(|| fail("must have format 'did:<method>:<identifier>'"))?;

        if method.is_empty() || !method.bytes().all(|b| b.is_ascii_lowercase()) {
            return Err(fail("method must be non-empty lowercase letters"));
        }

        if identifier.is_empty() {
            return Err(fail("identifier must be non-empty"));
        }

        if let Some(c) = identifier
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | ':' | '%' | '-')))
        {
            return Err(fail(&format!("identifier contains invalid character '{}'", c)));
        }

        // Cannot end in ':' or '%'
        if identifier.ends_with(':') || identifier.ends_with('%') {
            return Err(fail("identifier must not end with ':' or '%'"));
        }

        Ok(())
    }
}

impl fmt::Display for Did {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Did {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Did {
    type Error = Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<Did> for String {
    fn from(did: Did) -> Self {
        did.0
    }
}

impl AsRef<str> for Did {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_plc_did() {
        let did = Did::new("did:plc:z72i7hdynmk6r22z27h6tvur").unwrap();
        assert_eq!(did.method(), "plc");
        assert_eq!(did.identifier(), "z72i7hdynmk6r22z27h6tvur");
        assert!(did.is_plc());
    }

    #[test]
    fn method_extraction() {
        assert_eq!(Did::new("did:plc:abc123").unwrap().method(), "plc");
    }

    #[test]
    fn valid_web_did_with_port() {
        let did = Did::new("did:web:localhost%3A2583").unwrap();
        assert!(did.is_web());
        assert_eq!(did.identifier(), "localhost%3A2583");
    }

    #[test]
    fn web_constructor_encodes_port() {
        let did = Did::web("127.0.0.1:8080").unwrap();
        assert_eq!(did.as_str(), "did:web:127.0.0.1%3A8080");
    }

    #[test]
    fn identifier_may_contain_colons() {
        let did = Did::new("did:web:example.com:user:alice").unwrap();
        assert_eq!(did.identifier(), "example.com:user:alice");
    }

    #[test]
    fn invalid_not_a_did() {
        assert!(Did::new("notadid").is_err());
        assert!(!Did::is_valid("notadid"));
    }

    #[test]
    fn invalid_missing_prefix() {
        assert!(Did::new("plc:z72i7hdynmk6r22z27h6tvur").is_err());
    }

    #[test]
    fn invalid_missing_identifier() {
        assert!(Did::new("did:plc:").is_err());
    }

    #[test]
    fn invalid_missing_method() {
        assert!(Did::new("did::identifier").is_err());
    }

    #[test]
    fn invalid_uppercase_method() {
        assert!(Did::new("did:PLC:abc").is_err());
    }

    #[test]
    fn invalid_trailing_separator() {
        assert!(Did::new("did:web:example.com:").is_err());
        assert!(Did::new("did:web:example.com%").is_err());
    }

    #[test]
    fn invalid_character() {
        assert!(Did::new("did:plc:abc/def").is_err());
        assert!(Did::new("did:plc:abc def").is_err());
    }

    #[test]
    fn invalid_too_long() {
        let long = format!("did:plc:{}", "a".repeat(2048));
        assert!(Did::new(long).is_err());
    }

    #[test]
    fn case_sensitive_equality() {
        let a = Did::new("did:plc:ABC").unwrap();
        let b = Did::new("did:plc:abc").unwrap();
        assert_ne!(a, b);
    }
}
