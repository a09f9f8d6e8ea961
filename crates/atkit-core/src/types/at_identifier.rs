//! AT identifier: a DID or a handle.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{Did, Handle};
use crate::error::{Error, InvalidInputError};

/// Either a [`Did`] or a [`Handle`].
///
/// Parsing tries the DID grammar first, then the handle grammar.
///
/// # Example
///
/// ```
/// use atkit_core::AtIdentifier;
///
/// let id = AtIdentifier::new("did:plc:z72i7hdynmk6r22z27h6tvur").unwrap();
/// assert!(id.as_did().is_some());
///
/// let id = AtIdentifier::new("alice.bsky.social").unwrap();
/// assert!(id.as_handle().is_some());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum AtIdentifier {
    Did(Did),
    Handle(Handle),
}

impl AtIdentifier {
    /// Parse a DID or handle.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is neither a valid DID nor a valid handle.
    pub fn new(s: impl AsRef<str>) -> Result<Self, Error> {
        let s = s.as_ref();
        if let Ok(did) = Did::new(s) {
            return Ok(Self::Did(did));
        }
        if let Ok(handle) = Handle::new(s) {
            return Ok(Self::Handle(handle));
        }
        Err(InvalidInputError::AtIdentifier {
            value: s.to_string(),
        }
        .into())
    }

    /// Returns true if `s` is a valid DID or handle.
    pub fn is_valid(s: &str) -> bool {
        Self::new(s).is_ok()
    }

    /// Returns the DID, if this identifier is one.
    pub fn as_did(&self) -> Option<&Did> {
        match self {
            Self::Did(did) => Some(did),
            Self::Handle(_) => None,
        }
    }

    /// Returns the handle, if this identifier is one.
    pub fn as_handle(&self) -> Option<&Handle> {
        match self {
            Self::Did(_) => None,
            Self::Handle(handle) => Some(handle),
        }
    }

    /// Returns the identifier string.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Did(did) => did.as_str(),
            Self::Handle(handle) => handle.as_str(),
        }
    }
}

impl From<Did> for AtIdentifier {
    fn from(did: Did) -> Self {
        Self::Did(did)
    }
}

impl From<Handle> for AtIdentifier {
    fn from(handle: Handle) -> Self {
        Self::Handle(handle)
    }
}

impl fmt::Display for AtIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AtIdentifier {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for AtIdentifier {
    type Error = Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<AtIdentifier> for String {
    fn from(id: AtIdentifier) -> Self {
        match id {
            AtIdentifier::Did(did) => did.into(),
            AtIdentifier::Handle(handle) => handle.into(),
        }
    }
}
