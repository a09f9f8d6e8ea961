//! AT URI type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{AtIdentifier, Nsid, RecordKey};
use crate::error::{Error, InvalidInputError};

/// Maximum length of an AT URI.
const MAX_LENGTH: usize = 8192;

/// A validated AT Protocol URI.
///
/// AT URIs address repositories, collections and records in the network.
/// Format: `at://<authority>[/<collection>[/<rkey>]]`, where the authority is
/// a DID or handle.
///
/// # Example
///
/// ```
/// use atkit_core::AtUri;
///
/// let uri = AtUri::new("at://did:plc:z72i7hdynmk6r22z27h6tvur/app.bsky.feed.post/3jui7kd54zh2y").unwrap();
/// assert_eq!(uri.collection().unwrap().as_str(), "app.bsky.feed.post");
/// assert_eq!(uri.rkey().unwrap().as_str(), "3jui7kd54zh2y");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AtUri {
    repo: AtIdentifier,
    collection: Option<Nsid>,
    rkey: Option<RecordKey>,
}

impl AtUri {
    /// The URI scheme.
    pub const SCHEME: &'static str = "at";

    /// Create a new AT URI from a string, validating the format.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not a valid AT URI format.
    pub fn new(s: impl AsRef<str>) -> Result<Self, Error> {
        Self::parse(s.as_ref())
    }

    /// Returns true if `s` is a valid AT URI.
    pub fn is_valid(s: &str) -> bool {
        Self::parse(s).is_ok()
    }

    /// Create a record AT URI from its components.
    pub fn from_parts(repo: impl Into<AtIdentifier>, collection: Nsid, rkey: RecordKey) -> Self {
        Self {
            repo: repo.into(),
            collection: Some(collection),
            rkey: Some(rkey),
        }
    }

    /// Create an AT URI addressing a whole collection.
    pub fn with_collection(repo: impl Into<AtIdentifier>, collection: Nsid) -> Self {
        Self {
            repo: repo.into(),
            collection: Some(collection),
            rkey: None,
        }
    }

    /// Returns the repository (DID or handle).
    pub fn repo(&self) -> &AtIdentifier {
        &self.repo
    }

    /// Returns the authority string.
    pub fn authority(&self) -> &str {
        self.repo.as_str()
    }

    /// Returns the collection (NSID), if the URI has a path.
    pub fn collection(&self) -> Option<&Nsid> {
        self.collection.as_ref()
    }

    /// Returns the record key, if the URI addresses a record.
    pub fn rkey(&self) -> Option<&RecordKey> {
        self.rkey.as_ref()
    }

    /// Returns the path component, empty when the URI names a repository.
    pub fn absolute_path(&self) -> String {
        match (&self.collection, &self.rkey) {
            (Some(collection), Some(rkey)) => format!("/{}/{}", collection, rkey),
            (Some(collection), None) => format!("/{}", collection),
            _ => String::new(),
        }
    }

    fn parse(s: &str) -> Result<Self, Error> {
        let fail = |reason: String| -> Error {
            InvalidInputError::AtUri {
                value: s.to_string(),
                reason,
            }
            .into()
        };

        if s.len() > MAX_LENGTH {
            return Err(fail("exceeds maximum length of 8192 characters".to_string()));
        }

        if !s.is_ascii() {
            return Err(fail("must be ASCII".to_string()));
        }

        if s.contains('?') || s.contains('#') {
            return Err(fail("must not contain a query or fragment".to_string()));
        }

        let rest = s
            .strip_prefix("at://")
            .ok_or_else(|| fail("must start with 'at://'".to_string()))?;

        let (authority, path) = match rest.split_once('/') {
            Some((authority, path)) => (authority, Some(path)),
            None => (rest, None),
        };

        // The authority is checked before any path segment
        let repo = AtIdentifier::new(authority)
            .map_err(|_| fail(format!("invalid authority: {}", authority)))?;

        let Some(path) = path else {
            return Ok(Self {
                repo,
                collection: None,
                rkey: None,
            });
        };

        let segments: Vec<&str> = path.split('/').collect();
        if segments.len() > 2 {
            return Err(fail(
                "path must have the form '/<collection>[/<rkey>]'".to_string(),
            ));
        }

        let collection = Nsid::new(segments[0])
            .map_err(|_| fail(format!("invalid collection NSID: {}", segments[0])))?;

        let rkey = segments
            .get(1)
            .map(|rkey| {
                RecordKey::new(*rkey).map_err(|_| fail(format!("invalid rkey: {}", rkey)))
            })
            .transpose()?;

        Ok(Self {
            repo,
            collection: Some(collection),
            rkey,
        })
    }
}

impl fmt::Display for AtUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "at://{}{}", self.repo, self.absolute_path())
    }
}

impl FromStr for AtUri {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Serialize for AtUri {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for AtUri {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        AtUri::new(&s).map_err(serde::de::Error::custom)
    }
}
