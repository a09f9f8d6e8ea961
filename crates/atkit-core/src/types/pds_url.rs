//! PDS URL type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;

use super::Did;
use crate::error::{Error, InvalidInputError};

/// A validated PDS (Personal Data Server) URL.
///
/// Network URLs must use HTTPS; plain HTTP is accepted only for loopback
/// hosts so a local development PDS can be used.
///
/// # Example
///
/// ```
/// use atkit_core::PdsUrl;
///
/// let pds = PdsUrl::new("https://bsky.social").unwrap();
/// assert_eq!(pds.xrpc_url("com.atproto.server.createSession"),
///            "https://bsky.social/xrpc/com.atproto.server.createSession");
/// assert_eq!(pds.service_did().unwrap().as_str(), "did:web:bsky.social");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PdsUrl(Url);

impl PdsUrl {
    /// Create a new PDS URL from a string, validating the format.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is not valid or doesn't meet requirements.
    pub fn new(s: impl AsRef<str>) -> Result<Self, Error> {
        let s = s.as_ref();
        let url = Url::parse(s).map_err(|e| InvalidInputError::PdsUrl {
            value: s.to_string(),
            reason: e.to_string(),
        })?;

        Self::from_url(url)
    }

    /// Create a PDS URL from an already parsed [`Url`].
    pub fn from_url(url: Url) -> Result<Self, Error> {
        Self::validate(&url)?;

        // Normalize: remove trailing slash
        let normalized = if url.path() == "/" {
            let mut u = url;
            u.set_path("");
            u
        } else {
            url
        };

        Ok(Self(normalized))
    }

    /// Returns the XRPC endpoint URL for a given method.
    pub fn xrpc_url(&self, method: &str) -> String {
        // The URL crate always adds a trailing slash to root paths,
        // so we need to handle that when constructing the XRPC URL
        let base = self.0.as_str().trim_end_matches('/');
        format!("{}/xrpc/{}", base, method)
    }

    /// Returns a `/.well-known/` URL on this server's origin.
    pub fn well_known_url(&self, name: &str) -> String {
        format!(
            "{}/.well-known/{}",
            self.0.origin().ascii_serialization(),
            name
        )
    }

    /// Returns the `did:web` identity of this service.
    ///
    /// Access tokens issued by the PDS carry this value as their audience.
    /// IPv6 hosts lose their brackets, so `[::1]` becomes `did:web:%3A%3A1`.
    pub fn service_did(&self) -> Result<Did, Error> {
        let host = self.host().ok_or_else(|| InvalidInputError::PdsUrl {
            value: self.to_string(),
            reason: "must have a host".to_string(),
        })?;
        let host = host
            .strip_prefix('[')
            .and_then(|h| h.strip_suffix(']'))
            .unwrap_or(host);
        Did::web(host)
    }

    /// Returns the base URL as a string.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Returns the inner URL.
    pub fn as_url(&self) -> &Url {
        &self.0
    }

    /// Returns the host string.
    pub fn host(&self) -> Option<&str> {
        self.0.host_str()
    }

    /// Returns the URL scheme ("https" or "http").
    pub fn scheme(&self) -> &str {
        self.0.scheme()
    }

    /// Returns true if the host is a loopback address.
    pub fn is_loopback(&self) -> bool {
        is_loopback_host(self.0.host_str())
    }

    fn validate(url: &Url) -> Result<(), Error> {
        let fail = |reason: &str| -> Error {
            InvalidInputError::PdsUrl {
                value: url.to_string(),
                reason: reason.to_string(),
            }
            .into()
        };

        // Must be absolute
        if url.cannot_be_a_base() {
            return Err(fail("must be an absolute URL"));
        }

        let scheme = url.scheme();

        // Must be HTTPS (or HTTP for localhost)
        if scheme != "https" && !(scheme == "http" && is_loopback_host(url.host_str())) {
            return Err(fail("must use HTTPS (HTTP allowed only for localhost)"));
        }

        // Must have a host for network URLs
        if url.host_str().is_none() {
            return Err(fail("must have a host"));
        }

        if url.query().is_some() || url.fragment().is_some() {
            return Err(fail("must not have a query or fragment"));
        }

        Ok(())
    }
}

fn is_loopback_host(host: Option<&str>) -> bool {
    host.is_some_and(|h| h == "localhost" || h == "127.0.0.1" || h == "[::1]" || h == "::1")
}

impl fmt::Display for PdsUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PdsUrl {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Serialize for PdsUrl {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.0.as_str())
    }
}

impl<'de> Deserialize<'de> for PdsUrl {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        PdsUrl::new(&s).map_err(serde::de::Error::custom)
    }
}

impl AsRef<str> for PdsUrl {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}
