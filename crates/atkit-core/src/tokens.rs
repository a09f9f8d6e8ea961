//! Token types for AT Protocol authentication.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, TimeDelta, Utc};
use serde::Deserialize;

use crate::error::{Error, InvalidInputError};

/// Claims read from a JWT payload.
///
/// Only the claims the session lifecycle relies on are decoded. The payload is
/// read without verifying the signature; see [`crate::TokenValidator`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct JwtClaims {
    /// Subject: the account DID.
    #[serde(default)]
    pub sub: Option<String>,
    /// Audience: the service DID(s) the token is for.
    #[serde(default, deserialize_with = "audience")]
    pub aud: Vec<String>,
    /// Expiry, seconds since the Unix epoch.
    #[serde(default)]
    pub exp: Option<i64>,
    /// Issued-at, seconds since the Unix epoch.
    #[serde(default)]
    pub iat: Option<i64>,
    /// Issuer.
    #[serde(default)]
    pub iss: Option<String>,
    /// Token scope, e.g. `com.atproto.access`.
    #[serde(default)]
    pub scope: Option<String>,
}

impl JwtClaims {
    /// Decode the claims of a compact-serialized JWT.
    pub fn decode(token: &str) -> Result<Self, Error> {
        let fail = |reason: String| -> Error { InvalidInputError::Token { reason }.into() };

        let mut parts = token.split('.');
        let (Some(_header), Some(payload), Some(_signature), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(fail("expected three dot-separated segments".to_string()));
        };

        let bytes = URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .map_err(|e| fail(format!("payload is not base64url: {}", e)))?;

        serde_json::from_slice(&bytes).map_err(|e| fail(format!("payload is not JSON: {}", e)))
    }

    /// Returns the expiry as a timestamp.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.exp.and_then(|exp| DateTime::from_timestamp(exp, 0))
    }
}

fn audience<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Audience {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<Audience>::deserialize(deserializer)? {
        Some(Audience::One(aud)) => vec![aud],
        Some(Audience::Many(aud)) => aud,
        None => Vec::new(),
    })
}

/// An access token for authenticated XRPC requests.
///
/// Access tokens are short-lived JWTs used to authenticate requests to the PDS.
///
/// # Security
///
/// Never logged or displayed in Debug output.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    /// Create a new access token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the token value for use in authorization headers.
    ///
    /// # Security
    ///
    /// Use only when constructing HTTP authorization headers or persisting
    /// the session.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Decode the unverified JWT claims.
    pub fn claims(&self) -> Result<JwtClaims, Error> {
        JwtClaims::decode(&self.0)
    }

    /// Returns the expiry embedded in the token, if it can be read.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.claims().ok().and_then(|c| c.expires_at())
    }

    /// Returns how long the token remains valid at `now`.
    ///
    /// Tokens without a readable expiry, or already expired, report zero.
    pub fn time_to_expiry(&self, now: DateTime<Utc>) -> TimeDelta {
        self.expires_at()
            .map(|exp| exp - now)
            .filter(|remaining| *remaining > TimeDelta::zero())
            .unwrap_or_else(TimeDelta::zero)
    }
}

// Hide token value in Debug output
impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AccessToken").field(&"[REDACTED]").finish()
    }
}

/// A refresh token for obtaining new access tokens.
///
/// Refresh tokens are longer-lived and used to obtain new access tokens
/// without requiring re-authentication.
///
/// # Security
///
/// Never logged or displayed in Debug output.
#[derive(Clone, PartialEq, Eq)]
pub struct RefreshToken(String);

impl RefreshToken {
    /// Create a new refresh token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the token value for use in refresh requests.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Decode the unverified JWT claims.
    pub fn claims(&self) -> Result<JwtClaims, Error> {
        JwtClaims::decode(&self.0)
    }
}

// Hide token value in Debug output
impl fmt::Debug for RefreshToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RefreshToken").field(&"[REDACTED]").finish()
    }
}
