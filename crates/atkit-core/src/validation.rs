//! Session token validation.
//!
//! # Scope limitation: no issuer or signature verification
//!
//! [`TokenValidator`] checks audience, expiry and subject only. It does NOT
//! verify the token issuer or its cryptographic signature: PDS
//! implementations do not publish signing-key discovery metadata for session
//! tokens, so there is no key to check against. The validator therefore
//! catches a server handing back a token for the wrong account or service,
//! and tokens that have already expired. It does not detect a forged token.
//! Treat a passing result as "consistent with this session", never as
//! "authentic".

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::tokens::JwtClaims;
use crate::types::{Did, PdsUrl};

/// Why a token was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenRejection {
    /// The token payload could not be decoded.
    #[error("token is not a readable JWT")]
    Malformed,

    /// The service endpoint has no host to derive an audience from.
    #[error("service endpoint has no usable host")]
    NoServiceHost,

    /// The audience is not the service's `did:web` identity.
    #[error("audience {actual:?} does not match {expected}")]
    Audience { expected: String, actual: Vec<String> },

    /// The token has no expiry claim.
    #[error("token has no expiry")]
    MissingExpiry,

    /// The token expired.
    #[error("token expired at {0}")]
    Expired(DateTime<Utc>),

    /// The subject is not the expected DID.
    #[error("subject {actual:?} does not match {expected}")]
    Subject {
        expected: String,
        actual: Option<String>,
    },
}

/// Validates session tokens against the account and service they belong to.
///
/// See the [module documentation](self) for what is deliberately not checked.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenValidator;

impl TokenValidator {
    /// Returns true if `token` passes audience, expiry and subject checks.
    pub fn validate(token: &str, expected_did: &Did, service: &PdsUrl) -> bool {
        Self::check(token, expected_did, service).is_ok()
    }

    /// Check `token`, returning its claims or the first failed rule.
    pub fn check(
        token: &str,
        expected_did: &Did,
        service: &PdsUrl,
    ) -> Result<JwtClaims, TokenRejection> {
        Self::check_at(token, expected_did, service, Utc::now())
    }

    /// Check `token` as of `now`.
    pub fn check_at(
        token: &str,
        expected_did: &Did,
        service: &PdsUrl,
        now: DateTime<Utc>,
    ) -> Result<JwtClaims, TokenRejection> {
        let claims = JwtClaims::decode(token).map_err(|_| TokenRejection::Malformed)?;

        let expected_aud = service
            .service_did()
            .map_err(|_| TokenRejection::NoServiceHost)?;
        if !claims.aud.iter().any(|aud| aud == expected_aud.as_str()) {
            return Err(TokenRejection::Audience {
                expected: expected_aud.to_string(),
                actual: claims.aud,
            });
        }

        let expires_at = claims.expires_at().ok_or(TokenRejection::MissingExpiry)?;
        if expires_at < now {
            return Err(TokenRejection::Expired(expires_at));
        }

        let subject_matches = claims
            .sub
            .as_deref()
            .is_some_and(|sub| sub.eq_ignore_ascii_case(expected_did.as_str()));
        if !subject_matches {
            return Err(TokenRejection::Subject {
                expected: expected_did.to_string(),
                actual: claims.sub,
            });
        }

        Ok(claims)
    }
}
