//! Error types for atkit.
//!
//! A single error type covers transport, authentication, protocol and input
//! validation failures. Callers match on the variant to decide whether a
//! failure is expected (a remote rejection, carried as [`ProtocolError`]) or
//! an integrity problem (token mismatch, broken session state).

use std::fmt;
use thiserror::Error;

use crate::session::SessionConfigurationError;

/// The unified error type for atkit operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Network transport errors (DNS, TLS, connection, timeout).
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Authentication and session integrity errors.
    #[error("authentication error: {0}")]
    Auth(#[from] AuthError),

    /// Protocol errors (XRPC errors, unexpected responses).
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Input validation errors (invalid DID, handle, NSID, URI format).
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInputError),

    /// The operation was cancelled before it completed.
    #[error("operation cancelled")]
    Cancelled,
}

impl Error {
    /// Returns the HTTP status carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Protocol(err) => Some(err.status),
            _ => None,
        }
    }
}

/// Transport-level errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Network connection failed.
    #[error("connection failed: {message}")]
    Connection { message: String },

    /// Request timed out.
    #[error("request timed out")]
    Timeout,

    /// Response body could not be decoded.
    #[error("failed to decode response from {uri}: {message}")]
    Decode { uri: String, message: String },

    /// Generic HTTP error.
    #[error("HTTP error: {message}")]
    Http { message: String },
}

/// Authentication-related errors.
///
/// Everything here is fatal for the operation that raised it: these indicate
/// a caller or server contract violation rather than a normal remote rejection.
#[derive(Debug, Error)]
pub enum AuthError {
    /// An operation needing a live session was invoked without one.
    #[error("authentication required")]
    AuthenticationRequired,

    /// The session is missing fields the operation needs.
    #[error("invalid session configuration: {0:?}")]
    InvalidSessionConfiguration(SessionConfigurationError),

    /// A token failed audience, expiry or subject checks.
    #[error("token validation failed: {reason}")]
    TokenValidation { reason: String },

    /// A restored session resolved to a different account.
    #[error("session restoration failed: expected {expected}, got {actual}")]
    SessionRestoration { expected: String, actual: String },

    /// Invalid credentials provided.
    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),
}

/// Protocol-level errors from XRPC responses.
///
/// This doubles as the structured failure returned by login and refresh,
/// so it carries the request method and URI for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolError {
    /// HTTP status code.
    pub status: u16,
    /// XRPC error code (if present).
    pub error: Option<String>,
    /// Error message from the server.
    pub message: Option<String>,
    /// HTTP method of the failed request.
    pub method: Option<String>,
    /// URI of the failed request.
    pub uri: Option<String>,
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP {}", self.status)?;
        if let Some(ref error) = self.error {
            write!(f, " [{}]", error)?;
        }
        if let Some(ref message) = self.message {
            write!(f, ": {}", message)?;
        }
        if let (Some(method), Some(uri)) = (&self.method, &self.uri) {
            write!(f, " ({} {})", method, uri)?;
        }
        Ok(())
    }
}

impl std::error::Error for ProtocolError {}

impl ProtocolError {
    /// Create a new protocol error.
    pub fn new(status: u16, error: Option<String>, message: Option<String>) -> Self {
        Self {
            status,
            error,
            message,
            method: None,
            uri: None,
        }
    }

    /// Attach the request that produced this error.
    pub fn with_request(mut self, method: impl Into<String>, uri: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self.uri = Some(uri.into());
        self
    }

    /// Check if this is an authentication error.
    pub fn is_auth_error(&self) -> bool {
        self.status == 401
            || self.error.as_deref() == Some("AuthenticationRequired")
            || self.error.as_deref() == Some("ExpiredToken")
            || self.error.as_deref() == Some("InvalidToken")
    }
}

/// Input validation errors.
#[derive(Debug, Error)]
pub enum InvalidInputError {
    /// Invalid DID format.
    #[error("invalid DID '{value}': {reason}")]
    Did { value: String, reason: String },

    /// Invalid handle format.
    #[error("invalid handle '{value}': {reason}")]
    Handle { value: String, reason: String },

    /// Neither a DID nor a handle.
    #[error("invalid AT identifier '{value}': not a DID or handle")]
    AtIdentifier { value: String },

    /// Invalid NSID format.
    #[error("invalid NSID '{value}': {reason}")]
    Nsid { value: String, reason: String },

    /// Invalid AT URI format.
    #[error("invalid AT URI '{value}': {reason}")]
    AtUri { value: String, reason: String },

    /// Invalid PDS URL format.
    #[error("invalid PDS URL '{value}': {reason}")]
    PdsUrl { value: String, reason: String },

    /// Invalid record key format.
    #[error("invalid rkey '{value}': {reason}")]
    Rkey { value: String, reason: String },

    /// Token could not be decoded as a JWT.
    #[error("malformed token: {reason}")]
    Token { reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protocol_error_display_includes_request() {
        let err = ProtocolError::new(
            400,
            Some("ExpiredToken".to_string()),
            Some("Token has expired".to_string()),
        )
        .with_request("POST", "https://pds.example/xrpc/com.atproto.server.refreshSession");

        let rendered = err.to_string();
        assert!(rendered.starts_with("HTTP 400 [ExpiredToken]: Token has expired"));
        assert!(rendered.contains("POST https://pds.example/xrpc/"));
        assert!(err.is_auth_error());
    }

    #[test]
    fn status_only_for_protocol_errors() {
        let err: Error = ProtocolError::new(502, None, None).into();
        assert_eq!(err.status(), Some(502));
        assert_eq!(Error::Cancelled.status(), None);
    }
}
