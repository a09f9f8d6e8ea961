//! XRPC endpoint definitions and request/response types.

use serde::{Deserialize, Serialize};

// ============================================================================
// Endpoint Names
// ============================================================================

/// com.atproto.server.createSession
pub const CREATE_SESSION: &str = "com.atproto.server.createSession";

/// com.atproto.server.refreshSession
pub const REFRESH_SESSION: &str = "com.atproto.server.refreshSession";

/// com.atproto.server.getSession
pub const GET_SESSION: &str = "com.atproto.server.getSession";

/// com.atproto.server.deleteSession
pub const DELETE_SESSION: &str = "com.atproto.server.deleteSession";

/// com.atproto.identity.resolveHandle
pub const RESOLVE_HANDLE: &str = "com.atproto.identity.resolveHandle";

// ============================================================================
// Well-known paths
// ============================================================================

/// Plain-text handle to DID mapping served by the handle's own domain.
pub const WELL_KNOWN_ATPROTO_DID: &str = "atproto-did";

/// DID document location for `did:web` identities without a path.
pub const WELL_KNOWN_DID_JSON: &str = "did.json";

/// OAuth protected resource metadata served by a PDS.
pub const WELL_KNOWN_PROTECTED_RESOURCE: &str = "oauth-protected-resource";

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for createSession.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest<'a> {
    pub identifier: &'a str,
    pub password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_factor_token: Option<&'a str>,
}

impl std::fmt::Debug for CreateSessionRequest<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreateSessionRequest")
            .field("identifier", &self.identifier)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Response from createSession and refreshSession.
///
/// refreshSession takes no request body; the refresh token travels in the
/// Authorization header.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub did: String,
    pub handle: String,
    pub access_jwt: String,
    pub refresh_jwt: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub active: Option<bool>,
}

impl std::fmt::Debug for SessionResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionResponse")
            .field("did", &self.did)
            .field("handle", &self.handle)
            .field("tokens", &"[REDACTED]")
            .finish()
    }
}

/// Response from getSession.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetSessionResponse {
    pub did: String,
    pub handle: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub email_confirmed: Option<bool>,
    #[serde(default)]
    pub active: Option<bool>,
}

/// Query parameters for resolveHandle.
#[derive(Debug, Serialize)]
pub struct ResolveHandleQuery<'a> {
    pub handle: &'a str,
}

/// Response from resolveHandle.
#[derive(Debug, Deserialize)]
pub struct ResolveHandleResponse {
    pub did: String,
}

/// OAuth protected resource metadata.
#[derive(Debug, Deserialize)]
pub struct ProtectedResourceMetadata {
    #[serde(default)]
    pub resource: Option<String>,
    #[serde(default)]
    pub authorization_servers: Vec<String>,
}

/// XRPC error response format.
#[derive(Debug, Deserialize)]
pub struct XrpcErrorResponse {
    pub error: Option<String>,
    pub message: Option<String>,
}
