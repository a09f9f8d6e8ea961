//! Session endpoints of an XRPC-backed PDS.

use tracing::{debug, instrument};

use atkit_core::types::PdsUrl;
use atkit_core::{AccessToken, Credentials, RefreshToken, Result};

use crate::xrpc::XrpcClient;
use crate::xrpc::endpoints::*;

/// The session endpoints of one PDS.
///
/// Server refusals surface as [`atkit_core::Error::Protocol`] carrying the
/// status, XRPC error code and the request that failed.
#[derive(Debug, Clone)]
pub struct XrpcPds {
    pds: PdsUrl,
    client: XrpcClient,
}

impl XrpcPds {
    /// Create a PDS handle sharing an existing client.
    pub fn new(client: XrpcClient, pds: PdsUrl) -> Self {
        Self { pds, client }
    }

    /// Authenticate with an identifier and password.
    #[instrument(skip(self, credentials), fields(pds = %self.pds, identifier = credentials.identifier()))]
    pub async fn create_session(&self, credentials: &Credentials) -> Result<SessionResponse> {
        debug!("Creating session");

        let request = CreateSessionRequest {
            identifier: credentials.identifier(),
            password: credentials.password(),
            auth_factor_token: credentials.auth_factor_token(),
        };

        self.client
            .procedure(&self.pds, CREATE_SESSION, &request)
            .await
    }

    /// Exchange a refresh token for a new token pair.
    #[instrument(skip(self, refresh_token), fields(pds = %self.pds))]
    pub async fn refresh_session(&self, refresh_token: &RefreshToken) -> Result<SessionResponse> {
        debug!("Refreshing session");
        self.client
            .procedure_authed_no_body(&self.pds, REFRESH_SESSION, refresh_token.as_str())
            .await
    }

    /// Ask the PDS who an access token belongs to.
    #[instrument(skip(self, access_token), fields(pds = %self.pds))]
    pub async fn get_session(&self, access_token: &AccessToken) -> Result<GetSessionResponse> {
        debug!("Probing session");
        self.client
            .query_authed(&self.pds, GET_SESSION, access_token.as_str())
            .await
    }

    /// Revoke the session a refresh token belongs to.
    #[instrument(skip(self, refresh_token), fields(pds = %self.pds))]
    pub async fn delete_session(&self, refresh_token: &RefreshToken) -> Result<()> {
        debug!("Deleting session");
        self.client
            .procedure_authed_no_content(&self.pds, DELETE_SESSION, refresh_token.as_str())
            .await
    }
}
