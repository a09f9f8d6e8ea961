//! XRPC HTTP client implementation.

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, HeaderValue};
use reqwest::{Method, RequestBuilder};
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, instrument, trace};

use atkit_core::error::{Error, InvalidInputError, ProtocolError, TransportError};
use atkit_core::types::PdsUrl;
use atkit_core::Result;

use super::endpoints::XrpcErrorResponse;

/// Default per-request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client for XRPC and well-known document requests.
///
/// The client is not bound to a server; every call names the service it
/// talks to. Cloning is cheap and shares the connection pool.
#[derive(Debug, Clone)]
pub struct XrpcClient {
    client: reqwest::Client,
}

impl XrpcClient {
    /// Create a client with the default user agent and timeout.
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("atkit/", env!("CARGO_PKG_VERSION")))
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(transport_error)?;

        Ok(Self { client })
    }

    /// Wrap an existing reqwest client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Make an unauthenticated XRPC query (GET request).
    #[instrument(skip(self, params), fields(service = %service))]
    pub async fn query<Q, R>(&self, service: &PdsUrl, method: &str, params: &Q) -> Result<R>
    where
        Q: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = service.xrpc_url(method);
        debug!(method, "XRPC query");

        let request = self.client.get(&url).query(params);
        self.send_json(Method::GET, &url, request).await
    }

    /// Make an authenticated XRPC query (GET request) without parameters.
    #[instrument(skip(self, token), fields(service = %service))]
    pub async fn query_authed<R>(&self, service: &PdsUrl, method: &str, token: &str) -> Result<R>
    where
        R: DeserializeOwned,
    {
        let url = service.xrpc_url(method);
        debug!(method, "XRPC authenticated query");

        let request = self.client.get(&url).header(AUTHORIZATION, bearer(token)?);
        self.send_json(Method::GET, &url, request).await
    }

    /// Make an unauthenticated XRPC procedure (POST request).
    #[instrument(skip(self, body), fields(service = %service))]
    pub async fn procedure<B, R>(&self, service: &PdsUrl, method: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = service.xrpc_url(method);
        debug!(method, "XRPC procedure");

        let request = self.client.post(&url).json(body);
        self.send_json(Method::POST, &url, request).await
    }

    /// Make an authenticated XRPC procedure with no request body.
    /// Used for endpoints like refreshSession that don't accept a body.
    #[instrument(skip(self, token), fields(service = %service))]
    pub async fn procedure_authed_no_body<R>(
        &self,
        service: &PdsUrl,
        method: &str,
        token: &str,
    ) -> Result<R>
    where
        R: DeserializeOwned,
    {
        let url = service.xrpc_url(method);
        debug!(method, "XRPC authenticated procedure (no body)");

        let request = self.client.post(&url).header(AUTHORIZATION, bearer(token)?);
        self.send_json(Method::POST, &url, request).await
    }

    /// Make an authenticated XRPC procedure that takes and returns nothing.
    #[instrument(skip(self, token), fields(service = %service))]
    pub async fn procedure_authed_no_content(
        &self,
        service: &PdsUrl,
        method: &str,
        token: &str,
    ) -> Result<()> {
        let url = service.xrpc_url(method);
        debug!(method, "XRPC authenticated procedure (no content)");

        let response = self
            .client
            .post(&url)
            .header(AUTHORIZATION, bearer(token)?)
            .send()
            .await
            .map_err(transport_error)?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::parse_error_response(Method::POST, &url, response)
                .await
                .into())
        }
    }

    /// Fetch a JSON document from an arbitrary URL.
    #[instrument(skip(self))]
    pub async fn get_json<R>(&self, url: &str) -> Result<R>
    where
        R: DeserializeOwned,
    {
        debug!("GET document");
        let request = self.client.get(url);
        self.send_json(Method::GET, url, request).await
    }

    /// Fetch a plain-text document from an arbitrary URL.
    #[instrument(skip(self))]
    pub async fn get_text(&self, url: &str) -> Result<String> {
        debug!("GET text");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(Self::parse_error_response(Method::GET, url, response)
                .await
                .into());
        }

        response.text().await.map_err(|e| {
            TransportError::Decode {
                uri: url.to_string(),
                message: e.to_string(),
            }
            .into()
        })
    }

    /// Send a request and decode its JSON body, or its XRPC error.
    async fn send_json<R: DeserializeOwned>(
        &self,
        method: Method,
        url: &str,
        request: RequestBuilder,
    ) -> Result<R> {
        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        trace!(status = %status, "XRPC response");

        if !status.is_success() {
            return Err(Self::parse_error_response(method, url, response)
                .await
                .into());
        }

        let decode_error = |message: String| -> Error {
            TransportError::Decode {
                uri: url.to_string(),
                message,
            }
            .into()
        };

        let body = response
            .bytes()
            .await
            .map_err(|e| decode_error(e.to_string()))?;
        serde_json::from_slice(&body).map_err(|e| decode_error(e.to_string()))
    }

    /// Parse an XRPC error response, attaching the request that produced it.
    async fn parse_error_response(
        method: Method,
        url: &str,
        response: reqwest::Response,
    ) -> ProtocolError {
        let status = response.status().as_u16();

        // Non-XRPC servers may answer with HTML or nothing at all
        let error = match response.json::<XrpcErrorResponse>().await {
            Ok(body) => ProtocolError::new(status, body.error, body.message),
            Err(_) => ProtocolError::new(status, None, None),
        };

        error.with_request(method.as_str(), url)
    }
}

/// Build a bearer authorization header that is never logged.
fn bearer(token: &str) -> Result<HeaderValue> {
    let mut value = HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|_| {
        InvalidInputError::Token {
            reason: "token contains characters not allowed in a header".to_string(),
        }
    })?;
    value.set_sensitive(true);
    Ok(value)
}

/// Map a reqwest failure onto the transport error taxonomy.
pub(crate) fn transport_error(err: reqwest::Error) -> Error {
    let err = if err.is_timeout() {
        TransportError::Timeout
    } else if err.is_connect() {
        TransportError::Connection {
            message: err.to_string(),
        }
    } else {
        TransportError::Http {
            message: err.to_string(),
        }
    };
    Error::Transport(err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_creation() {
        assert!(XrpcClient::new().is_ok());
    }

    #[test]
    fn bearer_header_is_sensitive() {
        let value = bearer("abc.def.ghi").unwrap();
        assert!(value.is_sensitive());
        assert_eq!(value.to_str().unwrap(), "Bearer abc.def.ghi");
    }

    #[test]
    fn bearer_rejects_control_characters() {
        assert!(matches!(
            bearer("abc\ndef"),
            Err(Error::InvalidInput(InvalidInputError::Token { .. }))
        ));
    }
}
