//! Shared helpers for the mock server tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{TimeDelta, Utc};
use serde_json::{Value, json};
use tokio::sync::broadcast;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use atkit_core::{PdsUrl, SessionEvent};
use atkit_xrpc::{AgentConfig, HandleStep, ResolverOptions, XrpcAgent, XrpcClient, XrpcResolver};

/// The audience a PDS at 127.0.0.1 puts in its tokens.
pub const MOCK_AUDIENCE: &str = "did:web:127.0.0.1";

/// Helper to create a PDS URL from a mock server.
pub fn mock_pds_url(server: &MockServer) -> PdsUrl {
    // For tests, we need to allow HTTP localhost
    PdsUrl::new(format!("http://127.0.0.1:{}", server.address().port())).unwrap()
}

/// Build an unsigned JWT carrying `claims`.
pub fn jwt(claims: Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"ES256K","typ":"at+jwt"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{}.{}.c2ln", header, payload)
}

/// A token for `sub` issued by the mock PDS, valid for `lifetime`.
pub fn token(sub: &str, lifetime: TimeDelta) -> String {
    jwt(json!({
        "sub": sub,
        "aud": MOCK_AUDIENCE,
        "exp": (Utc::now() + lifetime).timestamp(),
        "scope": "com.atproto.access",
    }))
}

/// A createSession / refreshSession response body.
pub fn session_body(did: &str, handle: &str, access: &str, refresh: &str) -> Value {
    json!({
        "did": did,
        "handle": handle,
        "accessJwt": access,
        "refreshJwt": refresh,
        "active": true,
    })
}

/// A PLC identity document pointing at `pds`.
pub fn plc_document(did: &str, handle: &str, pds: &str) -> Value {
    json!({
        "@context": ["https://www.w3.org/ns/did/v1"],
        "id": did,
        "alsoKnownAs": [format!("at://{}", handle)],
        "verificationMethod": [],
        "service": [{
            "id": "#atproto_pds",
            "type": "AtprotoPersonalDataServer",
            "serviceEndpoint": pds,
        }],
    })
}

/// A resolver that sends every lookup to the mock server.
pub fn mock_resolver(server: &MockServer) -> XrpcResolver {
    let options = ResolverOptions {
        plc_directory: server.uri(),
        handle_resolver: Some(server.uri()),
        handle_order: vec![HandleStep::ResolveHandleXrpc],
    };
    XrpcResolver::new(XrpcClient::new().unwrap(), options).unwrap()
}

/// An agent wired to the mock server.
pub fn mock_agent(server: &MockServer, config: AgentConfig) -> XrpcAgent {
    XrpcAgent::new(
        XrpcClient::new().unwrap(),
        Arc::new(mock_resolver(server)),
        config,
    )
}

/// Mount a createSession endpoint issuing `access` / `refresh` for `did`.
pub async fn mount_create_session(server: &MockServer, did: &str, access: &str, refresh: &str) {
    Mock::given(method("POST"))
        .and(path("/xrpc/com.atproto.server.createSession"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(session_body(did, "alice.test", access, refresh)),
        )
        .mount(server)
        .await;
}

/// Wait for the next event, failing the test after five seconds.
pub async fn next_event(events: &mut broadcast::Receiver<SessionEvent>) -> SessionEvent {
    tokio::time::timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("timed out waiting for session event")
        .expect("event channel closed")
}
