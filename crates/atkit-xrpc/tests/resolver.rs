//! Identity resolution tests against mock directories.

mod common;

use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use atkit_core::{AtIdentifier, Did, Handle, IdentityResolver};

use common::*;

const DID: &str = "did:plc:ewvi7nxzyoun6zhxrhs64oiz";

#[tokio::test]
async fn resolves_handle_via_xrpc() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/xrpc/com.atproto.identity.resolveHandle"))
        .and(query_param("handle", "atproto.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "did": DID })))
        .expect(1)
        .mount(&server)
        .await;

    let resolver = mock_resolver(&server);
    let did = resolver
        .resolve_handle(&Handle::new("ATProto.com").unwrap())
        .await
        .unwrap();

    assert_eq!(did.unwrap().as_str(), DID);
}

#[tokio::test]
async fn unknown_handle_is_a_miss() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/xrpc/com.atproto.identity.resolveHandle"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "InvalidRequest",
            "message": "Unable to resolve handle"
        })))
        .mount(&server)
        .await;

    let resolver = mock_resolver(&server);
    let did = resolver
        .resolve_handle(&Handle::new("nobody.example.com").unwrap())
        .await
        .unwrap();

    assert!(did.is_none());
}

#[tokio::test]
async fn unparseable_did_is_a_miss() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/xrpc/com.atproto.identity.resolveHandle"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "did": "not-a-did" })))
        .mount(&server)
        .await;

    let resolver = mock_resolver(&server);
    let did = resolver
        .resolve_handle(&Handle::new("alice.example.com").unwrap())
        .await
        .unwrap();

    assert!(did.is_none());
}

#[tokio::test]
async fn invalid_handle_sentinel_is_never_looked_up() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/xrpc/com.atproto.identity.resolveHandle"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "did": DID })))
        .expect(0)
        .mount(&server)
        .await;

    let resolver = mock_resolver(&server);
    let did = resolver.resolve_handle(&Handle::invalid()).await.unwrap();
    assert!(did.is_none());
}

#[tokio::test]
async fn resolves_plc_document_and_service_endpoint() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/{}", DID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(plc_document(
            DID,
            "atproto.com",
            "https://enoki.us-east.host.bsky.network",
        )))
        .mount(&server)
        .await;

    let resolver = mock_resolver(&server);
    let did = Did::new(DID).unwrap();

    let document = resolver
        .resolve_identity_document(&did)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(document.id, did);
    assert_eq!(document.claimed_handle().unwrap().as_str(), "atproto.com");

    let pds = resolver.resolve_service_endpoint(&did).await.unwrap().unwrap();
    assert_eq!(pds.host(), Some("enoki.us-east.host.bsky.network"));
}

#[tokio::test]
async fn document_for_another_did_is_a_miss() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/{}", DID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(plc_document(
            "did:plc:someoneelse",
            "mallory.example.com",
            "https://pds.example.com",
        )))
        .mount(&server)
        .await;

    let resolver = mock_resolver(&server);
    let did = Did::new(DID).unwrap();

    assert!(resolver.resolve_identity_document(&did).await.unwrap().is_none());
    assert!(resolver.resolve_service_endpoint(&did).await.unwrap().is_none());
}

#[tokio::test]
async fn missing_document_is_a_miss() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/{}", DID)))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "message": "DID not registered"
        })))
        .mount(&server)
        .await;

    let resolver = mock_resolver(&server);
    let did = Did::new(DID).unwrap();
    assert!(resolver.resolve_identity_document(&did).await.unwrap().is_none());
}

#[tokio::test]
async fn unsupported_did_method_is_a_miss() {
    let server = MockServer::start().await;
    let resolver = mock_resolver(&server);

    let did = Did::new("did:key:zQ3shunBKsXixLxKtC5qeSG9E4J5RkGN57im31pcTzbNQnm5w").unwrap();
    assert!(resolver.resolve_identity_document(&did).await.unwrap().is_none());
}

#[tokio::test]
async fn resolves_did_web_document_from_host() {
    let server = MockServer::start().await;
    let did = format!("did:web:127.0.0.1%3A{}", server.address().port());

    Mock::given(method("GET"))
        .and(path("/.well-known/did.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(plc_document(
            &did,
            "web.example.com",
            "https://pds.example.com",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let resolver = mock_resolver(&server);
    let did = Did::new(did).unwrap();
    let pds = resolver.resolve_service_endpoint(&did).await.unwrap().unwrap();
    assert_eq!(pds.host(), Some("pds.example.com"));
}

#[tokio::test]
async fn did_identifier_resolves_without_lookup() {
    let server = MockServer::start().await;
    let resolver = mock_resolver(&server);

    let identifier = AtIdentifier::new(DID).unwrap();
    let did = resolver.resolve_identifier(&identifier).await.unwrap();
    assert_eq!(did.unwrap().as_str(), DID);
    assert!(server.received_requests().await.unwrap().is_empty());
}

// ============================================================================
// Authorization server discovery
// ============================================================================

#[tokio::test]
async fn discovers_authorization_server() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/.well-known/oauth-protected-resource"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "resource": server.uri(),
            "authorization_servers": ["", "https://bsky.social"],
            "scopes_supported": [],
            "bearer_methods_supported": ["header"]
        })))
        .mount(&server)
        .await;

    let resolver = mock_resolver(&server);
    let issuer = resolver
        .resolve_authorization_server(&mock_pds_url(&server))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(issuer.as_str(), "https://bsky.social/");
}

#[tokio::test]
async fn no_authorization_servers_is_a_miss() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/.well-known/oauth-protected-resource"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "authorization_servers": []
        })))
        .mount(&server)
        .await;

    let resolver = mock_resolver(&server);
    let issuer = resolver
        .resolve_authorization_server(&mock_pds_url(&server))
        .await
        .unwrap();
    assert!(issuer.is_none());
}

#[tokio::test]
async fn missing_metadata_is_a_miss() {
    let server = MockServer::start().await;

    let resolver = mock_resolver(&server);
    let issuer = resolver
        .resolve_authorization_server(&mock_pds_url(&server))
        .await
        .unwrap();
    assert!(issuer.is_none());
}
