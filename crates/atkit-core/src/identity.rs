//! Identity (DID) documents.

use serde::{Deserialize, Serialize};

use crate::types::{Did, Handle, PdsUrl};

/// Fragment identifying the personal data server service entry.
pub const PDS_SERVICE_ID: &str = "#atproto_pds";

/// Service type of the personal data server entry.
pub const PDS_SERVICE_TYPE: &str = "AtprotoPersonalDataServer";

/// A DID document describing an account's services and keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityDocument {
    /// The DID this document describes.
    pub id: Did,

    #[serde(rename = "@context", default)]
    pub context: Vec<String>,

    /// Alternate identifiers, usually `at://<handle>`.
    #[serde(default)]
    pub also_known_as: Vec<String>,

    #[serde(rename = "verificationMethod", default)]
    pub verification_methods: Vec<VerificationMethod>,

    #[serde(rename = "service", default)]
    pub services: Vec<Service>,
}

/// A verification method entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationMethod {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub controller: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key_multibase: Option<String>,
}

/// A service entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub service_endpoint: String,
}

impl IdentityDocument {
    /// Returns the personal data server endpoint.
    ///
    /// The service entry id may be the bare `#atproto_pds` fragment or the
    /// fragment appended to the document DID. Entries whose endpoint is not a
    /// usable URL are skipped.
    pub fn pds_endpoint(&self) -> Option<PdsUrl> {
        let qualified = format!("{}{}", self.id, PDS_SERVICE_ID);
        self.services
            .iter()
            .filter(|s| s.id == PDS_SERVICE_ID || s.id == qualified)
            .find_map(|s| PdsUrl::new(&s.service_endpoint).ok())
    }

    /// Returns the first handle claimed in `alsoKnownAs`.
    ///
    /// The claim is unverified; the handle must resolve back to this DID
    /// before it can be trusted.
    pub fn claimed_handle(&self) -> Option<Handle> {
        self.also_known_as
            .iter()
            .filter_map(|aka| aka.strip_prefix("at://"))
            .find_map(|h| Handle::new(h).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn plc_document() -> serde_json::Value {
        json!({
            "@context": [
                "https://www.w3.org/ns/did/v1",
                "https://w3id.org/security/multikey/v1"
            ],
            "id": "did:plc:ewvi7nxzyoun6zhxrhs64oiz",
            "alsoKnownAs": ["at://atproto.com"],
            "verificationMethod": [{
                "id": "did:plc:ewvi7nxzyoun6zhxrhs64oiz#atproto",
                "type": "Multikey",
                "controller": "did:plc:ewvi7nxzyoun6zhxrhs64oiz",
                "publicKeyMultibase": "zQ3shunBKsXixLxKtC5qeSG9E4J5RkGN57im31pcTzbNQnm5w"
            }],
            "service": [{
                "id": "#atproto_pds",
                "type": "AtprotoPersonalDataServer",
                "serviceEndpoint": "https://enoki.us-east.host.bsky.network"
            }]
        })
    }

    #[test]
    fn parses_plc_document() {
        let doc: IdentityDocument = serde_json::from_value(plc_document()).unwrap();
        assert_eq!(doc.id.as_str(), "did:plc:ewvi7nxzyoun6zhxrhs64oiz");
        assert_eq!(doc.context.len(), 2);
        assert_eq!(doc.verification_methods[0].kind, "Multikey");
        assert_eq!(
            doc.pds_endpoint().unwrap().host(),
            Some("enoki.us-east.host.bsky.network")
        );
        assert_eq!(doc.claimed_handle().unwrap().as_str(), "atproto.com");
    }

    #[test]
    fn accepts_qualified_service_id() {
        let mut value = plc_document();
        value["service"][0]["id"] = json!("did:plc:ewvi7nxzyoun6zhxrhs64oiz#atproto_pds");
        let doc: IdentityDocument = serde_json::from_value(value).unwrap();
        assert!(doc.pds_endpoint().is_some());
    }

    #[test]
    fn ignores_other_services() {
        let mut value = plc_document();
        value["service"][0]["id"] = json!("#bsky_chat");
        let doc: IdentityDocument = serde_json::from_value(value).unwrap();
        assert!(doc.pds_endpoint().is_none());
    }

    #[test]
    fn minimal_document() {
        let doc: IdentityDocument =
            serde_json::from_value(json!({ "id": "did:web:example.com" })).unwrap();
        assert!(doc.services.is_empty());
        assert!(doc.pds_endpoint().is_none());
        assert!(doc.claimed_handle().is_none());
    }
}
