//! Identity resolution over HTTPS and XRPC.
//!
//! Handle resolution tries each configured [`HandleStep`] in order. DID
//! documents come from a [`DidDirectory`] chosen by DID method: the PLC
//! directory for `did:plc` and the identity's own host for `did:web`.
//!
//! Every miss is logged and reported as `Ok(None)`.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, instrument, warn};
use url::Url;

use atkit_core::error::InvalidInputError;
use atkit_core::identity::IdentityDocument;
use atkit_core::traits::{DidDirectory, IdentityResolver};
use atkit_core::types::{Did, Handle, PdsUrl};
use atkit_core::Result;

use crate::xrpc::XrpcClient;
use crate::xrpc::endpoints::*;

/// Default PLC directory.
pub const DEFAULT_PLC_DIRECTORY: &str = "https://plc.directory";

/// Default service answering `com.atproto.identity.resolveHandle`.
pub const DEFAULT_HANDLE_RESOLVER: &str = "https://public.api.bsky.app";

/// One way of resolving a handle to a DID.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleStep {
    /// Ask the configured resolver service via `com.atproto.identity.resolveHandle`.
    ResolveHandleXrpc,
    /// Fetch `https://<handle>/.well-known/atproto-did`.
    HttpsWellKnown,
}

/// Resolver configuration.
#[derive(Debug, Clone)]
pub struct ResolverOptions {
    /// Base URL of the PLC directory.
    pub plc_directory: String,
    /// Service used by [`HandleStep::ResolveHandleXrpc`]. The step is skipped when unset.
    pub handle_resolver: Option<String>,
    /// Handle resolution steps, tried in order.
    pub handle_order: Vec<HandleStep>,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            plc_directory: DEFAULT_PLC_DIRECTORY.to_string(),
            handle_resolver: Some(DEFAULT_HANDLE_RESOLVER.to_string()),
            handle_order: vec![HandleStep::ResolveHandleXrpc, HandleStep::HttpsWellKnown],
        }
    }
}

/// Resolves identities using HTTP(S) and XRPC.
pub struct XrpcResolver {
    client: XrpcClient,
    handle_resolver: Option<PdsUrl>,
    handle_order: Vec<HandleStep>,
    directories: Vec<Arc<dyn DidDirectory>>,
}

impl XrpcResolver {
    /// Create a resolver with PLC and web directories.
    pub fn new(client: XrpcClient, options: ResolverOptions) -> Result<Self> {
        let handle_resolver = options
            .handle_resolver
            .as_deref()
            .map(PdsUrl::new)
            .transpose()?;

        let plc = PlcDirectory::new(client.clone(), &options.plc_directory)?;
        let web = WebDirectory::new(client.clone());

        Ok(Self {
            client,
            handle_resolver,
            handle_order: options.handle_order,
            directories: vec![Arc::new(plc), Arc::new(web)],
        })
    }

    /// Register a directory, replacing any existing one for the same method.
    pub fn with_directory(mut self, directory: impl DidDirectory + 'static) -> Self {
        self.directories.retain(|d| d.method() != directory.method());
        self.directories.push(Arc::new(directory));
        self
    }

    fn directory(&self, method: &str) -> Option<&dyn DidDirectory> {
        self.directories
            .iter()
            .find(|d| d.method() == method)
            .map(|d| d.as_ref())
    }

    async fn resolve_handle_xrpc(&self, handle: &Handle) -> Option<Did> {
        let service = self.handle_resolver.as_ref()?;
        let query = ResolveHandleQuery {
            handle: handle.as_str(),
        };

        match self
            .client
            .query::<_, ResolveHandleResponse>(service, RESOLVE_HANDLE, &query)
            .await
        {
            Ok(response) => parse_did(&response.did),
            Err(e) => {
                debug!(error = %e, "resolveHandle miss");
                None
            }
        }
    }

    async fn resolve_handle_well_known(&self, handle: &Handle) -> Option<Did> {
        let url = format!(
            "https://{}/.well-known/{}",
            handle.as_str(),
            WELL_KNOWN_ATPROTO_DID
        );

        match self.client.get_text(&url).await {
            Ok(body) => parse_did(body.trim()),
            Err(e) => {
                debug!(error = %e, "well-known handle miss");
                None
            }
        }
    }
}

impl fmt::Debug for XrpcResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let methods: Vec<&str> = self.directories.iter().map(|d| d.method()).collect();
        f.debug_struct("XrpcResolver")
            .field("handle_resolver", &self.handle_resolver)
            .field("handle_order", &self.handle_order)
            .field("directories", &methods)
            .finish()
    }
}

#[async_trait]
impl IdentityResolver for XrpcResolver {
    #[instrument(skip(self), fields(%handle))]
    async fn resolve_handle(&self, handle: &Handle) -> Result<Option<Did>> {
        if handle.is_invalid_sentinel() {
            warn!("Handle is the invalid sentinel");
            return Ok(None);
        }

        for step in &self.handle_order {
            let did = match step {
                HandleStep::ResolveHandleXrpc => self.resolve_handle_xrpc(handle).await,
                HandleStep::HttpsWellKnown => self.resolve_handle_well_known(handle).await,
            };
            if let Some(did) = did {
                debug!(?step, %did, "Handle resolved");
                return Ok(Some(did));
            }
        }

        warn!("Handle could not be resolved");
        Ok(None)
    }

    #[instrument(skip(self), fields(%did))]
    async fn resolve_identity_document(&self, did: &Did) -> Result<Option<IdentityDocument>> {
        let Some(directory) = self.directory(did.method()) else {
            warn!(method = did.method(), "No directory for DID method");
            return Ok(None);
        };

        let Some(document) = directory.fetch(did).await? else {
            warn!("Identity document not found");
            return Ok(None);
        };

        if document.id != *did {
            warn!(id = %document.id, "Identity document is for a different DID");
            return Ok(None);
        }

        Ok(Some(document))
    }

    #[instrument(skip(self), fields(%service))]
    async fn resolve_authorization_server(&self, service: &PdsUrl) -> Result<Option<Url>> {
        let url = service.well_known_url(WELL_KNOWN_PROTECTED_RESOURCE);

        let metadata = match self.client.get_json::<ProtectedResourceMetadata>(&url).await {
            Ok(metadata) => metadata,
            Err(e) => {
                warn!(error = %e, "Protected resource metadata unavailable");
                return Ok(None);
            }
        };

        let server = metadata
            .authorization_servers
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .find_map(|s| Url::parse(s).ok());

        if server.is_none() {
            warn!("No usable authorization server advertised");
        }
        Ok(server)
    }
}

fn parse_did(s: &str) -> Option<Did> {
    match Did::new(s) {
        Ok(did) => Some(did),
        Err(e) => {
            debug!(error = %e, "Resolver returned an unparseable DID");
            None
        }
    }
}

/// Identity documents from a PLC directory.
#[derive(Debug, Clone)]
pub struct PlcDirectory {
    client: XrpcClient,
    base: String,
}

impl PlcDirectory {
    /// Create a directory client for the PLC service at `base`.
    pub fn new(client: XrpcClient, base: &str) -> Result<Self> {
        let url = Url::parse(base).map_err(|e| InvalidInputError::PdsUrl {
            value: base.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            base: url.as_str().trim_end_matches('/').to_string(),
        })
    }

    /// Returns the document URL for `did`.
    pub fn document_url(&self, did: &Did) -> String {
        format!("{}/{}", self.base, did)
    }
}

#[async_trait]
impl DidDirectory for PlcDirectory {
    fn method(&self) -> &str {
        "plc"
    }

    async fn fetch(&self, did: &Did) -> Result<Option<IdentityDocument>> {
        let url = self.document_url(did);
        match self.client.get_json(&url).await {
            Ok(document) => Ok(Some(document)),
            Err(e) => {
                debug!(error = %e, %url, "PLC lookup failed");
                Ok(None)
            }
        }
    }
}

/// Identity documents hosted by `did:web` identities themselves.
#[derive(Debug, Clone)]
pub struct WebDirectory {
    client: XrpcClient,
}

impl WebDirectory {
    pub fn new(client: XrpcClient) -> Self {
        Self { client }
    }

    /// Returns the document URL for a `did:web` DID.
    ///
    /// `did:web:example.com` maps to `https://example.com/.well-known/did.json`
    /// and `did:web:example.com:u:alice` to `https://example.com/u/alice/did.json`.
    /// Loopback hosts are fetched over plain HTTP.
    pub fn document_url(did: &Did) -> Option<Url> {
        if !did.is_web() {
            return None;
        }

        let mut parts = did.identifier().split(':');
        let host = parts.next()?.replace("%3A", ":").replace("%3a", ":");
        if host.is_empty() {
            return None;
        }
        let path: Vec<&str> = parts.collect();

        let hostname = host.split(':').next().unwrap_or_default();
        let scheme = if matches!(hostname, "localhost" | "127.0.0.1") {
            "http"
        } else {
            "https"
        };

        let url = if path.is_empty() {
            format!("{}://{}/.well-known/{}", scheme, host, WELL_KNOWN_DID_JSON)
        } else {
            format!(
                "{}://{}/{}/{}",
                scheme,
                host,
                path.join("/"),
                WELL_KNOWN_DID_JSON
            )
        };

        Url::parse(&url).ok()
    }
}

#[async_trait]
impl DidDirectory for WebDirectory {
    fn method(&self) -> &str {
        "web"
    }

    async fn fetch(&self, did: &Did) -> Result<Option<IdentityDocument>> {
        let Some(url) = Self::document_url(did) else {
            debug!(%did, "did:web identifier has no usable host");
            return Ok(None);
        };

        match self.client.get_json(url.as_str()).await {
            Ok(document) => Ok(Some(document)),
            Err(e) => {
                debug!(error = %e, %url, "did:web lookup failed");
                Ok(None)
            }
        }
    }
}
