//! Identity resolver trait.

use async_trait::async_trait;
use url::Url;

use crate::Result;
use crate::identity::IdentityDocument;
use crate::types::{AtIdentifier, Did, Handle, PdsUrl};

/// Resolves the handle → DID → document → PDS → authorization server chain.
///
/// Every hop reports a miss as `Ok(None)`. Misses are expected (unregistered
/// handles, tombstoned DIDs, servers without OAuth metadata) and callers decide
/// how to surface them. `Err` is reserved for failures that are not a plain
/// miss, such as cancellation.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// Resolve a handle to the DID it claims.
    async fn resolve_handle(&self, handle: &Handle) -> Result<Option<Did>>;

    /// Fetch the identity document for a DID.
    async fn resolve_identity_document(&self, did: &Did) -> Result<Option<IdentityDocument>>;

    /// Resolve the PDS hosting a DID's repository.
    async fn resolve_service_endpoint(&self, did: &Did) -> Result<Option<PdsUrl>> {
        Ok(self
            .resolve_identity_document(did)
            .await?
            .and_then(|doc| doc.pds_endpoint()))
    }

    /// Discover the OAuth authorization server protecting a PDS.
    async fn resolve_authorization_server(&self, service: &PdsUrl) -> Result<Option<Url>>;

    /// Resolve either identifier form to a DID.
    async fn resolve_identifier(&self, identifier: &AtIdentifier) -> Result<Option<Did>> {
        match identifier {
            AtIdentifier::Did(did) => Ok(Some(did.clone())),
            AtIdentifier::Handle(handle) => self.resolve_handle(handle).await,
        }
    }
}
