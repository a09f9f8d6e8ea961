//! DID directory trait.

use async_trait::async_trait;

use crate::Result;
use crate::identity::IdentityDocument;
use crate::types::Did;

/// A source of identity documents for one DID method.
///
/// Resolvers hold one directory per supported method and dispatch on
/// [`Did::method`]. A DID whose method has no directory is unresolvable.
#[async_trait]
pub trait DidDirectory: Send + Sync {
    /// The DID method this directory serves, e.g. `"plc"`.
    fn method(&self) -> &str;

    /// Fetch the identity document for `did`.
    ///
    /// Returns `Ok(None)` when the directory has no usable document.
    async fn fetch(&self, did: &Did) -> Result<Option<IdentityDocument>>;
}
