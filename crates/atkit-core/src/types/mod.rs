//! Core AT Protocol identifier types.
//!
//! These types enforce protocol invariants at construction time,
//! ensuring invalid states are unrepresentable.

mod at_identifier;
mod at_uri;
mod did;
mod handle;
mod nsid;
mod pds_url;
mod record_key;

pub use at_identifier::AtIdentifier;
pub use at_uri::AtUri;
pub use did::Did;
pub use handle::Handle;
pub use nsid::Nsid;
pub use pds_url::PdsUrl;
pub use record_key::RecordKey;
