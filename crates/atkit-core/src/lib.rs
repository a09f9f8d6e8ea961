//! atkit-core - Core AT Protocol identity and session types.
//!
//! This crate has no I/O. It defines the validated identifier types, the
//! identity document model, session token material and its validation, and
//! the traits implemented by transport crates such as `atkit-xrpc`.

pub mod credentials;
pub mod error;
pub mod events;
pub mod identity;
pub mod session;
pub mod tokens;
pub mod traits;
pub mod types;
pub mod validation;

pub use credentials::Credentials;
pub use error::{AuthError, Error, InvalidInputError, ProtocolError, TransportError};
pub use events::SessionEvent;
pub use identity::{IdentityDocument, Service, VerificationMethod};
pub use session::{SessionConfigurationError, SessionData};
pub use tokens::{AccessToken, JwtClaims, RefreshToken};
pub use traits::{DidDirectory, IdentityResolver};
pub use types::{AtIdentifier, AtUri, Did, Handle, Nsid, PdsUrl, RecordKey};
pub use validation::{TokenRejection, TokenValidator};

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Outcome of a remote exchange that can be refused by the server.
///
/// The outer [`Result`] carries fatal errors; the inner one carries the
/// server's structured refusal (status, error code and message).
pub type Exchange<T> = std::result::Result<T, ProtocolError>;
