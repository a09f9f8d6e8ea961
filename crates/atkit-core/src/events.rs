//! Session lifecycle events.

use crate::error::ProtocolError;
use crate::session::SessionConfigurationError;
use crate::tokens::{AccessToken, RefreshToken};
use crate::types::{Did, Handle, PdsUrl};

/// Events published by a session agent.
///
/// These are the only side channel an agent offers; subscribers typically
/// persist the new tokens or surface refresh failures to the user.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// A login installed a new session.
    Created {
        did: Did,
        service: PdsUrl,
        handle: Option<Handle>,
        access_token: AccessToken,
        refresh_token: RefreshToken,
    },

    /// The session tokens were replaced by a refresh.
    Refreshed {
        did: Did,
        service: PdsUrl,
        access_token: AccessToken,
        refresh_token: RefreshToken,
    },

    /// A refresh attempt failed. The previous tokens remain in place.
    RefreshFailed {
        errors: SessionConfigurationError,
        did: Option<Did>,
        service: Option<PdsUrl>,
        status: Option<u16>,
        error: Option<ProtocolError>,
    },

    /// The session was ended by logout.
    Ended { did: Did, service: PdsUrl },
}

impl SessionEvent {
    /// Returns the DID the event concerns, if known.
    pub fn did(&self) -> Option<&Did> {
        match self {
            SessionEvent::Created { did, .. }
            | SessionEvent::Refreshed { did, .. }
            | SessionEvent::Ended { did, .. } => Some(did),
            SessionEvent::RefreshFailed { did, .. } => did.as_ref(),
        }
    }
}
