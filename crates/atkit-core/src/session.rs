//! Session state and configuration checks.

use bitflags::bitflags;
use chrono::{DateTime, Utc};

use crate::tokens::{AccessToken, RefreshToken};
use crate::types::{Did, Handle, PdsUrl};

bitflags! {
    /// Reasons a session cannot perform an operation.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SessionConfigurationError: u8 {
        /// There is no session at all.
        const NULL_SESSION = 1;
        /// The session has no DID.
        const MISSING_DID = 1 << 1;
        /// The session has no service endpoint.
        const MISSING_SERVICE = 1 << 2;
        /// The session has no access token.
        const MISSING_ACCESS_TOKEN = 1 << 3;
        /// The session has no refresh token.
        const MISSING_REFRESH_TOKEN = 1 << 4;
    }
}

impl SessionConfigurationError {
    /// Requirements of logout.
    pub const LOGOUT: Self = Self::MISSING_SERVICE.union(Self::MISSING_REFRESH_TOKEN);

    /// Returns the flags in `required` that `session` fails to meet.
    ///
    /// A [`SessionData`] always carries a DID, so `MISSING_DID` is never
    /// reported for a present session.
    pub fn missing_from(session: Option<&SessionData>, required: Self) -> Self {
        match session {
            None => Self::NULL_SESSION,
            Some(session) => session.missing() & required,
        }
    }
}

/// An authenticated session.
///
/// Token values are redacted from `Debug` output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionData {
    /// The account DID.
    pub did: Did,
    /// The account handle, as last reported by the PDS.
    pub handle: Option<Handle>,
    /// The PDS hosting the account.
    pub service: Option<PdsUrl>,
    pub access_token: Option<AccessToken>,
    pub refresh_token: Option<RefreshToken>,
}

impl SessionData {
    /// Create a session with a full set of tokens.
    pub fn new(
        did: Did,
        handle: Option<Handle>,
        service: PdsUrl,
        access_token: AccessToken,
        refresh_token: RefreshToken,
    ) -> Self {
        Self {
            did,
            handle,
            service: Some(service),
            access_token: Some(access_token),
            refresh_token: Some(refresh_token),
        }
    }

    /// Returns the access token expiry.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.access_token.as_ref().and_then(AccessToken::expires_at)
    }

    /// Returns the set of fields this session lacks.
    pub fn missing(&self) -> SessionConfigurationError {
        let mut missing = SessionConfigurationError::empty();
        if self.service.is_none() {
            missing |= SessionConfigurationError::MISSING_SERVICE;
        }
        if self.access_token.is_none() {
            missing |= SessionConfigurationError::MISSING_ACCESS_TOKEN;
        }
        if self.refresh_token.is_none() {
            missing |= SessionConfigurationError::MISSING_REFRESH_TOKEN;
        }
        missing
    }
}
