//! Session storage for persisting login state.
//!
//! The store follows the agent's lifecycle events: new tokens are written
//! on `Created` and `Refreshed`, and the file is removed on `Ended`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::Receiver;
use tokio::sync::broadcast::error::TryRecvError;
use tracing::{debug, warn};

use atkit_core::{AccessToken, Did, Handle, PdsUrl, RefreshToken, SessionData, SessionEvent};

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

/// Stored session data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSession {
    pub did: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handle: Option<String>,
    pub pds: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    pub refresh_token: String,
}

impl StoredSession {
    /// Parse the stored fields into a session.
    pub fn to_session(&self) -> Result<SessionData> {
        let did = Did::new(&self.did).context("Invalid DID in session")?;
        let pds = PdsUrl::new(&self.pds).context("Invalid PDS URL in session")?;
        // A handle the PDS reported earlier but no longer validates is dropped
        let handle = self.handle.as_deref().and_then(|h| Handle::new(h).ok());

        Ok(SessionData {
            did,
            handle,
            service: Some(pds),
            access_token: self.access_token.clone().map(AccessToken::new),
            refresh_token: Some(RefreshToken::new(&self.refresh_token)),
        })
    }

    /// Returns the parsed DID.
    pub fn did(&self) -> Result<Did> {
        Did::new(&self.did).context("Invalid DID in session")
    }

    /// Returns the parsed PDS URL.
    pub fn pds(&self) -> Result<PdsUrl> {
        PdsUrl::new(&self.pds).context("Invalid PDS URL in session")
    }
}

/// The on-disk session file.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    /// Open the store in the platform data directory.
    pub fn open() -> Result<Self> {
        let dirs =
            ProjectDirs::from("", "", "atkit").context("Could not determine data directory")?;
        Ok(Self::at(dirs.data_dir().join("session.json")))
    }

    /// Use an explicit session file.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the stored session, if any.
    pub fn load(&self) -> Result<Option<StoredSession>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let json = fs::read_to_string(&self.path).context("Failed to read session file")?;
        let stored = serde_json::from_str(&json).context("Invalid session file")?;
        Ok(Some(stored))
    }

    /// Save a session to disk.
    pub fn save(&self, stored: &StoredSession) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).context("Failed to create data directory")?;
        }

        let json = serde_json::to_string_pretty(stored)?;
        fs::write(&self.path, &json).context("Failed to write session file")?;

        // Set restrictive permissions (Unix only)
        #[cfg(unix)]
        {
            let mut perms = fs::metadata(&self.path)?.permissions();
            perms.set_mode(0o600);
            fs::set_permissions(&self.path, perms)?;
        }

        debug!(path = %self.path.display(), "Session saved");
        Ok(())
    }

    /// Clear the stored session.
    pub fn clear(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path).context("Failed to remove session file")?;
            debug!(path = %self.path.display(), "Session cleared");
        }
        Ok(())
    }

    /// Apply one lifecycle event to the stored session.
    pub fn apply(&self, event: &SessionEvent) -> Result<()> {
        match event {
            SessionEvent::Created {
                did,
                service,
                handle,
                access_token,
                refresh_token,
            } => self.save(&StoredSession {
                did: did.to_string(),
                handle: handle.as_ref().map(|h| h.to_string()),
                pds: service.to_string(),
                access_token: Some(access_token.as_str().to_string()),
                refresh_token: refresh_token.as_str().to_string(),
            }),
            SessionEvent::Refreshed {
                did,
                service,
                access_token,
                refresh_token,
            } => {
                // Refreshes don't report the handle; keep the one on disk
                let handle = self
                    .load()
                    .ok()
                    .flatten()
                    .filter(|s| s.did == did.as_str())
                    .and_then(|s| s.handle);

                self.save(&StoredSession {
                    did: did.to_string(),
                    handle,
                    pds: service.to_string(),
                    access_token: Some(access_token.as_str().to_string()),
                    refresh_token: refresh_token.as_str().to_string(),
                })
            }
            SessionEvent::RefreshFailed { errors, error, .. } => {
                match error {
                    Some(error) => warn!(%error, "Session refresh failed"),
                    None => warn!(?errors, "Session refresh failed"),
                }
                Ok(())
            }
            SessionEvent::Ended { .. } => self.clear(),
        }
    }

    /// Apply every event already queued on `events`.
    pub fn drain(&self, events: &mut Receiver<SessionEvent>) -> Result<()> {
        loop {
            match events.try_recv() {
                Ok(event) => self.apply(&event)?,
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "Missed session events");
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => return Ok(()),
            }
        }
    }
}
