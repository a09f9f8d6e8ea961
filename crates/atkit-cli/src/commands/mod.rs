//! Subcommand implementations.

pub mod login;
pub mod logout;
pub mod parse;
pub mod refresh_token;
pub mod resolve;
pub mod whoami;

use std::sync::Arc;

use anyhow::{Context as _, Result};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use atkit_xrpc::{AgentConfig, ResolverOptions, XrpcAgent, XrpcClient, XrpcResolver};

use crate::cli::Cli;
use crate::session::SessionStore;

/// Settings shared by every networked command.
#[derive(Debug, Clone)]
pub struct Context {
    plc_directory: String,
    handle_resolver: String,
}

impl Context {
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            plc_directory: cli.plc_directory.clone(),
            handle_resolver: cli.handle_resolver.clone(),
        }
    }

    fn resolver_options(&self) -> ResolverOptions {
        ResolverOptions {
            plc_directory: self.plc_directory.clone(),
            handle_resolver: Some(self.handle_resolver.clone()),
            ..ResolverOptions::default()
        }
    }

    /// Build an identity resolver.
    pub fn resolver(&self) -> Result<XrpcResolver> {
        let client = XrpcClient::new().context("Failed to create HTTP client")?;
        XrpcResolver::new(client, self.resolver_options()).context("Invalid resolver settings")
    }

    /// Build a session agent.
    pub fn agent(&self) -> Result<XrpcAgent> {
        let client = XrpcClient::new().context("Failed to create HTTP client")?;
        let resolver = XrpcResolver::new(client.clone(), self.resolver_options())
            .context("Invalid resolver settings")?;
        Ok(XrpcAgent::new(
            client,
            Arc::new(resolver),
            AgentConfig::default(),
        ))
    }

    /// Open the session file.
    pub fn store(&self) -> Result<SessionStore> {
        let store = SessionStore::open()?;
        debug!(path = %store.path().display(), "Session file");
        Ok(store)
    }

    /// A token cancelled when the user presses Ctrl-C.
    pub fn interrupt(&self) -> CancellationToken {
        let token = CancellationToken::new();
        let child = token.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                debug!("Interrupted");
                child.cancel();
            }
        });
        token
    }
}
