//! Whoami command implementation.

use anyhow::{Context as _, Result, bail};
use clap::Args;
use serde::Serialize;

use atkit_core::{AccessToken, RefreshToken};

use super::Context;
use crate::output;

#[derive(Args, Debug)]
pub struct WhoamiArgs {
    /// Print the session as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct Whoami {
    did: String,
    handle: Option<String>,
    pds: Option<String>,
    expires_at: Option<String>,
}

pub async fn run(ctx: &Context, args: WhoamiArgs) -> Result<()> {
    let store = ctx.store()?;
    let stored = store
        .load()?
        .context("No active session. Run 'atkit login' first.")?;

    let agent = ctx.agent()?;
    let mut events = agent.subscribe();

    let restored = agent
        .restore_session(
            &stored.did()?,
            stored.access_token.clone().map(AccessToken::new),
            RefreshToken::new(&stored.refresh_token),
            stored.pds()?,
            &ctx.interrupt(),
        )
        .await
        .context("Failed to restore session")?;

    store.drain(&mut events).context("Failed to save session")?;

    if !restored {
        bail!("Session expired. Run 'atkit login' again.");
    }

    let session = agent
        .session()
        .await
        .context("Session disappeared after restore")?;
    agent.shutdown();

    let whoami = Whoami {
        did: session.did.to_string(),
        handle: session
            .handle
            .as_ref()
            .map(|h| h.to_string())
            .or(stored.handle),
        pds: session.service.as_ref().map(|s| s.to_string()),
        expires_at: session.expires_at().map(|t| t.to_rfc3339()),
    };

    if args.json {
        return output::json(&whoami);
    }

    output::field("DID", &whoami.did);
    if let Some(handle) = &whoami.handle {
        output::field("Handle", handle);
    }
    if let Some(pds) = &whoami.pds {
        output::field("PDS", pds);
    }
    if let Some(expires_at) = &whoami.expires_at {
        output::field("Expires", expires_at);
    }

    Ok(())
}
