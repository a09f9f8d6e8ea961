//! Refresh token command implementation.

use anyhow::{Context as _, Result};
use clap::Args;
use colored::Colorize;

use super::Context;
use crate::output;

#[derive(Args, Debug)]
pub struct RefreshTokenArgs {}

pub async fn run(ctx: &Context, _args: RefreshTokenArgs) -> Result<()> {
    let store = ctx.store()?;
    let stored = store
        .load()?
        .context("No active session. Run 'atkit login' first.")?;

    let agent = ctx.agent()?;
    let mut events = agent.subscribe();
    agent.resume_session(stored.to_session()?).await;

    eprintln!("{}", "Refreshing session...".dimmed());

    let outcome = agent
        .refresh_session(None, None, &ctx.interrupt())
        .await
        .context("Failed to refresh session");

    store.drain(&mut events).context("Failed to save session")?;
    agent.shutdown();

    let session = outcome?.context("Refresh refused")?;

    output::success("Session refreshed");
    println!();
    output::field("DID", session.did.as_str());
    if let Some(expires_at) = session.expires_at() {
        output::field("Expires", &expires_at.to_rfc3339());
    }

    Ok(())
}
