//! Logout command implementation.

use anyhow::{Context as _, Result};
use clap::Args;

use super::Context;
use crate::output;

#[derive(Args, Debug)]
pub struct LogoutArgs {}

pub async fn run(ctx: &Context, _args: LogoutArgs) -> Result<()> {
    let store = ctx.store()?;
    let stored = store
        .load()?
        .context("No active session. Run 'atkit login' first.")?;

    let agent = ctx.agent()?;
    let mut events = agent.subscribe();
    agent.resume_session(stored.to_session()?).await;

    let remote = agent.logout(&ctx.interrupt()).await;

    // The local session is gone even if the PDS refused
    store.drain(&mut events).context("Failed to clear session")?;
    agent.shutdown();

    remote.context("Failed to revoke session on the PDS")?;

    output::success("Logged out");
    Ok(())
}
