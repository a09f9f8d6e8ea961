//! Login command implementation.

use anyhow::{Context as _, Result};
use clap::Args;
use colored::Colorize;

use atkit_core::{Credentials, PdsUrl};

use super::Context;
use crate::output;

#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Handle, DID or email to authenticate with
    #[arg(long)]
    pub identifier: String,

    /// Account password or app password
    #[arg(long)]
    pub password: String,

    /// PDS base URL. Resolved from the identifier when omitted.
    #[arg(long, env = "ATKIT_PDS")]
    pub pds: Option<String>,

    /// Two-factor code sent by the PDS
    #[arg(long)]
    pub auth_factor: Option<String>,
}

pub async fn run(ctx: &Context, args: LoginArgs) -> Result<()> {
    let service = args
        .pds
        .as_deref()
        .map(PdsUrl::new)
        .transpose()
        .context("Invalid PDS URL")?;

    let mut credentials = Credentials::new(&args.identifier, &args.password);
    if let Some(token) = args.auth_factor {
        credentials = credentials.with_auth_factor(token);
    }

    let store = ctx.store()?;
    let agent = ctx.agent()?;
    let mut events = agent.subscribe();

    eprintln!("{}", "Logging in...".dimmed());

    let session = agent
        .login(&credentials, service, &ctx.interrupt())
        .await
        .context("Failed to login")?
        .context("Login refused")?;

    store.drain(&mut events).context("Failed to save session")?;
    agent.shutdown();

    output::success("Logged in successfully");
    println!();
    output::field("DID", session.did.as_str());
    if let Some(handle) = &session.handle {
        output::field("Handle", handle.as_str());
    }
    if let Some(service) = &session.service {
        output::field("PDS", service.as_str());
    }

    Ok(())
}
