//! Resolve command implementation.

use anyhow::{Context as _, Result};
use clap::Args;
use serde::Serialize;

use atkit_core::{AtIdentifier, IdentityResolver};

use super::Context;
use crate::output;

#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Handle or DID to resolve
    pub identifier: String,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct Resolution {
    did: String,
    handle: Option<String>,
    pds: Option<String>,
    authorization_server: Option<String>,
}

pub async fn run(ctx: &Context, args: ResolveArgs) -> Result<()> {
    let identifier = AtIdentifier::new(&args.identifier).context("Invalid identifier")?;
    let resolver = ctx.resolver()?;

    let did = resolver
        .resolve_identifier(&identifier)
        .await?
        .with_context(|| format!("Could not resolve handle '{}'", identifier))?;

    let document = resolver
        .resolve_identity_document(&did)
        .await?
        .with_context(|| format!("No identity document for '{}'", did))?;

    let pds = document.pds_endpoint();
    let authorization_server = match &pds {
        Some(pds) => resolver.resolve_authorization_server(pds).await?,
        None => None,
    };

    let resolution = Resolution {
        did: did.to_string(),
        handle: document.claimed_handle().map(|h| h.to_string()),
        pds: pds.map(|p| p.to_string()),
        authorization_server: authorization_server.map(|u| u.to_string()),
    };

    if args.json {
        return output::json(&resolution);
    }

    output::field("DID", &resolution.did);
    if let Some(handle) = &resolution.handle {
        output::field("Handle", handle);
    }
    output::field("PDS", resolution.pds.as_deref().unwrap_or("(none)"));
    output::field(
        "Authorization server",
        resolution.authorization_server.as_deref().unwrap_or("(none)"),
    );

    Ok(())
}
