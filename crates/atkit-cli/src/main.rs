//! atkit - CLI tool for AT Protocol identity and session exploration.
//!
//! This is a thin wrapper over `atkit-xrpc`, intended for manual protocol
//! exploration and debugging. It is also the component that persists session
//! tokens between runs.

mod cli;
mod commands;
mod output;
mod session;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.json_logs);

    let ctx = commands::Context::from_cli(&cli);
    match cli.command {
        Commands::Login(args) => commands::login::run(&ctx, args).await,
        Commands::Whoami(args) => commands::whoami::run(&ctx, args).await,
        Commands::RefreshToken(args) => commands::refresh_token::run(&ctx, args).await,
        Commands::Logout(args) => commands::logout::run(&ctx, args).await,
        Commands::Resolve(args) => commands::resolve::run(&ctx, args).await,
        Commands::Parse(args) => commands::parse::run(args),
    }
}

fn init_logging(verbosity: u8, json: bool) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init();
    }
}
