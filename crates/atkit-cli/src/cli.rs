//! CLI argument definitions.

use clap::{Parser, Subcommand};

use atkit_xrpc::{DEFAULT_HANDLE_RESOLVER, DEFAULT_PLC_DIRECTORY};

use crate::commands::{login, logout, parse, refresh_token, resolve, whoami};

/// AT Protocol identity and session explorer.
#[derive(Parser, Debug)]
#[command(name = "atkit")]
#[command(author, version = env!("ATKIT_VERSION"), about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// PLC directory used to fetch did:plc documents
    #[arg(long, global = true, env = "ATKIT_PLC_DIRECTORY", default_value = DEFAULT_PLC_DIRECTORY)]
    pub plc_directory: String,

    /// Service answering com.atproto.identity.resolveHandle
    #[arg(long, global = true, env = "ATKIT_HANDLE_RESOLVER", default_value = DEFAULT_HANDLE_RESOLVER)]
    pub handle_resolver: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a new session (login)
    Login(login::LoginArgs),

    /// Display the stored session, restoring it first
    Whoami(whoami::WhoamiArgs),

    /// Refresh the stored session tokens
    RefreshToken(refresh_token::RefreshTokenArgs),

    /// End the stored session
    Logout(logout::LogoutArgs),

    /// Resolve a handle or DID to its DID, PDS and authorization server
    Resolve(resolve::ResolveArgs),

    /// Validate and classify an identifier offline
    Parse(parse::ParseArgs),
}
