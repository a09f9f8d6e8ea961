//! Shared helpers for CLI tests.

#![allow(dead_code)]

use std::path::Path;
use std::process::{Command, Output};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{TimeDelta, Utc};
use serde_json::json;

/// The audience a PDS at 127.0.0.1 puts in its tokens.
pub const MOCK_AUDIENCE: &str = "did:web:127.0.0.1";

/// Get test credentials from environment.
/// Returns None if not set, causing tests to be skipped.
pub fn get_test_credentials() -> Option<(String, String)> {
    let identifier = std::env::var("ATKIT_TEST_IDENTIFIER").ok()?;
    let password = std::env::var("ATKIT_TEST_PASSWORD").ok()?;
    Some((identifier, password))
}

/// Run the CLI with a custom HOME directory for isolated session storage.
pub fn run_cli(args: &[&str], home: &Path) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_atkit"));
    cmd.args(args);
    cmd.env("HOME", home);
    cmd.env("XDG_DATA_HOME", home.join("data"));
    cmd.env_remove("ATKIT_PDS");
    cmd.env_remove("RUST_LOG");
    cmd.output().expect("Failed to execute CLI")
}

/// Run the CLI and expect success.
pub fn run_cli_success(args: &[&str], home: &Path) -> String {
    let output = run_cli(args, home);
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        panic!("CLI command failed: {:?}\nstderr: {}", args, stderr);
    }
    String::from_utf8_lossy(&output.stdout).to_string()
}

/// Run the CLI and expect failure, returning stderr.
pub fn run_cli_failure(args: &[&str], home: &Path) -> String {
    let output = run_cli(args, home);
    if output.status.success() {
        panic!("CLI command should have failed: {:?}", args);
    }
    String::from_utf8_lossy(&output.stderr).to_string()
}

/// An unsigned token for `sub` issued by a PDS at 127.0.0.1.
pub fn token(sub: &str, lifetime: TimeDelta) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"ES256K","typ":"at+jwt"}"#);
    let claims = json!({
        "sub": sub,
        "aud": MOCK_AUDIENCE,
        "exp": (Utc::now() + lifetime).timestamp(),
        "scope": "com.atproto.access",
    });
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{}.{}.c2ln", header, payload)
}
