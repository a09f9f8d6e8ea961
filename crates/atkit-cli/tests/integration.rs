//! CLI integration tests against a real PDS.
//!
//! These tests are opt-in and require environment variables to be set:
//! - ATKIT_TEST_IDENTIFIER: Test account handle or DID
//! - ATKIT_TEST_PASSWORD: Test account app password
//!
//! Tests are skipped if these variables are not set.

mod common;

use common::*;

#[test]
fn test_session_lifecycle() {
    let Some((identifier, password)) = get_test_credentials() else {
        eprintln!("Skipping test_session_lifecycle: ATKIT_TEST_IDENTIFIER/PASSWORD not set");
        return;
    };
    let home = tempfile::tempdir().unwrap();

    let stdout = run_cli_success(
        &["login", "--identifier", &identifier, "--password", &password],
        home.path(),
    );
    assert!(stdout.contains("did:"));

    let stdout = run_cli_success(&["whoami"], home.path());
    assert!(stdout.contains("DID"));

    run_cli_success(&["refresh-token"], home.path());
    run_cli_success(&["logout"], home.path());

    let stderr = run_cli_failure(&["whoami"], home.path());
    assert!(stderr.contains("No active session"), "got: {}", stderr);
}

#[test]
fn test_resolve() {
    if get_test_credentials().is_none() {
        eprintln!("Skipping test_resolve: credentials not set");
        return;
    }
    let home = tempfile::tempdir().unwrap();

    let stdout = run_cli_success(&["resolve", "atproto.com", "--json"], home.path());
    let resolution: serde_json::Value = serde_json::from_str(stdout.trim()).unwrap();
    assert!(resolution["did"].as_str().unwrap().starts_with("did:plc:"));
    assert!(resolution["pds"].as_str().is_some());
}
