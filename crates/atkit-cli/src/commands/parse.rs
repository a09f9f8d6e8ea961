//! Parse command implementation.
//!
//! Classifies a string against every identifier syntax without touching
//! the network.

use anyhow::{Result, bail};
use clap::Args;
use serde::Serialize;

use atkit_core::{AtUri, Did, Handle, Nsid, RecordKey};

use crate::output;

#[derive(Args, Debug)]
pub struct ParseArgs {
    /// The string to classify
    pub value: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum Parsed {
    Did {
        value: String,
        method: String,
    },
    Handle {
        value: String,
    },
    Nsid {
        value: String,
        authority: String,
        name: String,
    },
    RecordKey {
        value: String,
    },
    AtUri {
        value: String,
        authority: String,
        collection: Option<String>,
        rkey: Option<String>,
    },
}

fn classify(value: &str) -> Vec<Parsed> {
    let mut kinds = Vec::new();

    if let Ok(did) = Did::new(value) {
        kinds.push(Parsed::Did {
            value: did.to_string(),
            method: did.method().to_string(),
        });
    }
    if let Ok(handle) = Handle::new(value) {
        kinds.push(Parsed::Handle {
            value: handle.to_string(),
        });
    }
    if let Ok(nsid) = Nsid::new(value) {
        kinds.push(Parsed::Nsid {
            value: nsid.to_string(),
            authority: nsid.authority().to_string(),
            name: nsid.name().to_string(),
        });
    }
    if let Ok(rkey) = RecordKey::new(value) {
        kinds.push(Parsed::RecordKey {
            value: rkey.to_string(),
        });
    }
    if let Ok(uri) = AtUri::new(value) {
        kinds.push(Parsed::AtUri {
            value: uri.to_string(),
            authority: uri.authority().to_string(),
            collection: uri.collection().map(|c| c.to_string()),
            rkey: uri.rkey().map(|r| r.to_string()),
        });
    }

    kinds
}

pub fn run(args: ParseArgs) -> Result<()> {
    let kinds = classify(&args.value);
    if kinds.is_empty() {
        bail!("'{}' is not a valid AT Protocol identifier", args.value);
    }

    for kind in &kinds {
        output::json(kind)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(value: &str) -> Vec<&'static str> {
        classify(value)
            .iter()
            .map(|p| match p {
                Parsed::Did { .. } => "did",
                Parsed::Handle { .. } => "handle",
                Parsed::Nsid { .. } => "nsid",
                Parsed::RecordKey { .. } => "record_key",
                Parsed::AtUri { .. } => "at_uri",
            })
            .collect()
    }

    #[test]
    fn did_is_also_a_record_key() {
        assert_eq!(kinds("did:plc:ewvi7nxzyoun6zhxrhs64oiz"), ["did", "record_key"]);
    }

    #[test]
    fn dotted_name_is_handle_nsid_and_rkey() {
        assert_eq!(kinds("app.bsky.feed"), ["handle", "nsid", "record_key"]);
    }

    #[test]
    fn at_uri_parts_are_reported() {
        let parsed = classify("at://alice.example.com/app.bsky.feed.post/3jui7kd54zh2y");
        assert_eq!(
            parsed,
            [Parsed::AtUri {
                value: "at://alice.example.com/app.bsky.feed.post/3jui7kd54zh2y".to_string(),
                authority: "alice.example.com".to_string(),
                collection: Some("app.bsky.feed.post".to_string()),
                rkey: Some("3jui7kd54zh2y".to_string()),
            }]
        );
    }

    #[test]
    fn garbage_matches_nothing() {
        assert!(classify("not valid at all!").is_empty());
    }
}
