//! XRPC client implementation.
//!
//! This module provides the HTTP client for AT Protocol XRPC communication.

pub(crate) mod client;
pub(crate) mod endpoints;

pub use client::XrpcClient;
