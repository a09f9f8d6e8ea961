//! Persisted CLI session.

pub mod storage;

pub use storage::SessionStore;
