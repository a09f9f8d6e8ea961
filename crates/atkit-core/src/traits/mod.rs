//! Core traits for identity resolution.

mod directory;
mod resolver;

pub use directory::DidDirectory;
pub use resolver::IdentityResolver;
