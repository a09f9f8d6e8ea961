//! Login credentials type.

use std::fmt;

/// Login credentials for AT Protocol authentication.
///
/// This type holds the identifier (handle, DID or email) and secret (password
/// or app password) required to authenticate with a PDS, plus an optional
/// second-factor token.
///
/// # Security
///
/// The secrets are never exposed in Debug output to prevent accidental logging.
///
/// # Example
///
/// ```
/// use atkit_core::Credentials;
///
/// let creds = Credentials::new("alice.bsky.social", "app-password-here");
/// assert_eq!(creds.identifier(), "alice.bsky.social");
/// ```
#[derive(Clone)]
pub struct Credentials {
    identifier: String,
    password: String,
    auth_factor_token: Option<String>,
}

impl Credentials {
    /// Create new credentials.
    ///
    /// # Arguments
    ///
    /// * `identifier` - A handle (e.g., "alice.bsky.social"), DID or email
    /// * `password` - The account password or an app password
    pub fn new(identifier: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            password: password.into(),
            auth_factor_token: None,
        }
    }

    /// Attach an email second-factor token.
    pub fn with_auth_factor(mut self, token: impl Into<String>) -> Self {
        self.auth_factor_token = Some(token.into());
        self
    }

    /// Returns the identifier.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Returns the password.
    ///
    /// # Security
    ///
    /// Use this only when constructing authentication requests.
    /// Never log or display this value.
    pub fn password(&self) -> &str {
        &self.password
    }

    /// Returns the second-factor token, if any.
    pub fn auth_factor_token(&self) -> Option<&str> {
        self.auth_factor_token.as_deref()
    }
}

// Intentionally hide secrets in Debug output
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("identifier", &self.identifier)
            .field("password", &"[REDACTED]")
            .field(
                "auth_factor_token",
                &self.auth_factor_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credentials_hides_secrets_in_debug() {
        let creds = Credentials::new("alice.bsky.social", "secret123").with_auth_factor("123456");
        let debug = format!("{:?}", creds);
        assert!(debug.contains("alice.bsky.social"));
        assert!(!debug.contains("secret123"));
        assert!(!debug.contains("123456"));
        assert!(debug.contains("[REDACTED]"));
    }
}
