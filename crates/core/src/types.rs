use std::fmt;

use crate::error::CoreError;

/// Per-request credential for the remote profile service.
///
/// Supplied by the caller on every request and never persisted. The
/// `Debug` impl redacts the token so it cannot leak through logs.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    access_token: String,
}

impl Credentials {
    /// Wrap an access token, rejecting blank values.
    pub fn new(access_token: impl Into<String>) -> Result<Self, CoreError> {
        let access_token = access_token.into().trim().to_string();
        if access_token.is_empty() {
            return Err(CoreError::Validation(
                "Access token must not be empty".to_string(),
            ));
        }
        Ok(Self { access_token })
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_token", &"<redacted>")
            .finish()
    }
}
