use std::fmt;

use serde::{Deserialize, Serialize};

/// Bearer credential for the photo API.
///
/// Wraps the raw OAuth access token. `Debug` and `Display` render the
/// masked form only, so a token cannot leak through logging.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Token(String);

impl Token {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Raw value, for `Authorization: Bearer` headers.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Masks the token for display, showing only a leading fragment.
    pub fn masked(&self) -> String {
        if self.0.len() <= 16 {
            return "***".to_string();
        }
        format!("{}...", &self.0[..12])
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Token").field(&self.masked()).finish()
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.masked())
    }
}
