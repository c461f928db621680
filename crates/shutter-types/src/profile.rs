use serde::{Deserialize, Serialize};

/// Current-user identity for the profile screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub username: String,
    /// First and last name joined with a space; just the first name when
    /// the account has no last name.
    pub display_name: String,
    /// Username prefixed with `@`.
    pub login_handle: String,
    pub bio: Option<String>,
}

impl Profile {
    /// Builds the display fields from raw account data.
    pub fn from_account(
        username: impl Into<String>,
        first_name: &str,
        last_name: Option<&str>,
        bio: Option<String>,
    ) -> Self {
        let username = username.into();
        let display_name = match last_name {
            Some(last) if !last.is_empty() => format!("{first_name} {last}"),
            _ => first_name.to_string(),
        };
        let login_handle = format!("@{username}");
        Self {
            username,
            display_name,
            login_handle,
            bio,
        }
    }
}
