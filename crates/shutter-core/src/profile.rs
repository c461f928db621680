//! Current-user profile and avatar.
//!
//! Both come from `GET /me` but feed different screens, so they are
//! fetched and broadcast independently: the profile service carries the
//! identity fields, the avatar service just the image URL.

use std::sync::{Arc, Mutex};

use serde::Deserialize;
use shutter_types::Profile;

use crate::client::ApiClient;
use crate::credentials::{require_token, TokenStore};
use crate::error::ApiResult;
use crate::events::{EventHub, EventRx};

/// Broadcast after a successful profile fetch.
#[derive(Debug, Clone)]
pub struct ProfileChanged {
    pub profile: Profile,
}

/// Broadcast after a successful avatar fetch.
#[derive(Debug, Clone)]
pub struct AvatarChanged {
    pub url: String,
}

/// Wire shape of the identity fields of `GET /me`.
#[derive(Debug, Deserialize)]
struct ProfilePayload {
    username: String,
    #[serde(default)]
    first_name: String,
    last_name: Option<String>,
    bio: Option<String>,
}

impl ProfilePayload {
    fn into_profile(self) -> Profile {
        Profile::from_account(
            self.username,
            &self.first_name,
            self.last_name.as_deref(),
            self.bio,
        )
    }
}

/// Wire shape of the avatar fields of `GET /me`.
#[derive(Debug, Deserialize)]
struct UserPayload {
    profile_image: ProfileImagePayload,
}

#[derive(Debug, Deserialize)]
struct ProfileImagePayload {
    large: String,
}

/// One-shot profile fetch with a cached result.
pub struct ProfileService {
    client: ApiClient,
    store: Arc<dyn TokenStore>,
    current: Mutex<Option<Profile>>,
    events: EventHub<ProfileChanged>,
}

impl ProfileService {
    pub fn new(client: ApiClient, store: Arc<dyn TokenStore>) -> Self {
        Self {
            client,
            store,
            current: Mutex::new(None),
            events: EventHub::new(),
        }
    }

    /// Fetches the profile of the authorized user, caches it and
    /// broadcasts the change.
    ///
    /// # Errors
    /// Returns the classified [`crate::error::ApiError`] of the fetch.
    pub async fn fetch_profile(&self) -> ApiResult<Profile> {
        let token = require_token(self.store.as_ref())?;

        let request = self.client.get("/me").bearer_auth(token.as_str());
        let payload: ProfilePayload = self.client.fetch(request).await?;
        let profile = payload.into_profile();

        *self.current.lock().expect("profile lock poisoned") = Some(profile.clone());
        tracing::debug!(username = %profile.username, "profile loaded");
        self.events.publish(ProfileChanged {
            profile: profile.clone(),
        });
        Ok(profile)
    }

    /// Last fetched profile, if any.
    pub fn current(&self) -> Option<Profile> {
        self.current.lock().expect("profile lock poisoned").clone()
    }

    pub fn clear(&self) {
        *self.current.lock().expect("profile lock poisoned") = None;
    }

    pub fn subscribe(&self) -> EventRx<ProfileChanged> {
        self.events.subscribe()
    }
}

/// One-shot avatar-URL fetch with a cached result.
pub struct AvatarService {
    client: ApiClient,
    store: Arc<dyn TokenStore>,
    current: Mutex<Option<String>>,
    events: EventHub<AvatarChanged>,
}

impl AvatarService {
    pub fn new(client: ApiClient, store: Arc<dyn TokenStore>) -> Self {
        Self {
            client,
            store,
            current: Mutex::new(None),
            events: EventHub::new(),
        }
    }

    /// Fetches the large avatar URL of the authorized user, caches it and
    /// broadcasts the change.
    ///
    /// # Errors
    /// Returns the classified [`crate::error::ApiError`] of the fetch.
    pub async fn fetch_avatar_url(&self) -> ApiResult<String> {
        let token = require_token(self.store.as_ref())?;

        let request = self.client.get("/me").bearer_auth(token.as_str());
        let payload: UserPayload = self.client.fetch(request).await?;
        let url = payload.profile_image.large;

        *self.current.lock().expect("avatar lock poisoned") = Some(url.clone());
        tracing::debug!(url = %url, "avatar loaded");
        self.events.publish(AvatarChanged { url: url.clone() });
        Ok(url)
    }

    /// Last fetched avatar URL, if any.
    pub fn current(&self) -> Option<String> {
        self.current.lock().expect("avatar lock poisoned").clone()
    }

    pub fn clear(&self) {
        *self.current.lock().expect("avatar lock poisoned") = None;
    }

    pub fn subscribe(&self) -> EventRx<AvatarChanged> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Test: `/me` identity fields map onto the domain profile.
    #[test]
    fn test_profile_payload_mapping() {
        let payload: ProfilePayload = serde_json::from_str(
            r#"{
                "username": "jmuller",
                "first_name": "Jana",
                "last_name": "Muller",
                "bio": "shoots film",
                "total_likes": 4,
                "profile_image": {"large": "https://img.example/u/jmuller"}
            }"#,
        )
        .unwrap();

        let profile = payload.into_profile();
        assert_eq!(profile.username, "jmuller");
        assert_eq!(profile.display_name, "Jana Muller");
        assert_eq!(profile.login_handle, "@jmuller");
        assert_eq!(profile.bio.as_deref(), Some("shoots film"));
    }

    /// Test: the avatar payload digs the large image URL out of the
    /// nested object.
    #[test]
    fn test_user_payload_mapping() {
        let payload: UserPayload = serde_json::from_str(
            r#"{
                "username": "jmuller",
                "profile_image": {
                    "small": "https://img.example/u/jmuller-s",
                    "medium": "https://img.example/u/jmuller-m",
                    "large": "https://img.example/u/jmuller-l"
                }
            }"#,
        )
        .unwrap();

        assert_eq!(payload.profile_image.large, "https://img.example/u/jmuller-l");
    }
}
