//! Composition root.
//!
//! Owns the token store and every service, wired against the resolved
//! API and OAuth hosts. Consumers hold one `Session` (typically behind an
//! `Arc`) instead of reaching for global singletons.

use std::sync::Arc;

use anyhow::{Context, Result};
use shutter_types::Token;

use crate::auth::AuthService;
use crate::client::ApiClient;
use crate::config::{self, Config};
use crate::credentials::{FileTokenStore, TokenStore};
use crate::feed::FeedService;
use crate::profile::{AvatarService, ProfileService};

/// The wired-up client core: one store, one service per concern.
pub struct Session {
    store: Arc<dyn TokenStore>,
    pub auth: AuthService,
    pub feed: FeedService,
    pub profile: ProfileService,
    pub avatar: AvatarService,
}

impl Session {
    /// Builds a session backed by the on-disk credential store, honoring
    /// the reset-login flag.
    ///
    /// # Errors
    /// Returns an error when configuration cannot be resolved or the
    /// reset wipe fails.
    pub fn bootstrap(config: &Config) -> Result<Self> {
        Self::bootstrap_with_store(config, Arc::new(FileTokenStore::new()))
    }

    /// [`Self::bootstrap`] with an injected store, for tests and
    /// alternative persistence.
    ///
    /// # Errors
    /// Returns an error when configuration cannot be resolved or the
    /// reset wipe fails.
    pub fn bootstrap_with_store(config: &Config, store: Arc<dyn TokenStore>) -> Result<Self> {
        let session = Self::with_store(config, store)?;
        if config::resolve_reset_login(config) {
            tracing::info!("reset-login requested; clearing stored session");
            session.logout()?;
        }
        Ok(session)
    }

    /// Wires all services against the given store, without bootstrap
    /// side effects.
    ///
    /// # Errors
    /// Returns an error when base URLs or application keys cannot be
    /// resolved.
    pub fn with_store(config: &Config, store: Arc<dyn TokenStore>) -> Result<Self> {
        let api = ApiClient::new(&config::resolve_api_base_url(config)?)?;
        let oauth = ApiClient::new(&config::resolve_oauth_base_url(config)?)?;

        Ok(Self {
            auth: AuthService::new(oauth, Arc::clone(&store), config)?,
            feed: FeedService::new(api.clone(), Arc::clone(&store)),
            profile: ProfileService::new(api.clone(), Arc::clone(&store)),
            avatar: AvatarService::new(api, Arc::clone(&store)),
            store,
        })
    }

    /// Whether a token is stored. Store read failures count as not
    /// authorized.
    pub fn is_authorized(&self) -> bool {
        matches!(self.store.token(), Ok(Some(_)))
    }

    /// The stored token, if any.
    pub fn current_token(&self) -> Option<Token> {
        self.store.token().ok().flatten()
    }

    /// Drops the stored token and every cached fetch result. The feed
    /// broadcasts its now-empty list; profile and avatar just forget.
    ///
    /// # Errors
    /// Returns an error when the stored token cannot be removed; caches
    /// are not touched in that case.
    pub fn logout(&self) -> Result<()> {
        self.store
            .clear()
            .context("Failed to clear stored credentials")?;
        self.profile.clear();
        self.avatar.clear();
        self.feed.clear();
        tracing::info!("logged out");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::MemoryTokenStore;

    fn test_config() -> Config {
        Config {
            access_key: Some("ak_test".to_string()),
            secret_key: Some("sk_test".to_string()),
            api_base_url: Some("http://localhost:9".to_string()),
            oauth_base_url: Some("http://localhost:9".to_string()),
            ..Default::default()
        }
    }

    /// Test: authorization state mirrors the store contents.
    #[test]
    fn test_is_authorized() {
        let store = Arc::new(MemoryTokenStore::with_token(Token::new("secret-token-1")));
        let session = Session::with_store(&test_config(), store).unwrap();
        assert!(session.is_authorized());
        assert_eq!(
            session.current_token().unwrap().as_str(),
            "secret-token-1"
        );

        session.logout().unwrap();
        assert!(!session.is_authorized());
        assert_eq!(session.current_token(), None);
    }

    /// Test: the reset-login flag wipes the stored token at bootstrap.
    #[test]
    fn test_bootstrap_reset_login() {
        let store = Arc::new(MemoryTokenStore::with_token(Token::new("secret-token-1")));
        let config = Config {
            reset_login: true,
            ..test_config()
        };

        let session = Session::bootstrap_with_store(&config, store).unwrap();
        assert!(!session.is_authorized());
    }

    /// Test: logout empties the feed and tells subscribers.
    #[tokio::test]
    async fn test_logout_clears_feed() {
        let store = Arc::new(MemoryTokenStore::with_token(Token::new("secret-token-1")));
        let session = Session::with_store(&test_config(), store).unwrap();
        let mut feed_rx = session.feed.subscribe();

        session.logout().unwrap();

        let event = feed_rx.recv().await.unwrap();
        assert!(event.photos.is_empty());
        assert_eq!(session.feed.cursor(), 0);
    }
}
