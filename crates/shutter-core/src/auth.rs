//! OAuth authorization-code flow.
//!
//! Builds the authorize-page URL, extracts the code from a pasted redirect,
//! and exchanges the code for a bearer token. At most one exchange is in
//! flight: a newer call cancels the previous one, and the most recently
//! attempted code is remembered so an identical retry is rejected without a
//! network call.

use std::sync::{Arc, Mutex};

use anyhow::Result;
use serde::Deserialize;
use shutter_types::Token;
use tokio_util::sync::CancellationToken;

use crate::client::ApiClient;
use crate::config::{self, Config};
use crate::credentials::TokenStore;
use crate::error::{ApiError, ApiResult};

/// Response body of the token exchange.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Single-flight state: the last attempted code and the cancellation handle
/// of the exchange currently in flight, if any.
#[derive(Default)]
struct FlightState {
    last_code: Option<String>,
    cancel: Option<CancellationToken>,
}

/// Token exchange against the OAuth host.
pub struct AuthService {
    client: ApiClient,
    store: Arc<dyn TokenStore>,
    access_key: String,
    secret_key: String,
    redirect_uri: String,
    flight: Mutex<FlightState>,
}

impl AuthService {
    /// Creates the service, resolving application keys from config/env.
    ///
    /// # Errors
    /// Returns an error when no access or secret key is available.
    pub fn new(client: ApiClient, store: Arc<dyn TokenStore>, config: &Config) -> Result<Self> {
        Ok(Self {
            client,
            store,
            access_key: config::resolve_access_key(config)?,
            secret_key: config::resolve_secret_key(config)?,
            redirect_uri: config.redirect_uri.clone(),
            flight: Mutex::new(FlightState::default()),
        })
    }

    /// Exchanges an authorization code for a bearer token.
    ///
    /// Cache-first: an already stored token is returned without touching
    /// the network. Re-submitting the most recently attempted code fails
    /// with `DuplicateRequest` until some exchange succeeds; a different
    /// code supersedes (and cancels) any exchange still in flight.
    ///
    /// On success the token is persisted and the last-code marker cleared.
    /// A persistence failure is logged, not fatal: the token is still
    /// returned and the next launch simply re-authorizes.
    ///
    /// # Errors
    /// Returns the classified [`ApiError`]; a superseded call resolves
    /// with `Cancelled`.
    pub async fn exchange_code(&self, code: &str) -> ApiResult<Token> {
        if let Some(token) = self.stored_token() {
            tracing::debug!("token already stored; skipping exchange");
            return Ok(token);
        }

        let cancel = {
            let mut flight = self.flight.lock().expect("auth state lock poisoned");
            if flight.last_code.as_deref() == Some(code) {
                return Err(ApiError::DuplicateRequest);
            }
            if let Some(previous) = flight.cancel.take() {
                previous.cancel();
            }
            flight.last_code = Some(code.to_string());
            let cancel = CancellationToken::new();
            flight.cancel = Some(cancel.clone());
            cancel
        };

        let request = self.client.post("/oauth/token").query(&[
            ("client_id", self.access_key.as_str()),
            ("client_secret", self.secret_key.as_str()),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("code", code),
            ("grant_type", "authorization_code"),
        ]);

        let result = tokio::select! {
            () = cancel.cancelled() => Err(ApiError::Cancelled),
            result = self.client.fetch::<TokenResponse>(request) => result,
        };

        match result {
            Ok(response) => {
                let token = Token::new(response.access_token);
                self.finish_flight(&cancel, true);
                if let Err(err) = self.store.store(&token) {
                    tracing::warn!("failed to persist token: {err:#}");
                } else {
                    tracing::info!(token = %token, "authorization complete");
                }
                Ok(token)
            }
            Err(err) => {
                self.finish_flight(&cancel, false);
                Err(err)
            }
        }
    }

    /// Clears single-flight state, unless this flight was superseded (a
    /// newer exchange owns the state now). Success also clears the
    /// last-code marker, re-opening retries for codes that failed earlier.
    fn finish_flight(&self, cancel: &CancellationToken, success: bool) {
        if cancel.is_cancelled() {
            return;
        }
        let mut flight = self.flight.lock().expect("auth state lock poisoned");
        flight.cancel = None;
        if success {
            flight.last_code = None;
        }
    }

    fn stored_token(&self) -> Option<Token> {
        match self.store.token() {
            Ok(token) => token,
            Err(err) => {
                tracing::warn!("failed to read token store: {err:#}");
                None
            }
        }
    }
}

/// Builds the URL of the authorize page the user must visit.
///
/// # Errors
/// Returns an error when the OAuth base URL or access key cannot be
/// resolved.
pub fn authorize_url(config: &Config) -> Result<String> {
    let base = config::resolve_oauth_base_url(config)?;
    let access_key = config::resolve_access_key(config)?;

    let params = [
        ("client_id", access_key.as_str()),
        ("redirect_uri", config.redirect_uri.as_str()),
        ("response_type", "code"),
        ("scope", config.scope.as_str()),
    ];

    let query: String = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params)
        .finish();

    Ok(format!("{base}/oauth/authorize?{query}"))
}

/// Pulls the authorization code out of a pasted redirect URL, also
/// accepting a raw query string or a bare code.
pub fn extract_code(input: &str) -> Option<String> {
    let value = input.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(url) = url::Url::parse(value) {
        return url
            .query_pairs()
            .find(|(k, _)| k == "code")
            .map(|(_, v)| v.to_string());
    }

    if value.contains("code=") {
        let params = url::form_urlencoded::parse(value.as_bytes()).collect::<Vec<_>>();
        return params
            .iter()
            .find(|(k, _)| k == "code")
            .map(|(_, v)| v.to_string());
    }

    Some(value.to_string())
}
