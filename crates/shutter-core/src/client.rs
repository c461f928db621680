//! HTTP fetch client shared by every service.

use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;

use crate::error::{ApiError, ApiResult};

/// Thin wrapper around `reqwest`: builds requests against a fixed base URL
/// and turns responses into decoded values or a classified [`ApiError`].
///
/// The client holds no session state; callers attach the bearer token per
/// request via [`RequestBuilder::bearer_auth`].
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Creates a client for `base_url` (trailing slashes are trimmed).
    ///
    /// # Panics
    /// - In test builds (`#[cfg(test)]`), panics if `base_url` is a production host.
    /// - At runtime, panics if `SHUTTER_BLOCK_REAL_API=1` and `base_url` is a production host.
    ///
    /// This prevents tests from accidentally making real network requests.
    /// Point `base_url` at a mock server (e.g., wiremock) in tests.
    ///
    /// # Errors
    /// Returns `InvalidRequest` if the URL does not parse.
    pub fn new(base_url: &str) -> ApiResult<Self> {
        let base_url = base_url.trim_end_matches('/');
        url::Url::parse(base_url)
            .map_err(|err| ApiError::InvalidRequest(format!("invalid base URL {base_url}: {err}")))?;

        // Compile-time guard for unit tests
        #[cfg(test)]
        if is_production_url(base_url) {
            panic!(
                "Tests must not use the production photo API!\n\
                 Point the base URL at a mock server (e.g., wiremock).\n\
                 Found base_url: {base_url}"
            );
        }

        // Runtime guard for integration tests (set SHUTTER_BLOCK_REAL_API=1 in test harness)
        #[cfg(not(test))]
        if std::env::var("SHUTTER_BLOCK_REAL_API").is_ok_and(|v| v == "1")
            && is_production_url(base_url)
        {
            panic!(
                "SHUTTER_BLOCK_REAL_API=1 but trying to use the production photo API!\n\
                 Point the base URL at a mock server.\n\
                 Found base_url: {base_url}"
            );
        }

        Ok(Self {
            http: reqwest::Client::new(),
            base_url: base_url.to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Builds a request for `path` (absolute, starting with `/`).
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http.request(method, format!("{}{}", self.base_url, path))
    }

    pub fn get(&self, path: &str) -> RequestBuilder {
        self.request(Method::GET, path)
    }

    pub fn post(&self, path: &str) -> RequestBuilder {
        self.request(Method::POST, path)
    }

    pub fn delete(&self, path: &str) -> RequestBuilder {
        self.request(Method::DELETE, path)
    }

    /// Sends the request and decodes the JSON body into `T`.
    ///
    /// Classification order: transport failure → `Network`; non-2xx →
    /// `HttpStatus` with the raw body preserved; 2xx with an empty body →
    /// `NoData`; a body that does not match `T` → `Decode`.
    ///
    /// # Errors
    /// Returns the classified [`ApiError`].
    pub async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder) -> ApiResult<T> {
        let body = self.send(request).await?;
        if body.is_empty() {
            return Err(ApiError::NoData);
        }
        Ok(serde_json::from_str(&body)?)
    }

    /// Sends the request, requiring only a 2xx status. Any body is
    /// discarded: mutation endpoints confirm with their status alone.
    ///
    /// # Errors
    /// Returns the classified [`ApiError`].
    pub async fn fetch_empty(&self, request: RequestBuilder) -> ApiResult<()> {
        self.send(request).await.map(|_| ())
    }

    async fn send(&self, request: RequestBuilder) -> ApiResult<String> {
        let response = request.send().await?;
        let status = response.status();
        // Read best-effort: an unreadable body downgrades to empty rather
        // than masking the status classification.
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            tracing::debug!(status = status.as_u16(), "request failed");
            return Err(ApiError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        Ok(body)
    }
}

fn is_production_url(base_url: &str) -> bool {
    base_url.contains("unsplash.com")
}
