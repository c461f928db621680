//! Bearer-token storage and retrieval.
//!
//! Stores the token in `<base>/credentials.json` with restricted permissions
//! (0600). Tokens are never logged or displayed in full.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use shutter_types::Token;

use crate::config::paths;
use crate::error::{ApiError, ApiResult};

/// Seam for bearer-token persistence. The production store is file-backed;
/// tests and embedders can supply their own (e.g. [`MemoryTokenStore`] or a
/// platform keychain wrapper).
pub trait TokenStore: Send + Sync {
    /// Returns the stored token, if any.
    ///
    /// # Errors
    /// Returns an error if the backing store cannot be read.
    fn token(&self) -> Result<Option<Token>>;

    /// Persists the token, replacing any previous value.
    ///
    /// # Errors
    /// Returns an error if the backing store cannot be written.
    fn store(&self, token: &Token) -> Result<()>;

    /// Removes the stored token. Clearing an empty store is not an error.
    ///
    /// # Errors
    /// Returns an error if the backing store cannot be written.
    fn clear(&self) -> Result<()>;
}

/// Reads the token a service call requires, mapping absence and store
/// failures to `InvalidRequest`: without a token no authenticated request
/// can be built.
pub fn require_token(store: &dyn TokenStore) -> ApiResult<Token> {
    match store.token() {
        Ok(Some(token)) => Ok(token),
        Ok(None) => Err(ApiError::InvalidRequest(
            "no stored token; authorize first".to_string(),
        )),
        Err(err) => Err(ApiError::InvalidRequest(format!(
            "token store unavailable: {err:#}"
        ))),
    }
}

/// On-disk shape of the credentials file.
#[derive(Debug, Serialize, Deserialize)]
struct StoredCredentials {
    access_token: Token,
}

/// File-backed token store.
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    /// Store at the default location under the shutter home.
    pub fn new() -> Self {
        Self {
            path: paths::credentials_path(),
        }
    }

    /// Store at an explicit path.
    pub fn at(path: PathBuf) -> Self {
        Self { path }
    }
}

impl Default for FileTokenStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenStore for FileTokenStore {
    fn token(&self) -> Result<Option<Token>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read credentials from {}", self.path.display()))?;

        let creds: StoredCredentials = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse credentials from {}", self.path.display()))?;

        Ok(Some(creds.access_token))
    }

    fn store(&self, token: &Token) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let contents = serde_json::to_string_pretty(&StoredCredentials {
            access_token: token.clone(),
        })
        .context("Failed to serialize credentials")?;

        // Write with restricted permissions
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .mode(0o600)
                .open(&self.path)
                .with_context(|| format!("Failed to open {} for writing", self.path.display()))?;
            file.write_all(contents.as_bytes())
                .with_context(|| format!("Failed to write to {}", self.path.display()))?;
        }

        #[cfg(not(unix))]
        {
            fs::write(&self.path, contents)
                .with_context(|| format!("Failed to write to {}", self.path.display()))?;
        }

        tracing::debug!(token = %token, "credentials stored");
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)
                .with_context(|| format!("Failed to remove {}", self.path.display()))?;
        }
        Ok(())
    }
}

/// In-memory token store for tests and embedding.
#[derive(Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<Token>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: Token) -> Self {
        Self {
            token: Mutex::new(Some(token)),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn token(&self) -> Result<Option<Token>> {
        Ok(self.token.lock().expect("token store lock poisoned").clone())
    }

    fn store(&self, token: &Token) -> Result<()> {
        *self.token.lock().expect("token store lock poisoned") = Some(token.clone());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.token.lock().expect("token store lock poisoned") = None;
        Ok(())
    }
}
