//! Token management module
//!
//! Supplies the bearer token for each run. A static token (config/env) or a
//! credentials file kept fresh by an external sign-in tool.

use async_trait::async_trait;
use parking_lot::Mutex;

use std::path::PathBuf;

use crate::chat::model::credentials::Credentials;

/// Tokens expiring within this many seconds count as expired
pub const EXPIRY_MARGIN_SECS: i64 = 60;

/// Source of bearer tokens
///
/// Returning `None` means the user is not signed in.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn bearer_token(&self) -> Option<String>;
}

/// Fixed token from configuration or environment
#[derive(Debug, Clone, Default)]
pub struct StaticTokenProvider {
    token: Option<String>,
}

impl StaticTokenProvider {
    /// Blank tokens count as absent
    pub fn new(token: Option<String>) -> Self {
        let token = token
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        Self { token }
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn bearer_token(&self) -> Option<String> {
        self.token.clone()
    }
}

/// Token read from a credentials file
///
/// The file is cached after the first read and re-read whenever the cached
/// token is missing or expiring.
pub struct CredentialsTokenProvider {
    path: PathBuf,
    cached: Mutex<Option<Credentials>>,
}

impl CredentialsTokenProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cached: Mutex::new(None),
        }
    }

    fn usable(credentials: &Credentials) -> Option<String> {
        if credentials.is_expiring_within(EXPIRY_MARGIN_SECS) {
            return None;
        }
        credentials.token().map(str::to_string)
    }

    /// Read the file on the blocking pool; the cache lock is not held
    async fn reload(&self) -> Option<Credentials> {
        let path = self.path.clone();
        match tokio::task::spawn_blocking(move || Credentials::load(path)).await {
            Ok(Ok(credentials)) => {
                tracing::debug!("Loaded credentials from {}", self.path.display());
                Some(credentials)
            }
            Ok(Err(e)) => {
                tracing::warn!("Failed to read credentials {}: {}", self.path.display(), e);
                None
            }
            Err(e) => {
                tracing::warn!("Credentials read task failed: {}", e);
                None
            }
        }
    }
}

#[async_trait]
impl TokenProvider for CredentialsTokenProvider {
    async fn bearer_token(&self) -> Option<String> {
        if let Some(token) = self.cached.lock().as_ref().and_then(Self::usable) {
            return Some(token);
        }

        // The external tool may have refreshed the file since the last read
        let fresh = self.reload().await?;
        let token = Self::usable(&fresh);
        if token.is_none() && fresh.token().is_some() {
            tracing::warn!("Access token in {} is expired", self.path.display());
        }
        *self.cached.lock() = Some(fresh);
        token
    }
}
