use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::http_client::ProxyConfig;

/// TLS backend used by the HTTP client
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum TlsBackend {
    #[default]
    Rustls,
    NativeTls,
}

/// Client configuration
///
/// Every key is optional; a missing file means all defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Backend base URL
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Streaming chat endpoint path
    #[serde(default = "default_stream_path")]
    pub stream_path: String,

    /// Non-streaming chat endpoint path
    #[serde(default = "default_chat_path")]
    pub chat_path: String,

    #[serde(default = "default_conversation_id")]
    pub conversation_id: String,

    /// Static bearer token, used when no credentials file is given
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default)]
    pub tls_backend: TlsBackend,

    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy_url: Option<String>,

    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy_username: Option<String>,

    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy_password: Option<String>,

    /// Upper bound on undelimited stream text held by the decoder
    #[serde(default = "default_max_buffer_bytes")]
    pub max_buffer_bytes: usize,

    #[serde(skip)]
    config_path: Option<PathBuf>,
}

fn default_api_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_stream_path() -> String {
    "/api/v1/chat/stream".to_string()
}

fn default_chat_path() -> String {
    "/api/v1/chat/".to_string()
}

fn default_conversation_id() -> String {
    "default".to_string()
}

fn default_request_timeout_secs() -> u64 {
    720
}

fn default_max_buffer_bytes() -> usize {
    16 * 1024 * 1024
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            stream_path: default_stream_path(),
            chat_path: default_chat_path(),
            conversation_id: default_conversation_id(),
            access_token: None,
            request_timeout_secs: default_request_timeout_secs(),
            tls_backend: TlsBackend::default(),
            proxy_url: None,
            proxy_username: None,
            proxy_password: None,
            max_buffer_bytes: default_max_buffer_bytes(),
            config_path: None,
        }
    }
}

/// Join base URL and path with exactly one slash between them
///
/// A trailing slash on the path is kept, some backends route on it.
fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

impl Config {
    /// Get default config file path
    pub fn default_config_path() -> &'static str {
        "config.json"
    }

    /// Full URL of the streaming endpoint
    pub fn stream_url(&self) -> String {
        join_url(&self.api_base_url, &self.stream_path)
    }

    /// Full URL of the non-streaming endpoint
    pub fn chat_url(&self) -> String {
        join_url(&self.api_base_url, &self.chat_path)
    }

    /// Proxy configuration, if a proxy URL is set
    pub fn proxy(&self) -> Option<ProxyConfig> {
        self.proxy_url.as_ref().map(|url| {
            let mut proxy = ProxyConfig::new(url);
            if let (Some(username), Some(password)) = (&self.proxy_username, &self.proxy_password) {
                proxy = proxy.with_auth(username, password);
            }
            proxy
        })
    }

    /// Load config from file
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            // Config file doesn't exist, return default config
            let mut config = Self::default();
            config.config_path = Some(path.to_path_buf());
            return Ok(config);
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let mut config: Config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config.config_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Get config file path (if any)
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// Write current config back to the file it was loaded from
    pub fn save(&self) -> anyhow::Result<()> {
        let path = self
            .config_path
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("Config file path unknown, cannot save config"))?;

        let content = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content).with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }
}
