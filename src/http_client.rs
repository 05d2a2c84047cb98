//! HTTP Client builder module
//!
//! One client per process, shared by the streaming and non-streaming calls

use reqwest::{Client, Proxy};
use std::time::Duration;

use crate::model::config::{Config, TlsBackend};

/// User-Agent sent with every request
pub const USER_AGENT: &str = concat!("kurious-chat/", env!("CARGO_PKG_VERSION"));

/// Connect timeout, independent of the (long) overall request timeout
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Outbound proxy shared by the streaming and non-streaming chat calls
///
/// Built from `proxyUrl` in the config file. Basic auth is attached only
/// when both `proxyUsername` and `proxyPassword` are set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProxyConfig {
    /// `http://`, `https://` or `socks5://` URL
    pub url: String,
    /// Username and password for basic auth
    pub auth: Option<(String, String)>,
}

impl ProxyConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            auth: None,
        }
    }

    pub fn with_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.auth = Some((username.into(), password.into()));
        self
    }

    /// reqwest proxy applied to every scheme
    fn to_proxy(&self) -> reqwest::Result<Proxy> {
        let proxy = Proxy::all(&self.url)?;
        Ok(match &self.auth {
            Some((username, password)) => proxy.basic_auth(username, password),
            None => proxy,
        })
    }
}

/// Build HTTP Client
///
/// `timeout_secs` bounds a whole request including the streamed body, so it
/// has to cover the longest expected assistant turn.
pub fn build_client(
    proxy: Option<&ProxyConfig>,
    timeout_secs: u64,
    tls_backend: TlsBackend,
) -> anyhow::Result<Client> {
    let mut builder = Client::builder()
        .user_agent(USER_AGENT)
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .timeout(Duration::from_secs(timeout_secs));

    if tls_backend == TlsBackend::Rustls {
        builder = builder.use_rustls_tls();
    }

    if let Some(proxy) = proxy {
        builder = builder.proxy(proxy.to_proxy()?);
        tracing::debug!("Chat requests go through proxy {}", proxy.url);
    }

    Ok(builder.build()?)
}

/// Build the client described by the configuration
pub fn build_client_from_config(config: &Config) -> anyhow::Result<Client> {
    build_client(
        config.proxy().as_ref(),
        config.request_timeout_secs,
        config.tls_backend,
    )
}
