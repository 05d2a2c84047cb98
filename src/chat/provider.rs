//! Chat API Provider
//!
//! Core component responsible for communicating with the chat backend
//! Supports streaming and non-streaming requests

use std::pin::Pin;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Client, Response, StatusCode};
use serde_json::Value;
use uuid::Uuid;

use crate::chat::errors::ChatError;
use crate::chat::model::requests::ChatRequest;
use crate::http_client::build_client_from_config;
use crate::model::config::Config;

/// Response body as a byte stream
pub type ByteBody = Pin<Box<dyn Stream<Item = Result<Bytes, ChatError>> + Send>>;

const EVENT_STREAM: &str = "text/event-stream";
const APPLICATION_JSON: &str = "application/json";

/// Chat API Provider
#[derive(Clone)]
pub struct ChatProvider {
    client: Client,
    stream_url: String,
    chat_url: String,
}

impl ChatProvider {
    pub fn new(client: Client, stream_url: impl Into<String>, chat_url: impl Into<String>) -> Self {
        Self {
            client,
            stream_url: stream_url.into(),
            chat_url: chat_url.into(),
        }
    }

    /// Build a provider (and its HTTP client) from configuration
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let client = build_client_from_config(config)?;
        Ok(Self::new(client, config.stream_url(), config.chat_url()))
    }

    pub fn stream_url(&self) -> &str {
        &self.stream_url
    }

    pub fn chat_url(&self) -> &str {
        &self.chat_url
    }

    /// Build request headers
    fn build_headers(&self, token: &str, accept: &'static str) -> Result<HeaderMap, ChatError> {
        let mut headers = HeaderMap::new();

        headers.insert(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON));
        headers.insert(ACCEPT, HeaderValue::from_static(accept));
        headers.insert("x-request-id", HeaderValue::from_str(&Uuid::new_v4().to_string())?);

        let bearer = HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|_| {
            tracing::warn!("Access token contains characters not allowed in a header");
            ChatError::AuthUnavailable
        })?;
        headers.insert(AUTHORIZATION, bearer);

        Ok(headers)
    }

    /// Turn a non-2xx response into `ChatRequestFailed`
    async fn check_status(response: Response, url: &str) -> Result<Response, ChatError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        tracing::warn!(%status, url, "Chat request failed: {}", body);
        Err(ChatError::ChatRequestFailed { status, body })
    }

    /// Send a streaming chat request
    ///
    /// # Returns
    /// - `Ok(Some(body))` - 2xx response with a readable body
    /// - `Ok(None)` - 2xx response without a body (204 or `Content-Length: 0`)
    pub async fn open_stream(
        &self,
        token: &str,
        request: &ChatRequest,
    ) -> Result<Option<ByteBody>, ChatError> {
        let headers = self.build_headers(token, EVENT_STREAM)?;
        let response = self
            .client
            .post(&self.stream_url)
            .headers(headers)
            .json(request)
            .send()
            .await?;
        let response = Self::check_status(response, &self.stream_url).await?;

        if response.status() == StatusCode::NO_CONTENT || response.content_length() == Some(0) {
            tracing::debug!(status = %response.status(), "Streaming response has no body");
            return Ok(None);
        }

        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(ChatError::from));
        Ok(Some(Box::pin(body)))
    }

    /// Send a non-streaming chat request
    ///
    /// Returns the body as loosely-typed JSON. A body that is not JSON is
    /// returned as a JSON string so it still normalizes to text.
    pub async fn send(&self, token: &str, request: &ChatRequest) -> Result<Value, ChatError> {
        let headers = self.build_headers(token, APPLICATION_JSON)?;
        let response = self
            .client
            .post(&self.chat_url)
            .headers(headers)
            .json(request)
            .send()
            .await?;
        let response = Self::check_status(response, &self.chat_url).await?;

        let text = response.text().await?;
        match serde_json::from_str(&text) {
            Ok(value) => Ok(value),
            Err(e) => {
                tracing::debug!("Non-JSON chat response ({}), treating as text", e);
                Ok(Value::String(text))
            }
        }
    }
}
