//! Run orchestration
//!
//! One run is one chat turn: token, request, then decode → parse → assemble
//! over the response body, yielding a snapshot after every applied event.

use std::sync::Arc;

use futures::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;

use crate::chat::assembler::{AssemblerState, Snapshot};
use crate::chat::conversation::{ConversationMessage, extract_prompt};
use crate::chat::errors::ChatError;
use crate::chat::model::events::StreamEvent;
use crate::chat::model::requests::ChatRequest;
use crate::chat::model::response::NormalizedResponse;
use crate::chat::parser::decoder::{DEFAULT_BUFFER_CAPACITY, DEFAULT_MAX_BUFFER_SIZE};
use crate::chat::parser::{PayloadStream, StreamDecoder};
use crate::chat::provider::ChatProvider;
use crate::chat::token_manager::TokenProvider;

/// Drives chat turns against one backend
#[derive(Clone)]
pub struct ChatOrchestrator {
    provider: ChatProvider,
    tokens: Arc<dyn TokenProvider>,
    conversation_id: String,
    max_buffer_bytes: usize,
}

impl ChatOrchestrator {
    pub fn new(provider: ChatProvider, tokens: Arc<dyn TokenProvider>) -> Self {
        Self {
            provider,
            tokens,
            conversation_id: "default".to_string(),
            max_buffer_bytes: DEFAULT_MAX_BUFFER_SIZE,
        }
    }

    pub fn with_conversation_id(mut self, conversation_id: impl Into<String>) -> Self {
        self.conversation_id = conversation_id.into();
        self
    }

    pub fn with_max_buffer(mut self, max_buffer_bytes: usize) -> Self {
        self.max_buffer_bytes = max_buffer_bytes;
        self
    }

    /// Run one streaming chat turn
    ///
    /// The returned stream yields one snapshot per applied event, in arrival
    /// order. A failure is yielded once as the last item. Cancellation ends
    /// the stream without an error and drops the connection.
    pub fn run(
        &self,
        history: &[ConversationMessage],
        cancel: Option<CancellationToken>,
    ) -> impl Stream<Item = Result<Snapshot, ChatError>> + Send + 'static {
        let prompt = extract_prompt(history);
        let provider = self.provider.clone();
        let tokens = self.tokens.clone();
        let conversation_id = self.conversation_id.clone();
        let max_buffer_bytes = self.max_buffer_bytes;
        let cancel = cancel.unwrap_or_default();

        async_stream::stream! {
            if prompt.is_empty() {
                yield Ok(Snapshot::ask_for_input());
                return;
            }

            let token = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                token = tokens.bearer_token() => Some(token),
            };
            let Some(token) = token else {
                tracing::info!("Run cancelled before request");
                return;
            };
            let Some(token) = token else {
                yield Err(ChatError::AuthUnavailable);
                return;
            };

            let request = ChatRequest::new(prompt, conversation_id);
            let opened = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                opened = provider.open_stream(&token, &request) => Some(opened),
            };
            let Some(opened) = opened else {
                tracing::info!("Run cancelled before response");
                return;
            };

            let decoder = StreamDecoder::with_config(DEFAULT_BUFFER_CAPACITY, max_buffer_bytes);
            let mut payloads = match opened.and_then(|body| PayloadStream::open(body, decoder)) {
                Ok(payloads) => payloads,
                Err(e) => {
                    yield Err(e);
                    return;
                }
            };

            // Fresh per run, dropped with the stream
            let mut state = AssemblerState::new();
            let mut dropped = 0usize;

            loop {
                let next = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => None,
                    item = payloads.next() => Some(item),
                };
                let Some(item) = next else {
                    tracing::info!(
                        frames = payloads.decoder().frames_decoded(),
                        payloads = payloads.payloads_seen(),
                        events = state.events_applied(),
                        dropped,
                        buffered = payloads.decoder().buffer_len(),
                        "Run cancelled"
                    );
                    return;
                };

                match item {
                    Some(Ok(payload)) => match StreamEvent::from_payload(&payload) {
                        Some(event) => {
                            tracing::trace!(event = %event.event_type(), "Applying event");
                            state.apply(&event);
                            yield Ok(state.snapshot());
                        }
                        None => dropped += 1,
                    },
                    Some(Err(e)) => {
                        yield Err(e);
                        return;
                    }
                    None => break,
                }
            }

            tracing::info!(
                frames = payloads.decoder().frames_decoded(),
                payloads = payloads.payloads_seen(),
                events = state.events_applied(),
                dropped,
                keepalives = payloads.keepalives(),
                replacements = payloads.decoder().replacements(),
                text_chars = state.assistant_text().chars().count(),
                response_id = state.response_id().unwrap_or("-"),
                "Run completed"
            );
        }
    }

    /// Run one turn against the non-streaming endpoint
    ///
    /// Same contract as [`run`](Self::run); the normalized response is folded
    /// as a single `final` event, so at most one snapshot is yielded.
    pub fn run_once(
        &self,
        history: &[ConversationMessage],
        cancel: Option<CancellationToken>,
    ) -> impl Stream<Item = Result<Snapshot, ChatError>> + Send + 'static {
        let prompt = extract_prompt(history);
        let provider = self.provider.clone();
        let tokens = self.tokens.clone();
        let conversation_id = self.conversation_id.clone();
        let cancel = cancel.unwrap_or_default();

        async_stream::stream! {
            if prompt.is_empty() {
                yield Ok(Snapshot::ask_for_input());
                return;
            }

            let request = ChatRequest::new(prompt, conversation_id);
            let fetch = async {
                let token = tokens.bearer_token().await.ok_or(ChatError::AuthUnavailable)?;
                provider.send(&token, &request).await
            };
            let response = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                response = fetch => Some(response),
            };

            match response {
                None => tracing::info!("Run cancelled"),
                Some(Err(e)) => yield Err(e),
                Some(Ok(value)) => {
                    let normalized = NormalizedResponse::from_value(&value);
                    let mut state = AssemblerState::new();
                    state.apply(&StreamEvent::Final(normalized.into_final_event()));
                    tracing::info!(
                        tools = state.tool_order().len(),
                        response_id = state.response_id().unwrap_or("-"),
                        "Run completed"
                    );
                    yield Ok(state.snapshot());
                }
            }
        }
    }
}
