//! Payload stream
//!
//! Wraps a byte stream with a [`StreamDecoder`], yielding payload strings in
//! arrival order.

use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::Stream;

use super::decoder::StreamDecoder;
use crate::chat::errors::ChatError;

/// Lazy, finite, non-restartable sequence of payload strings
pub struct PayloadStream<S> {
    inner: S,
    decoder: StreamDecoder,
    pending: VecDeque<String>,
    payloads_seen: usize,
    keepalives: usize,
    finished: bool,
}

impl<S> PayloadStream<S> {
    /// Open a payload stream over a response body
    ///
    /// Fails with `StreamUnavailable` when there is no readable body at all.
    pub fn open(body: Option<S>, decoder: StreamDecoder) -> Result<Self, ChatError> {
        let inner = body.ok_or(ChatError::StreamUnavailable)?;
        Ok(Self {
            inner,
            decoder,
            pending: VecDeque::new(),
            payloads_seen: 0,
            keepalives: 0,
            finished: false,
        })
    }

    /// Decoder statistics access
    pub fn decoder(&self) -> &StreamDecoder {
        &self.decoder
    }

    /// Number of payloads handed out so far
    pub fn payloads_seen(&self) -> usize {
        self.payloads_seen
    }

    /// Number of frames that carried no payload
    pub fn keepalives(&self) -> usize {
        self.keepalives
    }
}

impl<S, E> Stream for PayloadStream<S>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    E: Into<ChatError>,
{
    type Item = Result<String, ChatError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = &mut *self;

        loop {
            // Drain payloads from frames already decoded
            if let Some(payload) = this.pending.pop_front() {
                this.payloads_seen += 1;
                return Poll::Ready(Some(Ok(payload)));
            }

            if this.finished {
                return Poll::Ready(None);
            }

            match Pin::new(&mut this.inner).poll_next(cx) {
                Poll::Ready(Some(Ok(chunk))) => {
                    if let Err(e) = this.decoder.feed(&chunk) {
                        this.finished = true;
                        return Poll::Ready(Some(Err(e.into())));
                    }
                    for frame in this.decoder.decode_iter() {
                        if frame.is_keepalive() {
                            this.keepalives += 1;
                            tracing::trace!("Keepalive frame");
                            continue;
                        }
                        this.pending
                            .extend(frame.payloads().map(str::to_string));
                    }
                }
                Poll::Ready(Some(Err(e))) => {
                    this.finished = true;
                    return Poll::Ready(Some(Err(e.into())));
                }
                Poll::Ready(None) => {
                    this.decoder.finish();
                    this.finished = true;
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
