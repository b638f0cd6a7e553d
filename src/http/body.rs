//! Single-owner request body with rebuffer-on-read.
//!
//! The inbound body is a one-shot stream. Draining it replaces the stream
//! with a reference-counted buffer of the same bytes, so any later consumer
//! of the original request observes an unread body. A drain that stops at
//! the size limit puts the chunks it already pulled back in front of the
//! remaining stream.

use axum::body::Body;
use bytes::{Bytes, BytesMut};
use hyper::body::{Body as HttpBody, Frame, SizeHint};
use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};
use thiserror::Error;

/// Errors raised while draining a body.
#[derive(Debug, Error)]
pub enum DrainError {
    #[error("body exceeds {limit} bytes")]
    TooLarge { limit: usize },

    #[error("failed to read body: {0}")]
    Read(#[from] axum::Error),
}

/// Body of the original request, either still on the wire or buffered.
#[derive(Debug)]
pub enum BodySource {
    /// Not read yet.
    Stream(Body),
    /// Read once; replayable any number of times.
    Buffered(Bytes),
}

impl BodySource {
    /// Read the whole body, at most `limit` bytes.
    ///
    /// On success the source is left `Buffered` with the returned bytes. On
    /// failure it is left as a stream that still yields every byte received,
    /// followed by whatever the wire has not delivered yet.
    pub async fn drain(&mut self, limit: usize) -> Result<Bytes, DrainError> {
        let body = match self {
            BodySource::Buffered(bytes) => return Ok(bytes.clone()),
            BodySource::Stream(body) => body,
        };

        if body.size_hint().lower() > limit as u64 {
            return Err(DrainError::TooLarge { limit });
        }

        let mut chunks = VecDeque::new();
        let mut total = 0usize;
        let failure = loop {
            let frame = std::future::poll_fn(|cx| Pin::new(&mut *body).poll_frame(cx)).await;
            match frame {
                None => break None,
                Some(Ok(frame)) => {
                    // Trailers are dropped.
                    if let Ok(data) = frame.into_data() {
                        total += data.len();
                        chunks.push_back(data);
                        if total > limit {
                            break Some(DrainError::TooLarge { limit });
                        }
                    }
                }
                Some(Err(error)) => break Some(DrainError::Read(error)),
            }
        };

        if let Some(error) = failure {
            let rest = std::mem::take(body);
            *self = BodySource::Stream(Body::new(Rejoined { prefix: chunks, rest }));
            return Err(error);
        }

        let mut buffer = BytesMut::with_capacity(total);
        for chunk in &chunks {
            buffer.extend_from_slice(chunk);
        }
        let bytes = buffer.freeze();
        *self = BodySource::Buffered(bytes.clone());
        Ok(bytes)
    }

    /// A fresh stream over the buffered bytes, `None` while unread.
    pub fn replay(&self) -> Option<Body> {
        match self {
            BodySource::Buffered(bytes) => Some(Body::from(bytes.clone())),
            BodySource::Stream(_) => None,
        }
    }

    /// Buffered bytes, if the body has been read.
    pub fn buffered(&self) -> Option<&Bytes> {
        match self {
            BodySource::Buffered(bytes) => Some(bytes),
            BodySource::Stream(_) => None,
        }
    }

    /// Hand the body to a downstream consumer.
    pub fn into_body(self) -> Body {
        match self {
            BodySource::Stream(body) => body,
            BodySource::Buffered(bytes) => Body::from(bytes),
        }
    }
}

impl From<Body> for BodySource {
    fn from(body: Body) -> Self {
        BodySource::Stream(body)
    }
}

/// Chunks already pulled off a stream, followed by the rest of it.
struct Rejoined {
    prefix: VecDeque<Bytes>,
    rest: Body,
}

impl HttpBody for Rejoined {
    type Data = Bytes;
    type Error = axum::Error;

    fn poll_frame(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        if let Some(chunk) = self.prefix.pop_front() {
            return Poll::Ready(Some(Ok(Frame::data(chunk))));
        }
        Pin::new(&mut self.rest).poll_frame(cx)
    }

    fn is_end_stream(&self) -> bool {
        self.prefix.is_empty() && self.rest.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        let pending: u64 = self.prefix.iter().map(|chunk| chunk.len() as u64).sum();
        let rest = self.rest.size_hint();
        let mut hint = SizeHint::new();
        if let Some(upper) = rest.upper() {
            hint.set_upper(upper + pending);
        }
        hint.set_lower(rest.lower() + pending);
        hint
    }
}
