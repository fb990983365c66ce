//! Chat transport abstraction and the reqwest-backed event stream client.

use std::collections::VecDeque;

use async_trait::async_trait;
use futures_util::{Stream, StreamExt, stream::BoxStream};
use proto::{RawEvent, TransportError};
use tracing::debug;

use crate::request::ChatRequestBody;
use crate::sse::SseDecoder;

/// Lazy, single-pass sequence of raw events. Dropping it abandons the stream.
pub type RawEventStream = BoxStream<'static, Result<RawEvent, TransportError>>;

/// Opens one streaming chat request
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Sends `body` and yields the response as raw events.
    ///
    /// Fails before streaming begins when the request does not complete with
    /// a success status.
    async fn open_stream(&self, body: &ChatRequestBody) -> Result<RawEventStream, TransportError>;
}

/// HTTP event stream client for the chat proxy endpoint.
#[derive(Debug, Clone)]
pub struct HttpChatTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpChatTransport {
    /// Creates a transport posting to `endpoint` (e.g. `http://127.0.0.1:3000/api/chat`).
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), endpoint)
    }

    /// Creates a transport reusing an existing client.
    pub fn with_client(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ChatTransport for HttpChatTransport {
    async fn open_stream(&self, body: &ChatRequestBody) -> Result<RawEventStream, TransportError> {
        debug!(endpoint = %self.endpoint, "Opening chat event stream");
        let response = self
            .client
            .post(&self.endpoint)
            .header("accept", "text/event-stream")
            .json(body)
            .send()
            .await
            .map_err(|e| TransportError::Connection(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            debug!(status = %status.as_u16(), body = %body.chars().take(300).collect::<String>(), "Chat stream rejected");
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(decode_sse(response.bytes_stream()))
    }
}

/// Turns a byte-chunk stream into a raw event stream.
///
/// A body error is yielded once and ends the stream.
pub fn decode_sse<S, B, E>(bytes: S) -> RawEventStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    let state = (
        Box::pin(bytes),
        SseDecoder::new(),
        VecDeque::<RawEvent>::new(),
        false,
    );
    futures_util::stream::unfold(
        state,
        |(mut bytes, mut decoder, mut pending, mut exhausted)| async move {
            loop {
                if let Some(event) = pending.pop_front() {
                    return Some((Ok(event), (bytes, decoder, pending, exhausted)));
                }
                if exhausted {
                    return None;
                }
                match bytes.next().await {
                    Some(Ok(chunk)) => pending.extend(decoder.push(chunk.as_ref())),
                    Some(Err(e)) => {
                        exhausted = true;
                        let err = TransportError::Body(e.to_string());
                        return Some((Err(err), (bytes, decoder, pending, exhausted)));
                    }
                    None => {
                        exhausted = true;
                        pending.extend(decoder.finish());
                    }
                }
            }
        },
    )
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;

    #[tokio::test]
    async fn decode_sse_yields_events_then_ends() {
        let chunks: Vec<Result<&'static [u8], std::io::Error>> = vec![
            Ok(&b"event: delta\ndata: {\"v\":\"a\"}\n"[..]),
            Ok(&b"\nevent: done\ndata: {}"[..]),
        ];
        let events: Vec<_> = decode_sse(stream::iter(chunks)).collect().await;
        assert_eq!(events.len(), 2);
        assert_eq!(
            events[0].as_ref().expect("first event"),
            &RawEvent::new("delta", r#"{"v":"a"}"#)
        );
        assert_eq!(
            events[1].as_ref().expect("trailing event"),
            &RawEvent::new("done", "{}")
        );
    }

    #[tokio::test]
    async fn decode_sse_surfaces_body_error_once() {
        let chunks: Vec<Result<&'static [u8], std::io::Error>> = vec![
            Ok(&b"event: delta\ndata: {\"v\":\"a\"}\n\n"[..]),
            Err(std::io::Error::other("reset")),
            Ok(&b"event: done\ndata: {}\n\n"[..]),
        ];
        let events: Vec<_> = decode_sse(stream::iter(chunks)).collect().await;
        assert_eq!(events.len(), 2);
        assert!(events[0].is_ok());
        assert!(matches!(events[1], Err(TransportError::Body(_))));
    }

    #[test]
    fn http_transport_keeps_endpoint() {
        let transport = HttpChatTransport::new("http://127.0.0.1:3000/api/chat");
        assert_eq!(transport.endpoint(), "http://127.0.0.1:3000/api/chat");
    }
}
