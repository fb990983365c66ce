//! Incremental server-sent event decoder.
//!
//! Bytes arrive in arbitrary chunks; events are emitted as soon as their
//! terminating blank line has been seen. Format: `event: <name>\ndata: <json>\n\n`.

use proto::RawEvent;

/// Stateful SSE line decoder
#[derive(Debug, Default)]
pub struct SseDecoder {
    /// Bytes of the current, not yet terminated line.
    buffer: Vec<u8>,
    /// Prefix of `buffer` already known to hold no `\n`.
    scanned: usize,
    event: Option<String>,
    data: Option<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one chunk and returns every event completed by it.
    ///
    /// Each byte is scanned once; consumed lines are compacted out of the
    /// buffer once per chunk.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<RawEvent> {
        self.buffer.extend_from_slice(chunk);
        let mut events = Vec::new();
        let mut start = 0;
        let mut cursor = self.scanned;
        // `\n` never occurs inside a multi-byte UTF-8 sequence, so splitting here is lossless.
        while let Some(offset) = self.buffer[cursor..].iter().position(|b| *b == b'\n') {
            let end = cursor + offset;
            let mut line = &self.buffer[start..end];
            if let Some(stripped) = line.strip_suffix(b"\r") {
                line = stripped;
            }
            let line = String::from_utf8_lossy(line).into_owned();
            if let Some(event) = self.feed_line(&line) {
                events.push(event);
            }
            start = end + 1;
            cursor = start;
        }
        self.buffer.drain(..start);
        self.scanned = self.buffer.len();
        events
    }

    /// Flushes a trailing event that was not followed by a blank line.
    pub fn finish(&mut self) -> Option<RawEvent> {
        if !self.buffer.is_empty() {
            let rest = std::mem::take(&mut self.buffer);
            self.scanned = 0;
            let line = String::from_utf8_lossy(&rest);
            let line = line.strip_suffix('\r').unwrap_or(&line).to_string();
            if let Some(event) = self.feed_line(&line) {
                return Some(event);
            }
        }
        self.dispatch()
    }

    fn feed_line(&mut self, line: &str) -> Option<RawEvent> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }
        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        match field {
            "event" => self.event = Some(value.to_string()),
            "data" => match self.data.as_mut() {
                Some(data) => {
                    data.push('\n');
                    data.push_str(value);
                }
                None => self.data = Some(value.to_string()),
            },
            // id, retry and unknown fields carry nothing the reducer uses
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<RawEvent> {
        if self.event.is_none() && self.data.is_none() {
            return None;
        }
        Some(RawEvent {
            event: self.event.take(),
            data: self.data.take(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_complete_events() {
        let mut decoder = SseDecoder::new();
        let events = decoder.push(b"event: init\ndata: {\"session_id\":\"s1\"}\n\nevent: done\ndata: {}\n\n");
        assert_eq!(
            events,
            vec![
                RawEvent::new("init", r#"{"session_id":"s1"}"#),
                RawEvent::new("done", "{}"),
            ]
        );
        assert_eq!(decoder.finish(), None);
    }

    #[test]
    fn reassembles_events_split_across_chunks() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"event: del").is_empty());
        assert!(decoder.push(b"ta\ndata: {\"v\":\"H").is_empty());
        let events = decoder.push(b"i\"}\n\n");
        assert_eq!(events, vec![RawEvent::new("delta", r#"{"v":"Hi"}"#)]);
    }

    #[test]
    fn long_line_in_tiny_chunks_and_many_lines_in_one_chunk() {
        let mut decoder = SseDecoder::new();
        let text = "x".repeat(10_000);
        let payload = format!("event: delta\ndata: {{\"v\":\"{text}\"}}\n\n");
        let mut events = Vec::new();
        for piece in payload.as_bytes().chunks(7) {
            events.extend(decoder.push(piece));
        }
        assert_eq!(events, vec![RawEvent::new("delta", format!(r#"{{"v":"{text}"}}"#))]);

        let many: String = (0..500)
            .map(|i| format!("event: delta\r\ndata: {{\"v\":\"{i}\"}}\r\n\r\n"))
            .collect();
        let events = decoder.push(many.as_bytes());
        assert_eq!(events.len(), 500);
        assert_eq!(events[499], RawEvent::new("delta", r#"{"v":"499"}"#));
        assert_eq!(decoder.finish(), None);
    }

    #[test]
    fn splits_multibyte_characters_safely() {
        let payload = "event: delta\ndata: {\"v\":\"é\"}\n\n".as_bytes();
        let split = payload.iter().position(|b| *b == 0xC3).expect("lead byte") + 1;
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(&payload[..split]).is_empty());
        let events = decoder.push(&payload[split..]);
        assert_eq!(events, vec![RawEvent::new("delta", r#"{"v":"é"}"#)]);
    }

    #[test]
    fn handles_crlf_comments_and_multiline_data() {
        let mut decoder = SseDecoder::new();
        let events = decoder.push(b": keep-alive\r\nid: 7\r\nevent: context\r\ndata:{\"a\":\r\ndata: 1}\r\n\r\n");
        assert_eq!(events, vec![RawEvent::new("context", "{\"a\":\n1}")]);
    }

    #[test]
    fn flushes_trailing_event_without_blank_line() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"event: done\ndata: {}").is_empty());
        assert_eq!(decoder.finish(), Some(RawEvent::new("done", "{}")));
        assert_eq!(decoder.finish(), None);
    }

    #[test]
    fn event_without_data_is_still_emitted() {
        let mut decoder = SseDecoder::new();
        let events = decoder.push(b"event: ping\n\n");
        assert_eq!(
            events,
            vec![RawEvent {
                event: Some("ping".to_string()),
                data: None
            }]
        );
    }
}
