//! `text/event-stream` framing.
//!
//! Network chunks don't line up with events, so the decoder buffers bytes
//! and only emits an event once its terminating blank line has arrived.
//! Lines end with `\r\n`, `\n` or a bare `\r`.

/// Longest unterminated line kept before the partial event is dropped.
pub const MAX_LINE_BYTES: usize = 1024 * 1024;

/// A single dispatched SSE event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    /// Event type; `message` unless the server set `event:`.
    pub event_type: String,
    /// Data lines joined with `\n`.
    pub data: String,
    pub id: Option<String>,
    /// Server reconnection hint in milliseconds.
    pub retry: Option<u64>,
}

#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    /// Last line ended in `\r` at a chunk boundary; a leading `\n` belongs to it.
    skip_lf: bool,
    event_type: Option<String>,
    data: Option<String>,
    id: Option<String>,
    retry: Option<u64>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed raw bytes; returns every event completed by them.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        let mut chunk = chunk;
        if self.skip_lf && !chunk.is_empty() {
            self.skip_lf = false;
            if chunk[0] == b'\n' {
                chunk = &chunk[1..];
            }
        }
        self.buffer.extend_from_slice(chunk);
        let mut events = Vec::new();

        while let Some(pos) = self
            .buffer
            .iter()
            .position(|b| *b == b'\n' || *b == b'\r')
        {
            let terminator = self.buffer[pos];
            let mut line: Vec<u8> = self.buffer.drain(..=pos).collect();
            line.pop();
            if terminator == b'\r' {
                match self.buffer.first() {
                    Some(b'\n') => {
                        self.buffer.remove(0);
                    }
                    Some(_) => {}
                    None => self.skip_lf = true,
                }
            }

            let line = String::from_utf8_lossy(&line);
            if let Some(event) = self.process_line(&line) {
                events.push(event);
            }
        }

        if self.buffer.len() > MAX_LINE_BYTES {
            tracing::warn!(
                buffered = self.buffer.len(),
                "SSE line exceeds {MAX_LINE_BYTES} bytes, dropping partial event"
            );
            self.buffer.clear();
            self.event_type = None;
            self.data = None;
        }

        events
    }

    /// Flush a trailing event the server never terminated.
    pub fn finish(&mut self) -> Option<SseEvent> {
        if !self.buffer.is_empty() {
            let rest = std::mem::take(&mut self.buffer);
            let line = String::from_utf8_lossy(&rest).into_owned();
            if let Some(event) = self.process_line(&line) {
                return Some(event);
            }
        }
        self.dispatch()
    }

    fn process_line(&mut self, line: &str) -> Option<SseEvent> {
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
            "event" => self.event_type = Some(value.to_string()),
            "data" => match &mut self.data {
                Some(data) => {
                    data.push('\n');
                    data.push_str(value);
                }
                None => self.data = Some(value.to_string()),
            },
            "id" => self.id = Some(value.to_string()),
            "retry" => {
                if let Ok(ms) = value.parse::<u64>() {
                    self.retry = Some(ms);
                }
            }
            _ => tracing::trace!("unknown SSE field: {field}"),
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseEvent> {
        let event_type = self.event_type.take();
        let data = self.data.take()?;
        Some(SseEvent {
            event_type: event_type
                .filter(|kind| !kind.is_empty())
                .unwrap_or_else(|| "message".to_string()),
            data,
            id: self.id.clone(),
            retry: self.retry,
        })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn decodes_single_event() {
        let mut decoder = SseDecoder::new();
        let events = decoder.push(b"data: {\"type\":\"news\"}\n\n");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, "message");
        assert_eq!(events[0].data, "{\"type\":\"news\"}");
    }

    #[test]
    fn buffers_events_split_across_chunks() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"data: {\"type\":").is_empty());
        assert!(decoder.push(b"\"videos\"}\r\n").is_empty());
        let events = decoder.push(b"\r\ndata: {\"type\":\"news\"}\n\n");
        let data: Vec<_> = events.iter().map(|e| e.data.as_str()).collect();
        assert_eq!(data, vec!["{\"type\":\"videos\"}", "{\"type\":\"news\"}"]);
    }

    #[test]
    fn joins_multiline_data_and_reads_fields() {
        let mut decoder = SseDecoder::new();
        let events = decoder.push(b": keep-alive\nevent: update\nid: 7\nretry: 3000\ndata: a\ndata: b\n\n");
        assert_eq!(
            events,
            vec![SseEvent {
                event_type: "update".to_string(),
                data: "a\nb".to_string(),
                id: Some("7".to_string()),
                retry: Some(3000),
            }]
        );
    }

    #[test]
    fn blank_lines_without_data_dispatch_nothing() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"event: ping\n\n\n").is_empty());
        // The dangling event name must not leak into the next event.
        let events = decoder.push(b"data: x\n\n");
        assert_eq!(events[0].event_type, "message");
    }

    #[test]
    fn bare_carriage_returns_end_lines() {
        let mut decoder = SseDecoder::new();
        let mut events = decoder.push(b"data: {\"type\":\"news\"}\r\r");
        events.extend(decoder.push(b"data: {\"type\":\"banners\"}\r\r"));

        let data: Vec<_> = events.iter().map(|e| e.data.as_str()).collect();
        assert_eq!(data, vec!["{\"type\":\"news\"}", "{\"type\":\"banners\"}"]);
        assert!(decoder.buffer.is_empty());
    }

    #[test]
    fn crlf_split_across_chunks_is_one_line_ending() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"data: a\r").is_empty());
        let events = decoder.push(b"\ndata: b\r\n\r\n");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "a\nb");
    }

    #[test]
    fn overlong_line_is_dropped() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"data: head\n").is_empty());
        assert!(decoder.push(&vec![b'x'; MAX_LINE_BYTES + 1]).is_empty());
        assert!(decoder.buffer.is_empty());

        // The dropped event's data does not leak into the next one.
        let events = decoder.push(b"\ndata: next\n\n");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "next");
    }

    #[test]
    fn finish_flushes_unterminated_event() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"data: tail").is_empty());
        let event = decoder.finish().expect("pending event");
        assert_eq!(event.data, "tail");
        assert!(decoder.finish().is_none());
    }
}
