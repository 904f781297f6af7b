//! Incremental decoder for the agent's `data: {json}` event stream.

use serde_json::Value;

use dc_base::constants::{DONE_SENTINEL, EVENT_PREFIX};
use dc_base::types::StreamEvent;

/// Splits arbitrary byte chunks into lines and decodes each `data: ` line.
///
/// Splitting happens on raw bytes, so multi-byte characters cut across chunk
/// boundaries are reassembled before UTF-8 decoding.
#[derive(Debug, Default)]
pub struct EventDecoder {
    buffer: Vec<u8>,
    malformed: usize,
}

impl EventDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk; returns every event completed by it, in order.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<StreamEvent> {
        self.buffer.extend_from_slice(chunk);
        let mut events = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if let Some(event) = self.decode_line(&line[..line.len() - 1]) {
                events.push(event);
            }
        }
        events
    }

    /// Flush a trailing line that was not newline-terminated.
    pub fn finish(&mut self) -> Vec<StreamEvent> {
        if self.buffer.is_empty() {
            return Vec::new();
        }
        let line = std::mem::take(&mut self.buffer);
        self.decode_line(&line).into_iter().collect()
    }

    /// Number of records skipped because they could not be decoded.
    pub fn malformed_count(&self) -> usize {
        self.malformed
    }

    fn decode_line(&mut self, raw: &[u8]) -> Option<StreamEvent> {
        let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
        let line = String::from_utf8_lossy(raw);
        let payload = line.strip_prefix(EVENT_PREFIX)?.trim();
        if payload.is_empty() {
            return None;
        }
        if payload == DONE_SENTINEL {
            return Some(StreamEvent::Done { elapsed: None });
        }

        let value: Value = match serde_json::from_str(payload) {
            Ok(v) => v,
            Err(e) => {
                self.malformed += 1;
                tracing::warn!(error = %e, "skipping malformed stream record");
                return None;
            }
        };

        let kind = value.get("type").and_then(Value::as_str).unwrap_or_default().to_string();
        match serde_json::from_value::<StreamEvent>(value.clone()) {
            Ok(event) => Some(event),
            // The protocol-level error signal is surfaced even when its fields are off.
            Err(_) if kind == "error" => Some(StreamEvent::Error { message: error_message(&value) }),
            Err(e) => {
                self.malformed += 1;
                tracing::warn!(kind = %kind, error = %e, "skipping undecodable stream record");
                None
            }
        }
    }
}

fn error_message(value: &Value) -> String {
    match value.get("message") {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => "unknown agent error".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_across_arbitrary_chunk_boundaries() {
        let body = "data: {\"type\":\"thinking\",\"message\":\"hmm\"}\n\ndata: {\"type\":\"done\"}\n\n";
        let mut decoder = EventDecoder::new();
        let mut events = Vec::new();
        for chunk in body.as_bytes().chunks(7) {
            events.extend(decoder.push(chunk));
        }
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], StreamEvent::Thinking { ref message } if message == "hmm"));
        assert!(matches!(events[1], StreamEvent::Done { .. }));
    }

    #[test]
    fn reassembles_split_multibyte_characters() {
        let body = "data: {\"type\":\"status\",\"message\":\"불량 예측\"}\n".as_bytes();
        // Cut inside the first Hangul syllable.
        let cut = body.iter().position(|&b| b >= 0x80).unwrap() + 1;
        let mut decoder = EventDecoder::new();
        assert!(decoder.push(&body[..cut]).is_empty());
        let events = decoder.push(&body[cut..]);
        assert!(matches!(events[0], StreamEvent::Status { ref message, .. } if message == "불량 예측"));
    }

    #[test]
    fn tolerates_crlf_and_ignores_unprefixed_lines() {
        let mut decoder = EventDecoder::new();
        let events = decoder.push(b": keepalive\r\nevent: x\r\ndata: {\"type\":\"done\",\"elapsed\":1.5}\r\n");
        assert_eq!(events, vec![StreamEvent::Done { elapsed: Some(1.5) }]);
    }

    #[test]
    fn malformed_records_are_skipped_and_counted() {
        let mut decoder = EventDecoder::new();
        let events = decoder.push(b"data: {not json\ndata: {\"type\":\"thinking\",\"message\":\"ok\"}\n");
        assert_eq!(events.len(), 1);
        assert_eq!(decoder.malformed_count(), 1);
    }

    #[test]
    fn error_record_is_always_surfaced() {
        let mut decoder = EventDecoder::new();
        let events = decoder.push(b"data: {\"type\":\"error\",\"message\":{\"code\":500}}\ndata: {\"type\":\"error\"}\n");
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], StreamEvent::Error { ref message } if message.contains("500")));
        assert!(matches!(events[1], StreamEvent::Error { .. }));
    }

    #[test]
    fn done_sentinel_decodes_as_done() {
        let mut decoder = EventDecoder::new();
        assert_eq!(decoder.push(b"data: [DONE]\n"), vec![StreamEvent::Done { elapsed: None }]);
    }

    #[test]
    fn finish_flushes_unterminated_line() {
        let mut decoder = EventDecoder::new();
        assert!(decoder.push(b"data: {\"type\":\"done\"}").is_empty());
        assert_eq!(decoder.finish().len(), 1);
        assert!(decoder.finish().is_empty());
    }
}
