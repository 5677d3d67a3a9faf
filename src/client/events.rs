//! Decoding of the daemon's server-sent event stream

use tracing::debug;

use crate::services::PushEvent;

/// Incremental parser for `GET /events`.
///
/// Chunks may split events (and UTF-8 sequences) anywhere; complete events
/// are only decoded once their terminating blank line has arrived. Comment
/// lines such as keep-alives are skipped.
#[derive(Debug, Default)]
pub struct EventStreamParser {
    buffer: Vec<u8>,
}

impl EventStreamParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and return every event it completed
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<PushEvent> {
        self.buffer.extend(chunk.iter().copied().filter(|&byte| byte != b'\r'));

        let mut events = Vec::new();
        while let Some(end) = find_blank_line(&self.buffer) {
            let block: Vec<u8> = self.buffer.drain(..end + 2).collect();
            if let Some(event) = decode_block(&String::from_utf8_lossy(&block)) {
                events.push(event);
            }
        }
        events
    }
}

fn find_blank_line(buffer: &[u8]) -> Option<usize> {
    buffer.windows(2).position(|pair| pair == b"\n\n")
}

fn decode_block(block: &str) -> Option<PushEvent> {
    let data: Vec<&str> = block
        .lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(|value| value.strip_prefix(' ').unwrap_or(value))
        .collect();
    if data.is_empty() {
        return None;
    }

    match serde_json::from_str(&data.join("\n")) {
        Ok(event) => Some(event),
        Err(e) => {
            debug!("Skipping undecodable push event: {}", e);
            None
        }
    }
}
