// src/history.rs

use std::collections::{HashMap, VecDeque};

use crate::models::Message;

/// Reserved conversation target for broadcast messages.
pub const GLOBAL_TARGET: &str = "global";

/// Backend for per-target message logs.
///
/// The relay only ever appends and pages; a durable store can implement this
/// without touching the routing code.
pub trait HistoryStore: Send {
    /// Push `message` onto the log of `target`, evicting the oldest entries past the cap.
    fn append(&mut self, target: &str, message: Message);

    /// Up to `window` messages ending `offset` messages before the newest, oldest first.
    fn page(&self, target: &str, offset: usize, window: usize) -> Vec<Message>;

    fn len(&self, target: &str) -> usize;

    /// Whether file and reaction payloads should be stored alongside text.
    fn supports_binary_payload(&self) -> bool;
}

/// In-memory history: one capped `VecDeque` per target.
pub struct MemoryHistory {
    logs: HashMap<String, VecDeque<Message>>,
    capacity: usize,
    binary_payloads: bool,
}

impl MemoryHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            logs: HashMap::new(),
            capacity,
            binary_payloads: false,
        }
    }

    pub fn with_binary_payloads(mut self, enabled: bool) -> Self {
        self.binary_payloads = enabled;
        self
    }
}

impl HistoryStore for MemoryHistory {
    fn append(&mut self, target: &str, message: Message) {
        let log = self.logs.entry(target.to_string()).or_default();
        log.push_back(message);
        while log.len() > self.capacity {
            log.pop_front();
        }
    }

    fn page(&self, target: &str, offset: usize, window: usize) -> Vec<Message> {
        let Some(log) = self.logs.get(target) else {
            return Vec::new();
        };
        let end = log.len().saturating_sub(offset);
        let start = end.saturating_sub(window);
        log.range(start..end).cloned().collect()
    }

    fn len(&self, target: &str) -> usize {
        self.logs.get(target).map_or(0, VecDeque::len)
    }

    fn supports_binary_payload(&self) -> bool {
        self.binary_payloads
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::*;
    use crate::models::Payload;

    fn text(n: usize) -> Message {
        Message {
            id: Uuid::new_v4(),
            sender: "alice".into(),
            receiver: None,
            room: None,
            payload: Payload::Text {
                text: format!("message {n}"),
            },
            timestamp: Utc::now(),
        }
    }

    fn texts(page: &[Message]) -> Vec<String> {
        page.iter()
            .map(|m| match &m.payload {
                Payload::Text { text } => text.clone(),
                other => panic!("unexpected payload {other:?}"),
            })
            .collect()
    }

    #[test]
    fn evicts_oldest_past_capacity() {
        let mut history = MemoryHistory::new(100);
        for n in 1..=101 {
            history.append(GLOBAL_TARGET, text(n));
        }
        assert_eq!(history.len(GLOBAL_TARGET), 100);
        let page = history.page(GLOBAL_TARGET, 99, 20);
        assert_eq!(texts(&page), vec!["message 2"]);
    }

    #[test]
    fn page_is_a_window_ending_offset_from_newest() {
        let mut history = MemoryHistory::new(100);
        for n in 1..=50 {
            history.append("room", text(n));
        }
        let page = history.page("room", 10, 20);
        let expected: Vec<String> = (21..=40).map(|n| format!("message {n}")).collect();
        assert_eq!(texts(&page), expected);

        let newest = history.page("room", 0, 20);
        assert_eq!(texts(&newest).last().map(String::as_str), Some("message 50"));
    }

    #[test]
    fn short_logs_and_large_offsets() {
        let mut history = MemoryHistory::new(100);
        for n in 1..=5 {
            history.append("a-b", text(n));
        }
        assert_eq!(history.page("a-b", 0, 20).len(), 5);
        assert_eq!(texts(&history.page("a-b", 3, 20)), vec!["message 1", "message 2"]);
        assert!(history.page("a-b", 5, 20).is_empty());
        assert!(history.page("a-b", 500, 20).is_empty());
        assert!(history.page("nobody", 0, 20).is_empty());
    }

    #[test]
    fn binary_payload_flag_defaults_off() {
        assert!(!MemoryHistory::new(10).supports_binary_payload());
        assert!(MemoryHistory::new(10).with_binary_payloads(true).supports_binary_payload());
    }
}
