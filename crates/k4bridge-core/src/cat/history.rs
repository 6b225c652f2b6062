//! Command history and auto-info classification of radio responses.

use super::{parse, ParsedCommand};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

pub const DEFAULT_CAPACITY: usize = 100;
pub const DEFAULT_RECENT_WINDOW: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Sent,
    Received,
}

#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    pub text: String,
    pub direction: Direction,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseKind {
    AiUpdate,
    Response,
    TxMeterStream,
    SmeterStream,
    StatusUpdate,
    Unknown,
}

#[derive(Debug, Clone)]
pub struct ResponseReport {
    pub kind: ResponseKind,
    pub original: String,
    pub command: Option<ParsedCommand>,
    pub updates: Map<String, Value>,
}

/// Bounded FIFO of sent/received commands plus a recency map of sent text.
#[derive(Debug)]
pub struct CommandHistory {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
    recent: HashMap<String, Instant>,
    window: Duration,
}

impl Default for CommandHistory {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY, DEFAULT_RECENT_WINDOW)
    }
}

impl CommandHistory {
    pub fn new(capacity: usize, window: Duration) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            recent: HashMap::new(),
            window,
        }
    }

    pub fn record(&mut self, text: &str, direction: Direction) {
        self.record_at(text, direction, Instant::now());
    }

    pub fn record_at(&mut self, text: &str, direction: Direction, at: Instant) {
        if direction == Direction::Sent {
            self.recent.insert(text.to_string(), at);
        }
        self.entries.push_back(HistoryEntry {
            text: text.to_string(),
            direction,
            timestamp: chrono::Utc::now(),
        });
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    /// Drops expired recency entries, then checks `text`.
    pub fn was_recently_sent_at(&mut self, text: &str, now: Instant) -> bool {
        let window = self.window;
        self.recent
            .retain(|_, sent| now.saturating_duration_since(*sent) < window);
        self.recent.contains_key(text)
    }

    pub fn entries(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn handle_response(&mut self, text: &str) -> ResponseReport {
        self.handle_response_at(text, Instant::now())
    }

    /// Parses a radio response and classifies it. Unparseable text is
    /// reported as `Unknown`.
    pub fn handle_response_at(&mut self, text: &str, now: Instant) -> ResponseReport {
        let cmd = match parse(text) {
            Ok(cmd) => cmd,
            Err(_) => {
                return ResponseReport {
                    kind: ResponseKind::Unknown,
                    original: text.to_string(),
                    command: None,
                    updates: Map::new(),
                }
            }
        };

        let unsolicited =
            cmd.descriptor.ai_eligible && !self.was_recently_sent_at(&cmd.original, now);
        let kind = match cmd.code {
            "TM" => ResponseKind::TxMeterStream,
            "SM" => ResponseKind::SmeterStream,
            "IF" => ResponseKind::StatusUpdate,
            _ if unsolicited => ResponseKind::AiUpdate,
            _ => ResponseKind::Response,
        };
        ResponseReport {
            kind,
            original: text.to_string(),
            updates: cmd.ui_update(),
            command: Some(cmd),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_evicts_oldest() {
        let mut h = CommandHistory::new(3, DEFAULT_RECENT_WINDOW);
        for i in 0..5 {
            h.record(&format!("AG{i:03};"), Direction::Received);
        }
        let texts: Vec<_> = h.entries().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, vec!["AG002;", "AG003;", "AG004;"]);
    }

    #[test]
    fn entries_serialize_with_timestamp() {
        let mut h = CommandHistory::default();
        h.record("FA;", Direction::Sent);
        let entry = h.entries().next().unwrap();
        let v = serde_json::to_value(entry).unwrap();
        assert_eq!(v["text"], "FA;");
        assert_eq!(v["direction"], "sent");
        assert!(v["timestamp"].as_str().is_some_and(|t| t.contains('T')));
    }

    #[test]
    fn echo_of_sent_command_is_a_response() {
        let mut h = CommandHistory::default();
        let t0 = Instant::now();
        h.record_at("FA00014060000;", Direction::Sent, t0);
        let r = h.handle_response_at("FA00014060000;", t0 + Duration::from_millis(500));
        assert_eq!(r.kind, ResponseKind::Response);
        assert_eq!(r.updates["vfo_a_freq"], 14_060_000);
    }

    #[test]
    fn recency_expires_after_window() {
        let mut h = CommandHistory::default();
        let t0 = Instant::now();
        h.record_at("AG030;", Direction::Sent, t0);
        let r = h.handle_response_at("AG030;", t0 + Duration::from_secs(3));
        assert_eq!(r.kind, ResponseKind::AiUpdate);
    }

    #[test]
    fn non_eligible_commands_are_never_auto_info() {
        let mut h = CommandHistory::default();
        let r = h.handle_response("AI4;");
        assert_eq!(r.kind, ResponseKind::Response);
    }

    #[test]
    fn streaming_kinds() {
        let mut h = CommandHistory::default();
        assert_eq!(h.handle_response("TM1;").kind, ResponseKind::TxMeterStream);
        assert_eq!(h.handle_response("SM;").kind, ResponseKind::SmeterStream);
        assert_eq!(h.handle_response("IF;").kind, ResponseKind::StatusUpdate);
        let r = h.handle_response("XX123;");
        assert_eq!(r.kind, ResponseKind::Unknown);
        assert!(r.command.is_none());
    }
}
