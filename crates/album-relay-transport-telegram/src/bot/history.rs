//! Recent history of the source chat.
//!
//! The Bot API cannot read chat history, so every message observed in the
//! source chat is kept here, bounded to the most recent ones.

use album_relay_core::message::Message;
use std::collections::VecDeque;

/// Bounded buffer of the most recently observed messages.
#[derive(Debug)]
pub struct RecentHistory {
    messages: VecDeque<Message>,
    capacity: usize,
}

impl RecentHistory {
    /// Creates an empty buffer keeping at most `capacity` messages (minimum 1).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            messages: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Records `msg`, replacing an earlier copy with the same identifier.
    pub fn record(&mut self, msg: Message) {
        if let Some(existing) = self.messages.iter_mut().find(|m| m.id == msg.id) {
            *existing = msg;
            return;
        }
        self.messages.push_back(msg);
        while self.messages.len() > self.capacity {
            self.messages.pop_front();
        }
    }

    /// Up to `limit` messages, newest first.
    #[must_use]
    pub fn recent(&self, limit: usize) -> Vec<Message> {
        let mut recent: Vec<Message> = self.messages.iter().cloned().collect();
        recent.sort_by(|a, b| b.id.cmp(&a.id));
        recent.truncate(limit);
        recent
    }

    /// Number of buffered messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns `true` if nothing was recorded yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use album_relay_core::message::MessageId;

    fn msg(id: i64, text: &str) -> Message {
        Message {
            id: MessageId(id),
            outbound: false,
            group_id: None,
            text: Some(text.to_string()),
            media: None,
        }
    }

    #[test]
    fn test_recent_is_newest_first() {
        let mut history = RecentHistory::new(10);
        for id in [3, 1, 2] {
            history.record(msg(id, "x"));
        }
        let ids: Vec<i64> = history.recent(10).iter().map(|m| m.id.0).collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }

    #[test]
    fn test_limit_and_capacity() {
        let mut history = RecentHistory::new(3);
        for id in 1..=5 {
            history.record(msg(id, "x"));
        }
        assert_eq!(history.len(), 3);
        let ids: Vec<i64> = history.recent(2).iter().map(|m| m.id.0).collect();
        assert_eq!(ids, vec![5, 4]);
    }

    #[test]
    fn test_record_replaces_same_id() {
        let mut history = RecentHistory::new(3);
        history.record(msg(1, "old"));
        history.record(msg(1, "new"));
        assert_eq!(history.len(), 1);
        assert_eq!(history.recent(1)[0].text.as_deref(), Some("new"));
    }
}
