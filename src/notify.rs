//! Transient, stacked user notifications.
//!
//! Every message lives for a fixed time-to-live and is then dropped by
//! [`Notifications::prune`]. Severity only changes how a message is drawn.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub severity: Severity,
    pub text: String,
}

impl Message {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            text: text.into(),
        }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Success,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub id: u64,
    pub message: Message,
    pub shown_at: Instant,
}

#[derive(Debug)]
pub struct Notifications {
    items: VecDeque<Notification>,
    ttl: Duration,
    next_id: u64,
}

impl Default for Notifications {
    fn default() -> Self {
        Self::new(Duration::from_secs(5))
    }
}

impl Notifications {
    pub fn new(ttl: Duration) -> Self {
        Self {
            items: VecDeque::new(),
            ttl,
            next_id: 0,
        }
    }

    pub fn push(&mut self, message: Message) {
        self.push_at(message, Instant::now());
    }

    pub fn push_at(&mut self, message: Message, now: Instant) {
        match message.severity {
            Severity::Error => tracing::warn!("{}", message.text),
            Severity::Info | Severity::Success => tracing::info!("{}", message.text),
        }

        self.items.push_back(Notification {
            id: self.next_id,
            message,
            shown_at: now,
        });
        self.next_id += 1;
    }

    pub fn info(&mut self, text: impl Into<String>) {
        self.push(Message::info(text));
    }

    pub fn success(&mut self, text: impl Into<String>) {
        self.push(Message::success(text));
    }

    pub fn error(&mut self, text: impl Into<String>) {
        self.push(Message::error(text));
    }

    /// Drops every notification older than the time-to-live.
    pub fn prune(&mut self, now: Instant) {
        let ttl = self.ttl;
        self.items
            .retain(|item| now.saturating_duration_since(item.shown_at) < ttl);
    }

    /// Oldest first, matching the order they stack on screen.
    pub fn iter(&self) -> impl Iterator<Item = &Notification> {
        self.items.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[cfg(test)]
    pub fn messages(&self) -> Vec<Message> {
        self.items.iter().map(|item| item.message.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notifications_stack_in_arrival_order() {
        let mut notifications = Notifications::default();
        notifications.success("a.txt uploaded successfully!");
        notifications.error("Failed to upload b.txt: duplicate name");
        notifications.info("Tutor prompt cleared. Enter a new prompt and save.");

        let severities: Vec<_> = notifications
            .iter()
            .map(|n| n.message.severity)
            .collect();
        assert_eq!(
            severities,
            vec![Severity::Success, Severity::Error, Severity::Info]
        );

        let ids: Vec<_> = notifications.iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn prune_drops_only_expired_messages() {
        let start = Instant::now();
        let mut notifications = Notifications::new(Duration::from_secs(5));
        notifications.push_at(Message::info("first"), start);
        notifications.push_at(Message::info("second"), start + Duration::from_secs(3));

        notifications.prune(start + Duration::from_secs(4));
        assert_eq!(notifications.len(), 2);

        notifications.prune(start + Duration::from_secs(5));
        assert_eq!(notifications.messages(), vec![Message::info("second")]);

        notifications.prune(start + Duration::from_secs(9));
        assert!(notifications.is_empty());
    }
}
