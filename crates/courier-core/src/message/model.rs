//! Message model types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::account::AccountId;
use crate::ids::{MessageId, ThreadId};

/// A message as submitted by a client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Message {
    /// Message being replied to; `None` starts a new thread.
    pub parent_id: Option<MessageId>,
    /// Requested delivery time; `None` means deliver now.
    pub scheduled_at: Option<DateTime<Utc>>,
    /// Sender address.
    pub sender_email: String,
    /// Recipient addresses, in the order given.
    pub recipients: Vec<String>,
    /// Subject line.
    pub subject: String,
    /// Opaque body bytes.
    pub body: Vec<u8>,
}

impl Message {
    /// Creates an immediate, thread-starting message.
    #[must_use]
    pub fn new<I, S>(sender_email: impl Into<String>, recipients: I, subject: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            sender_email: sender_email.into(),
            recipients: recipients.into_iter().map(Into::into).collect(),
            subject: subject.into(),
            ..Self::default()
        }
    }

    /// Sets the body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Marks this message as a reply to `parent`.
    #[must_use]
    pub const fn in_reply_to(mut self, parent: MessageId) -> Self {
        self.parent_id = Some(parent);
        self
    }

    /// Requests delivery at `at`.
    #[must_use]
    pub const fn scheduled_for(mut self, at: DateTime<Utc>) -> Self {
        self.scheduled_at = Some(at);
        self
    }
}

/// An accepted message with its system-assigned metadata.
///
/// Written once when dispatched and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredMessage {
    /// Assigned message id.
    pub id: MessageId,
    /// Thread this message belongs to.
    pub thread_id: ThreadId,
    /// When the message was (or will be) delivered.
    pub sent_at: DateTime<Utc>,
    /// Account of the sender.
    pub sender_id: AccountId,
    /// The submitted content.
    pub message: Message,
}

impl StoredMessage {
    /// Subject line of the underlying message.
    #[must_use]
    pub fn subject(&self) -> &str {
        &self.message.subject
    }

    /// Sender address of the underlying message.
    #[must_use]
    pub fn sender_email(&self) -> &str {
        &self.message.sender_email
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn builder() {
        let parent = MessageId::new(3).unwrap();
        let msg = Message::new("a@x.com", ["b@x.com", "c@x.com"], "hi")
            .with_body("hello")
            .in_reply_to(parent);
        assert_eq!(msg.recipients, vec!["b@x.com", "c@x.com"]);
        assert_eq!(msg.body, b"hello");
        assert_eq!(msg.parent_id, Some(parent));
        assert!(msg.scheduled_at.is_none());
    }

    #[test]
    fn deserializes_with_missing_fields() {
        let msg: Message =
            serde_json::from_str(r#"{"sender_email":"a@x.com","recipients":["b@x.com"]}"#)
                .unwrap();
        assert!(msg.parent_id.is_none());
        assert!(msg.subject.is_empty());
    }
}
