//! UI-agnostic session data types
//!
//! These structures are shared by every front-end and carry no dependency on a
//! UI framework. Wire payloads of the document service are decoded into them
//! in [`crate::client`].

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Identifier of a transcript message, increasing in creation order
pub type MessageId = u64;

/// Who a transcript message is attributed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sender {
    User,
    Assistant,
}

impl Sender {
    pub fn label(&self) -> &'static str {
        match self {
            Sender::User => "You",
            Sender::Assistant => "AI Assistant",
        }
    }
}

/// A single entry of the chat transcript.
///
/// Only [`crate::ConversationStore`] creates messages; once created they are
/// never changed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    id: MessageId,
    content: String,
    sender: Sender,
    timestamp: DateTime<Local>,
}

impl Message {
    pub(crate) fn new(id: MessageId, content: String, sender: Sender) -> Self {
        Self {
            id,
            content,
            sender,
            timestamp: Local::now(),
        }
    }

    pub fn id(&self) -> MessageId {
        self.id
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn sender(&self) -> Sender {
        self.sender
    }

    pub fn timestamp(&self) -> DateTime<Local> {
        self.timestamp
    }
}

/// Snapshot of the document service's readiness
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerStatus {
    pub status: String,
    /// Documents are loaded and questions can be answered
    pub ready: bool,
    pub provider_connected: bool,
    pub embedding_provider: String,
}

/// The file picked for the next upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingUpload {
    pub path: PathBuf,
    pub file_name: String,
}

impl PendingUpload {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// What the service reports back after a successful upload
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UploadReceipt {
    pub filename: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sender_labels() {
        assert_eq!(Sender::User.label(), "You");
        assert_eq!(Sender::Assistant.label(), "AI Assistant");
    }

    #[test]
    fn test_message_accessors() {
        let msg = Message::new(7, "hello".to_string(), Sender::User);
        assert_eq!(msg.id(), 7);
        assert_eq!(msg.content(), "hello");
        assert_eq!(msg.sender(), Sender::User);
        assert!(msg.timestamp() <= Local::now());
    }

    #[test]
    fn test_message_serializes_with_timestamp() {
        let msg = Message::new(3, "12M".to_string(), Sender::Assistant);
        let value = serde_json::to_value(&msg).unwrap();

        assert_eq!(value["id"], 3);
        assert_eq!(value["content"], "12M");
        assert_eq!(value["sender"], "Assistant");
        let stamp = value["timestamp"].as_str().unwrap();
        assert_eq!(
            DateTime::parse_from_rfc3339(stamp).unwrap().timestamp(),
            msg.timestamp().timestamp()
        );
    }
}
