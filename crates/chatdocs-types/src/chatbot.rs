use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

use crate::user::UserId;

/// Database-assigned chatbot identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatbotId(pub i64);

impl fmt::Display for ChatbotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ChatbotId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.trim().parse()?))
    }
}

/// A chatbot record.
///
/// The record is the durable anchor for the chatbot's stored documents
/// (see [`chatbot_prefix`]) and for its state in the processing service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chatbot {
    pub id: ChatbotId,
    pub name: String,
    /// Owning user. Fixed at creation.
    pub owner_id: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Chatbot {
    /// Object-store prefix holding every document of this chatbot.
    pub fn object_prefix(&self) -> String {
        chatbot_prefix(self.owner_id, self.id)
    }
}

/// A document handed to chatbot creation.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentUpload {
    /// Original filename, used verbatim in the object key.
    pub filename: String,
    pub content_type: Option<String>,
    pub content: Bytes,
}

impl DocumentUpload {
    pub fn new(filename: impl Into<String>, content_type: Option<&str>, content: impl Into<Bytes>) -> Self {
        Self {
            filename: filename.into(),
            content_type: content_type.map(str::to_string),
            content: content.into(),
        }
    }

    /// Content type to send upstream, defaulting to `application/octet-stream`.
    pub fn content_type_or_default(&self) -> &str {
        self.content_type
            .as_deref()
            .unwrap_or("application/octet-stream")
    }
}

/// Request to create a chatbot. The owner is always the authenticated caller.
#[derive(Debug, Clone, Default)]
pub struct CreateChatbotRequest {
    pub name: String,
    pub documents: Vec<DocumentUpload>,
}

/// Acknowledgement returned by the processing service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingAck {
    pub status: u16,
    /// JSON payload, when the service returned one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<serde_json::Value>,
}

/// Result of a successful creation: the record plus the processing ack.
#[derive(Debug, Clone, Serialize)]
pub struct ChatbotCreated {
    pub chatbot: Chatbot,
    pub processing: ProcessingAck,
}

/// Result of a completed deletion pipeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatbotDeleted {
    pub chatbot_id: ChatbotId,
    /// Objects removed from the store by the prefix purge.
    pub objects_deleted: usize,
}

/// Prefix under which all objects of one chatbot live:
/// `users/user{owner}/chatbot{chatbot}/`.
///
/// The trailing slash keeps `chatbot1/` from matching `chatbot12/`.
pub fn chatbot_prefix(owner: UserId, chatbot: ChatbotId) -> String {
    format!("users/user{}/chatbot{}/", owner.0, chatbot.0)
}

/// Storage key of one uploaded document:
/// `users/user{owner}/chatbot{chatbot}/documents/{filename}`.
///
/// The filename is not sanitized; this layout is persisted and must stay
/// bit-exact.
///
/// ```
/// use chatdocs_types::chatbot::{document_key, ChatbotId};
/// use chatdocs_types::user::UserId;
///
/// assert_eq!(
///     document_key(UserId(3), ChatbotId(17), "notes.pdf"),
///     "users/user3/chatbot17/documents/notes.pdf"
/// );
/// ```
pub fn document_key(owner: UserId, chatbot: ChatbotId, filename: &str) -> String {
    format!("{}documents/{filename}", chatbot_prefix(owner, chatbot))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_key_layout() {
        assert_eq!(
            document_key(UserId(1), ChatbotId(2), "a.txt"),
            "users/user1/chatbot2/documents/a.txt"
        );
    }

    #[test]
    fn test_document_key_is_deterministic() {
        let first = document_key(UserId(9), ChatbotId(40), "report final.pdf");
        let second = document_key(UserId(9), ChatbotId(40), "report final.pdf");
        assert_eq!(first, second);
    }

    #[test]
    fn test_document_key_keeps_raw_filename() {
        let key = document_key(UserId(1), ChatbotId(1), "../weird/ünï code?.md");
        assert_eq!(key, "users/user1/chatbot1/documents/../weird/ünï code?.md");
    }

    #[test]
    fn test_document_key_starts_with_prefix() {
        let prefix = chatbot_prefix(UserId(5), ChatbotId(6));
        let key = document_key(UserId(5), ChatbotId(6), "doc.txt");
        assert!(key.starts_with(&prefix));
    }

    #[test]
    fn test_prefix_does_not_match_sibling_ids() {
        let prefix = chatbot_prefix(UserId(1), ChatbotId(1));
        let sibling = document_key(UserId(1), ChatbotId(12), "doc.txt");
        assert!(!sibling.starts_with(&prefix));
    }

    #[test]
    fn test_chatbot_id_roundtrip() {
        let id: ChatbotId = "123".parse().unwrap();
        assert_eq!(id.to_string(), "123");
    }

    #[test]
    fn test_default_content_type() {
        let doc = DocumentUpload::new("a.bin", None, b"x".to_vec());
        assert_eq!(doc.content_type_or_default(), "application/octet-stream");
        let doc = DocumentUpload::new("a.txt", Some("text/plain"), b"x".to_vec());
        assert_eq!(doc.content_type_or_default(), "text/plain");
    }
}
