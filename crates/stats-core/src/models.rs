use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

use crate::error::{Result, StatsError};

/// The kind of a message record as tagged by the export's `type` field.
///
/// The set is open: kinds other than `Generic` and `Call` are kept verbatim in
/// [`MessageKind::Other`] instead of failing the load.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// Plain text message (`"Generic"`).
    Generic,
    /// Audio or video call event (`"Call"`).
    Call,
    /// Any other kind (`"Share"`, `"Subscribe"`, ...), raw tag preserved.
    Other(String),
}

impl MessageKind {
    /// The raw tag as it appears in the export.
    pub fn as_str(&self) -> &str {
        match self {
            MessageKind::Generic => "Generic",
            MessageKind::Call => "Call",
            MessageKind::Other(raw) => raw.as_str(),
        }
    }
}

impl From<&str> for MessageKind {
    fn from(raw: &str) -> Self {
        match raw {
            "Generic" => MessageKind::Generic,
            "Call" => MessageKind::Call,
            other => MessageKind::Other(other.to_string()),
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for MessageKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Whether a conversation is one-to-one or a group chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ThreadType {
    Direct,
    Group,
}

impl ThreadType {
    /// Map the export's `thread_type` string.
    ///
    /// Only `"Regular"` and `"RegularGroup"` are recognised; anything else is
    /// an [`StatsError::UnsupportedThreadType`].
    pub fn from_thread_type(raw: &str) -> Result<Self> {
        match raw {
            "Regular" => Ok(ThreadType::Direct),
            "RegularGroup" => Ok(ThreadType::Group),
            other => Err(StatsError::UnsupportedThreadType(other.to_string())),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ThreadType::Direct => "direct",
            ThreadType::Group => "group",
        }
    }
}

impl fmt::Display for ThreadType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One normalised message of a conversation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversationRecord {
    /// Display name of the author.
    pub sender_name: String,
    /// Message kind tag.
    pub kind: MessageKind,
    /// Text body after mojibake repair; empty when the export had none.
    pub content: String,
    /// Call length in seconds, only ever set on [`MessageKind::Call`] records.
    pub call_duration: Option<f64>,
    /// UTC instant derived from `timestamp_ms`.
    pub timestamp: DateTime<Utc>,
}

/// A chat thread's full normalised history.
///
/// Built once by the loader and read-only afterwards; records are sorted by
/// timestamp with ties kept in export order.
#[derive(Debug, Clone, Serialize)]
pub struct Conversation {
    id: String,
    title: String,
    thread_type: ThreadType,
    records: Vec<ConversationRecord>,
}

impl Conversation {
    /// Assemble a conversation, sorting `records` stably by timestamp.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        thread_type: ThreadType,
        mut records: Vec<ConversationRecord>,
    ) -> Self {
        records.sort_by_key(|r| r.timestamp);
        Self {
            id: id.into(),
            title: title.into(),
            thread_type,
            records,
        }
    }

    /// Stable external key (the export directory name).
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn thread_type(&self) -> ThreadType {
        self.thread_type
    }

    pub fn records(&self) -> &[ConversationRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Timestamp of the earliest record.
    pub fn first_activity(&self) -> Option<DateTime<Utc>> {
        self.records.first().map(|r| r.timestamp)
    }

    /// Timestamp of the latest record.
    pub fn last_activity(&self) -> Option<DateTime<Utc>> {
        self.records.last().map(|r| r.timestamp)
    }
}

impl fmt::Display for Conversation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<Conversation '{}' (type={}, rows={})>",
            self.id,
            self.thread_type,
            self.len()
        )
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn record(sender: &str, kind: &str, ms: i64) -> ConversationRecord {
        ConversationRecord {
            sender_name: sender.to_string(),
            kind: MessageKind::from(kind),
            content: String::new(),
            call_duration: None,
            timestamp: DateTime::from_timestamp_millis(ms).unwrap(),
        }
    }

    #[test]
    fn test_message_kind_from_str() {
        assert_eq!(MessageKind::from("Generic"), MessageKind::Generic);
        assert_eq!(MessageKind::from("Call"), MessageKind::Call);
        assert_eq!(
            MessageKind::from("Share"),
            MessageKind::Other("Share".to_string())
        );
        // Tags are case-sensitive.
        assert_eq!(
            MessageKind::from("generic"),
            MessageKind::Other("generic".to_string())
        );
    }

    #[test]
    fn test_message_kind_serializes_as_raw_tag() {
        let json = serde_json::to_string(&MessageKind::Other("Share".into())).unwrap();
        assert_eq!(json, "\"Share\"");
        let json = serde_json::to_string(&MessageKind::Call).unwrap();
        assert_eq!(json, "\"Call\"");
    }

    #[test]
    fn test_thread_type_mapping() {
        assert_eq!(
            ThreadType::from_thread_type("Regular").unwrap(),
            ThreadType::Direct
        );
        assert_eq!(
            ThreadType::from_thread_type("RegularGroup").unwrap(),
            ThreadType::Group
        );
    }

    #[test]
    fn test_thread_type_unknown_is_error() {
        for raw in ["Pending", "regular", ""] {
            let err = ThreadType::from_thread_type(raw).unwrap_err();
            assert!(matches!(err, StatsError::UnsupportedThreadType(ref s) if s == raw));
        }
    }

    #[test]
    fn test_conversation_new_sorts_stably() {
        let records = vec![
            record("A", "Generic", 2_000),
            record("B", "Generic", 1_000),
            record("C", "Call", 2_000),
            record("D", "Generic", 1_000),
        ];
        let conv = Conversation::new("chat_1", "Chat", ThreadType::Group, records);

        let senders: Vec<&str> = conv
            .records()
            .iter()
            .map(|r| r.sender_name.as_str())
            .collect();
        assert_eq!(senders, vec!["B", "D", "A", "C"]);
    }

    #[test]
    fn test_conversation_activity_bounds() {
        let conv = Conversation::new(
            "chat_1",
            "Chat",
            ThreadType::Direct,
            vec![record("A", "Generic", 5_000), record("B", "Generic", 1_000)],
        );
        assert_eq!(conv.first_activity().unwrap().timestamp_millis(), 1_000);
        assert_eq!(conv.last_activity().unwrap().timestamp_millis(), 5_000);
        assert_eq!(conv.len(), 2);
    }

    #[test]
    fn test_empty_conversation() {
        let conv = Conversation::new("empty", "Empty", ThreadType::Direct, vec![]);
        assert!(conv.is_empty());
        assert!(conv.first_activity().is_none());
    }

    #[test]
    fn test_conversation_display() {
        let conv = Conversation::new(
            "alice_x1",
            "Alice",
            ThreadType::Direct,
            vec![record("A", "Generic", 0)],
        );
        assert_eq!(
            conv.to_string(),
            "<Conversation 'alice_x1' (type=direct, rows=1)>"
        );
    }
}
