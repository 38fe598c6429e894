//! Conversation loading and normalisation.
//!
//! Turns one raw `message_1.json` document into a [`Conversation`]: validates
//! the top-level schema, maps the thread type, derives UTC timestamps, repairs
//! mojibake in titles and bodies, and sorts records chronologically.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use stats_core::error::{Result, StatsError};
use stats_core::models::{Conversation, ConversationRecord, MessageKind, ThreadType};
use stats_core::text_repair::fix_text;
use stats_core::time_utils::parse_epoch_millis;
use tracing::{debug, info, warn};

use crate::reader;

// ── LoaderConfig ──────────────────────────────────────────────────────────────

/// Explicit loader configuration.
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// Directory holding one sub-directory per conversation.
    pub inbox_path: PathBuf,
    /// Run [`fix_text`] over titles and message bodies.
    pub repair_text: bool,
}

impl LoaderConfig {
    pub fn new(inbox_path: impl Into<PathBuf>) -> Self {
        Self {
            inbox_path: inbox_path.into(),
            repair_text: true,
        }
    }

    pub fn with_repair_text(mut self, repair_text: bool) -> Self {
        self.repair_text = repair_text;
        self
    }
}

// ── ConversationLoader ────────────────────────────────────────────────────────

/// Builds [`Conversation`]s from export documents.
pub struct ConversationLoader {
    config: LoaderConfig,
}

impl ConversationLoader {
    pub fn new(config: LoaderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    pub fn inbox_path(&self) -> &Path {
        &self.config.inbox_path
    }

    /// Parse and normalise one conversation document.
    ///
    /// `id` is the caller's stable key for the conversation; `bytes` is the
    /// raw JSON document.
    pub fn load_document(&self, id: &str, bytes: &[u8]) -> Result<Conversation> {
        let doc: Value = serde_json::from_slice(bytes)?;
        let Value::Object(doc) = doc else {
            return Err(StatsError::Schema(
                "document root must be a JSON object".to_string(),
            ));
        };

        let messages = doc
            .get("messages")
            .ok_or_else(|| StatsError::Schema("missing field `messages`".to_string()))?
            .as_array()
            .ok_or_else(|| StatsError::Schema("field `messages` must be an array".to_string()))?;
        let raw_thread_type = required_str(&doc, "thread_type")?;
        let raw_title = required_str(&doc, "title")?;
        let thread_type = ThreadType::from_thread_type(raw_thread_type)?;
        let title = self.repair(raw_title);

        let records = messages
            .iter()
            .enumerate()
            .map(|(index, raw)| self.map_record(index, raw))
            .collect::<Result<Vec<_>>>()?;

        let other_kinds = records
            .iter()
            .filter(|r| matches!(r.kind, MessageKind::Other(_)))
            .count();
        debug!(
            "Conversation {}: {} records ({} of other kinds), type={}",
            id,
            records.len(),
            other_kinds,
            thread_type
        );

        Ok(Conversation::new(id, title, thread_type, records))
    }

    /// Load `<inbox>/<id>/message_1.json`.
    pub fn load_conversation(&self, id: &str) -> Result<Conversation> {
        let chat_dir = self.config.inbox_path.join(id);
        let (id, bytes) = reader::read_conversation(&chat_dir)?;
        self.load_document(&id, &bytes)
    }

    /// Identifiers of every conversation directory in the inbox.
    pub fn available_ids(&self) -> Result<Vec<String>> {
        reader::find_conversation_dirs(&self.config.inbox_path)?
            .iter()
            .map(|dir| reader::conversation_id(dir))
            .collect()
    }

    /// Load every conversation in the inbox, in directory order.
    ///
    /// The first layout or schema failure aborts the whole load.
    pub fn load_all(&self) -> Result<Vec<Conversation>> {
        let ids = self.available_ids()?;
        let conversations = ids
            .iter()
            .map(|id| self.load_conversation(id))
            .collect::<Result<Vec<_>>>()?;
        info!(
            "Loaded {} conversations from {}",
            conversations.len(),
            self.config.inbox_path.display()
        );
        Ok(conversations)
    }

    // ── Private ───────────────────────────────────────────────────────────────

    fn repair(&self, text: &str) -> String {
        if self.config.repair_text {
            fix_text(text)
        } else {
            text.to_string()
        }
    }

    /// Project one raw message onto a [`ConversationRecord`].
    ///
    /// Only `sender_name`, `type`, `content`, `call_duration` and
    /// `timestamp_ms` are read; every other field is ignored.
    fn map_record(&self, index: usize, raw: &Value) -> Result<ConversationRecord> {
        let malformed = |reason: &str| StatsError::MalformedRecord {
            index,
            reason: reason.to_string(),
        };

        let Value::Object(fields) = raw else {
            return Err(malformed("record must be a JSON object"));
        };

        let timestamp = match fields.get("timestamp_ms") {
            None | Some(Value::Null) => return Err(malformed("missing `timestamp_ms`")),
            Some(value) => parse_epoch_millis(value)
                .ok_or_else(|| malformed("`timestamp_ms` is not a valid epoch in milliseconds"))?,
        };

        let sender_name = match fields.get("sender_name").and_then(Value::as_str) {
            Some(name) => name.to_string(),
            None => {
                debug!("Record {} has no sender_name", index);
                String::new()
            }
        };

        let kind = fields
            .get("type")
            .and_then(Value::as_str)
            .map(MessageKind::from)
            .unwrap_or_else(|| MessageKind::Other(String::new()));

        let content = fields
            .get("content")
            .and_then(Value::as_str)
            .map(|text| self.repair(text))
            .unwrap_or_default();

        let call_duration = match (&kind, fields.get("call_duration")) {
            (MessageKind::Call, Some(value)) => value.as_f64(),
            (_, Some(Value::Null)) | (_, None) => None,
            (_, Some(_)) => {
                warn!(
                    "Dropping call_duration on record {} of kind {}",
                    index, kind
                );
                None
            }
        };

        Ok(ConversationRecord {
            sender_name,
            kind,
            content,
            call_duration,
            timestamp,
        })
    }
}

/// Fetch a required top-level string field.
fn required_str<'a>(doc: &'a Map<String, Value>, field: &str) -> Result<&'a str> {
    match doc.get(field) {
        None => Err(StatsError::Schema(format!("missing field `{}`", field))),
        Some(value) => value
            .as_str()
            .ok_or_else(|| StatsError::Schema(format!("field `{}` must be a string", field))),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
