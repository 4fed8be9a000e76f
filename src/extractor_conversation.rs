//! Conversation-export extractor.
//!
//! Reads a JSON array of conversation records, each shaped like:
//!
//! ```json
//! {
//!   "title": "Budget",
//!   "create_time": 1700000000.5,
//!   "update_time": 1700000100.0,
//!   "mapping": {
//!     "node-1": { "message": { "author": { "role": "user" },
//!                               "content": { "content_type": "text", "parts": ["hi"] } } }
//!   }
//! }
//! ```
//!
//! One [`Item`] is produced per record. Messages are rebuilt from the
//! `mapping` in the order the nodes appear in the file; that order is not
//! guaranteed to be conversational order.

use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::PathBuf;

use crate::config::ComponentEntry;
use crate::error::{ArkiverError, Result};
use crate::models::{Item, ItemPayload, Message};
use crate::traits::{Extractor, ItemIter};

#[derive(Debug, Deserialize)]
struct ConversationSettings {
    path: Option<PathBuf>,
    #[serde(default)]
    title_filter: Option<String>,
}

pub struct ConversationExtractor {
    name: String,
    path: PathBuf,
    title_filter: Option<String>,
}

impl ConversationExtractor {
    pub fn new(name: &str, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.to_string(),
            path: path.into(),
            title_filter: None,
        }
    }

    /// Keep only conversations whose title contains `filter` (any case).
    pub fn with_title_filter(mut self, filter: impl Into<String>) -> Self {
        self.title_filter = Some(filter.into());
        self
    }

    pub fn from_entry(name: &str, entry: &ComponentEntry) -> Result<Self> {
        let settings: ConversationSettings = entry.settings_as(name)?;
        let path = settings
            .path
            .ok_or_else(|| ArkiverError::config(name, "no 'path' specified for conversation source"))?;
        Ok(Self {
            name: name.to_string(),
            path,
            title_filter: settings.title_filter,
        })
    }

    fn read_records(&self) -> Result<Vec<Value>> {
        let content = std::fs::read_to_string(&self.path)
            .map_err(|e| ArkiverError::source_read(&self.name, &self.path, e))?;
        let parsed: Value = serde_json::from_str(&content)
            .map_err(|e| ArkiverError::source_read(&self.name, &self.path, e))?;
        match parsed {
            Value::Array(records) => Ok(records),
            other => Err(ArkiverError::source_read(
                &self.name,
                &self.path,
                format!("expected a JSON array of conversations, found {}", json_kind(&other)),
            )),
        }
    }

    fn keep(&self, item: &Item) -> bool {
        match &self.title_filter {
            Some(filter) => item
                .title
                .to_lowercase()
                .contains(&filter.to_lowercase()),
            None => true,
        }
    }
}

impl Extractor for ConversationExtractor {
    fn name(&self) -> &str {
        &self.name
    }

    fn extractor_type(&self) -> &str {
        "conversation_json"
    }

    fn extract(&self) -> Result<ItemIter<'_>> {
        let records = self.read_records()?;
        let iter = records
            .into_iter()
            .map(move |record| conversation_to_item(&self.name, &record))
            .filter(move |item| self.keep(item));
        Ok(Box::new(iter))
    }
}

fn conversation_to_item(source_name: &str, record: &Value) -> Item {
    let title = record
        .get("title")
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
        .unwrap_or("Untitled")
        .to_string();

    let messages = match record.get("mapping").and_then(Value::as_object) {
        Some(mapping) => messages_from_mapping(mapping),
        None => Vec::new(),
    };

    Item {
        title,
        created_at: record.get("create_time").and_then(epoch_to_datetime),
        updated_at: record.get("update_time").and_then(epoch_to_datetime),
        source_name: source_name.to_string(),
        payload: ItemPayload::Conversation { messages },
    }
}

/// Rebuild the message list in node-map order, dropping nodes without text.
fn messages_from_mapping(mapping: &Map<String, Value>) -> Vec<Message> {
    let mut messages = Vec::new();
    for (node_id, node) in mapping {
        let Some(message) = node.get("message").filter(|m| !m.is_null()) else {
            continue;
        };
        let text = message_text(message);
        if text.trim().is_empty() {
            continue;
        }
        messages.push(Message {
            node_id: node_id.clone(),
            text,
            position: messages.len(),
            role: message
                .pointer("/author/role")
                .and_then(Value::as_str)
                .map(str::to_string),
            created_at: message.get("create_time").and_then(epoch_to_datetime),
        });
    }
    messages
}

/// Space-joined `parts` of a `text` content block; empty parts are skipped.
fn message_text(message: &Value) -> String {
    let Some(content) = message.get("content") else {
        return String::new();
    };
    if content.get("content_type").and_then(Value::as_str) != Some("text") {
        return String::new();
    }
    let Some(parts) = content.get("parts").and_then(Value::as_array) else {
        return String::new();
    };
    parts
        .iter()
        .filter_map(part_text)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Text of one part; falsy parts (null, false, zero, empty) are dropped.
fn part_text(part: &Value) -> Option<String> {
    match part {
        Value::Null | Value::Bool(false) => None,
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        Value::String(s) if s.is_empty() => None,
        Value::Array(a) if a.is_empty() => None,
        Value::Object(o) if o.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn epoch_to_datetime(value: &Value) -> Option<DateTime<Utc>> {
    let secs = value.as_f64()?;
    let whole = secs.floor();
    let nanos = ((secs - whole) * 1e9).round() as u32;
    Utc.timestamp_opt(whole as i64, nanos.min(999_999_999)).single()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn write_export(dir: &TempDir, value: &Value) -> PathBuf {
        let path = dir.path().join("conversations.json");
        std::fs::write(&path, serde_json::to_string(value).unwrap()).unwrap();
        path
    }

    fn node(text: &str) -> Value {
        json!({ "message": { "content": { "content_type": "text", "parts": [text] } } })
    }

    #[test]
    fn test_one_item_per_record() {
        let tmp = TempDir::new().unwrap();
        let path = write_export(
            &tmp,
            &json!([
                { "title": "First", "mapping": { "a": node("one") } },
                { "title": "Second", "mapping": {} },
                { "mapping": { "b": node("three") } }
            ]),
        );

        let extractor = ConversationExtractor::new("chats", &path);
        let items: Vec<Item> = extractor.extract().unwrap().collect();

        assert_eq!(items.len(), 3);
        assert_eq!(items[0].title, "First");
        assert_eq!(items[2].title, "Untitled");
        assert!(items.iter().all(|i| i.source_name == "chats"));
        assert_eq!(extractor.text_content(&items[0]), "one");
    }

    #[test]
    fn test_messages_keep_file_order_and_skip_empty_nodes() {
        let tmp = TempDir::new().unwrap();
        let path = write_export(
            &tmp,
            &json!([{
                "title": "Order",
                "create_time": 1700000000.25,
                "mapping": {
                    "zeta": node("first"),
                    "root": { "message": null },
                    "alpha": node("   "),
                    "mid": { "message": { "content": { "content_type": "code", "text": "x=1" } } },
                    "beta": {
                        "message": {
                            "author": { "role": "assistant" },
                            "content": { "content_type": "text", "parts": ["second", "", null, "part"] }
                        }
                    }
                }
            }]),
        );

        let items: Vec<Item> = ConversationExtractor::new("chats", &path)
            .extract()
            .unwrap()
            .collect();
        let messages = items[0].messages();

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].node_id, "zeta");
        assert_eq!(messages[0].position, 0);
        assert_eq!(messages[1].node_id, "beta");
        assert_eq!(messages[1].text, "second part");
        assert_eq!(messages[1].position, 1);
        assert_eq!(messages[1].role.as_deref(), Some("assistant"));
        assert_eq!(items[0].text_content(), "first second part");
        assert_eq!(items[0].created_at.unwrap().timestamp(), 1700000000);
    }

    #[test]
    fn test_falsy_parts_are_dropped() {
        let parts = json!(["a", 0, 0.0, [], {}, false, null, "", 7, true, ["x"]]);
        let texts: Vec<String> = parts.as_array().unwrap().iter().filter_map(part_text).collect();
        assert_eq!(texts, vec!["a", "7", "true", "[\"x\"]"]);
    }

    #[test]
    fn test_title_filter() {
        let tmp = TempDir::new().unwrap();
        let path = write_export(
            &tmp,
            &json!([{ "title": "AI planning" }, { "title": "Groceries" }]),
        );

        let items: Vec<Item> = ConversationExtractor::new("chats", &path)
            .with_title_filter("ai")
            .extract()
            .unwrap()
            .collect();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "AI planning");
    }

    #[test]
    fn test_missing_path_is_configuration_error() {
        let entry = ComponentEntry::new("conversation_json");
        let err = ConversationExtractor::from_entry("chats", &entry).err().unwrap();
        assert!(matches!(err, ArkiverError::Configuration { .. }));
    }

    #[test]
    fn test_unreadable_and_malformed_sources() {
        let tmp = TempDir::new().unwrap();

        let missing = ConversationExtractor::new("chats", tmp.path().join("nope.json"));
        assert!(matches!(
            missing.extract().err().unwrap(),
            ArkiverError::SourceRead { .. }
        ));

        let path = write_export(&tmp, &json!({ "title": "not an array" }));
        let err = ConversationExtractor::new("chats", &path).extract().err().unwrap();
        assert!(matches!(err, ArkiverError::SourceRead { .. }));
        assert!(err.to_string().contains("an object"));
    }

    #[test]
    fn test_empty_array_yields_nothing() {
        let tmp = TempDir::new().unwrap();
        let path = write_export(&tmp, &json!([]));
        let count = ConversationExtractor::new("chats", &path).extract().unwrap().count();
        assert_eq!(count, 0);
    }
}
