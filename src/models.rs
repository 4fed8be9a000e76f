//! Core data models used throughout Arkiver.
//!
//! These types represent the items, processing results, and run summaries
//! that flow through the extract → process → output pipeline. Items are
//! never mutated once an extractor has produced them; processor output is
//! attached alongside them in [`ProcessedItem`].

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

/// One message reconstructed from a conversation's node map.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Message {
    pub node_id: String,
    pub text: String,
    /// Index in the reconstructed sequence (node map order).
    pub position: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Source-specific content of an [`Item`].
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ItemPayload {
    Conversation { messages: Vec<Message> },
    TextFile { path: PathBuf, content: String },
}

/// Which extractor family produced an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Conversation,
    TextFile,
}

impl ItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Conversation => "conversation",
            ItemKind::TextFile => "text_file",
        }
    }
}

/// One unit of extracted data: a conversation or a text file.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Item {
    pub title: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    /// Name of the configured source that produced this item.
    pub source_name: String,
    pub payload: ItemPayload,
}

impl Item {
    pub fn kind(&self) -> ItemKind {
        match self.payload {
            ItemPayload::Conversation { .. } => ItemKind::Conversation,
            ItemPayload::TextFile { .. } => ItemKind::TextFile,
        }
    }

    /// Messages of a conversation item; empty for every other kind.
    pub fn messages(&self) -> &[Message] {
        match &self.payload {
            ItemPayload::Conversation { messages } => messages,
            ItemPayload::TextFile { .. } => &[],
        }
    }

    /// Flat text representation used by processors.
    ///
    /// Conversations join the text of every non-empty message with a single
    /// space; text files return their stored content unchanged.
    pub fn text_content(&self) -> String {
        match &self.payload {
            ItemPayload::Conversation { messages } => messages
                .iter()
                .map(|m| m.text.as_str())
                .filter(|t| !t.is_empty())
                .collect::<Vec<_>>()
                .join(" "),
            ItemPayload::TextFile { content, .. } => content.clone(),
        }
    }
}

/// Context window around one matching conversation message.
///
/// A neighbour is only present when it does not itself match a keyword.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ContextWindow {
    pub previous: Option<String>,
    pub matched: String,
    pub next: Option<String>,
}

impl ContextWindow {
    /// Render as the labelled paragraphs shown to reviewers.
    pub fn render(&self) -> String {
        let mut parts = Vec::with_capacity(3);
        if let Some(prev) = &self.previous {
            parts.push(format!("PREVIOUS: {}", prev));
        }
        parts.push(format!("MATCH: {}", self.matched));
        if let Some(next) = &self.next {
            parts.push(format!("NEXT: {}", next));
        }
        parts.join("\n\n")
    }
}

/// A conversation message that matched at least one keyword.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MessageMatch {
    pub message_index: usize,
    pub categories: BTreeSet<String>,
    pub context: ContextWindow,
}

/// One `findall` hit: the whole match when the pattern has no groups,
/// otherwise the captured groups.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum RegexMatch {
    Text(String),
    Groups(Vec<String>),
}

/// Processor-specific match evidence.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "processor", rename_all = "snake_case")]
pub enum Evidence {
    Keyword {
        matched_keywords: Vec<String>,
        detailed_matches: Vec<MessageMatch>,
    },
    Regex {
        matches: BTreeMap<String, Vec<RegexMatch>>,
    },
}

/// Output of one processor applied to one item.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ProcessingResult {
    pub processor_name: String,
    pub matched_categories: BTreeSet<String>,
    pub evidence: Evidence,
    has_matches: bool,
}

impl ProcessingResult {
    pub fn new(
        processor_name: impl Into<String>,
        matched_categories: BTreeSet<String>,
        evidence: Evidence,
    ) -> Self {
        let has_matches = !matched_categories.is_empty();
        Self {
            processor_name: processor_name.into(),
            matched_categories,
            evidence,
            has_matches,
        }
    }

    pub fn has_matches(&self) -> bool {
        self.has_matches
    }

    /// Per-message context windows, if this came from a keyword processor.
    pub fn detailed_matches(&self) -> &[MessageMatch] {
        match &self.evidence {
            Evidence::Keyword {
                detailed_matches, ..
            } => detailed_matches,
            Evidence::Regex { .. } => &[],
        }
    }
}

/// An item together with everything the processing phase produced for it.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ProcessedItem {
    pub original_data: Item,
    pub text_content: String,
    pub processing_results: Vec<ProcessingResult>,
}

impl ProcessedItem {
    /// Union of labels across all processors.
    pub fn all_categories(&self) -> BTreeSet<String> {
        self.processing_results
            .iter()
            .flat_map(|r| r.matched_categories.iter().cloned())
            .collect()
    }

    pub fn has_matches(&self) -> bool {
        self.processing_results.iter().any(|r| r.has_matches())
    }
}

/// Aggregate counts for one run, derived from the processed items.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct RunStatistics {
    pub total_items: usize,
    pub categorized_items: usize,
    pub uncategorized_items: usize,
    pub unique_projects: usize,
    pub unique_categories: usize,
    /// Labels produced by keyword processors.
    pub projects: Vec<String>,
    /// Labels produced by regex processors.
    pub categories: Vec<String>,
}

impl RunStatistics {
    pub fn from_items(items: &[ProcessedItem]) -> Self {
        let mut projects = BTreeSet::new();
        let mut categories = BTreeSet::new();
        let mut categorized_items = 0;

        for item in items {
            if item.has_matches() {
                categorized_items += 1;
            }
            for result in item.processing_results.iter().filter(|r| r.has_matches()) {
                let target = match result.evidence {
                    Evidence::Keyword { .. } => &mut projects,
                    Evidence::Regex { .. } => &mut categories,
                };
                target.extend(result.matched_categories.iter().cloned());
            }
        }

        Self {
            total_items: items.len(),
            categorized_items,
            uncategorized_items: items.len() - categorized_items,
            unique_projects: projects.len(),
            unique_categories: categories.len(),
            projects: projects.into_iter().collect(),
            categories: categories.into_iter().collect(),
        }
    }
}

/// Summary returned to the caller of a pipeline run.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RunResult {
    pub success: bool,
    pub statistics: RunStatistics,
    pub output_files: Vec<PathBuf>,
    pub message: String,
    /// True when generated files were removed by the post-run cleanup.
    pub cleaned_up: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conversation(texts: &[&str]) -> Item {
        Item {
            title: "Chat".to_string(),
            created_at: None,
            updated_at: None,
            source_name: "chats".to_string(),
            payload: ItemPayload::Conversation {
                messages: texts
                    .iter()
                    .enumerate()
                    .map(|(i, t)| Message {
                        node_id: format!("n{}", i),
                        text: t.to_string(),
                        position: i,
                        role: None,
                        created_at: None,
                    })
                    .collect(),
            },
        }
    }

    #[test]
    fn test_conversation_text_skips_empty_messages() {
        let item = conversation(&["hello", "", "world"]);
        assert_eq!(item.text_content(), "hello world");
        assert_eq!(item.text_content(), item.text_content());
        assert_eq!(item.kind(), ItemKind::Conversation);
    }

    #[test]
    fn test_text_file_content_is_verbatim() {
        let item = Item {
            title: "notes.txt".to_string(),
            created_at: None,
            updated_at: None,
            source_name: "notes".to_string(),
            payload: ItemPayload::TextFile {
                path: PathBuf::from("notes.txt"),
                content: "  line one\nline two ".to_string(),
            },
        };
        assert_eq!(item.text_content(), "  line one\nline two ");
        assert!(item.messages().is_empty());
    }

    #[test]
    fn test_has_matches_tracks_categories() {
        let empty = ProcessingResult::new(
            "kw",
            BTreeSet::new(),
            Evidence::Regex {
                matches: BTreeMap::new(),
            },
        );
        assert!(!empty.has_matches());

        let hit = ProcessingResult::new(
            "kw",
            BTreeSet::from(["Orion".to_string()]),
            Evidence::Keyword {
                matched_keywords: vec!["orion".to_string()],
                detailed_matches: vec![],
            },
        );
        assert!(hit.has_matches());
    }

    #[test]
    fn test_context_window_render() {
        let window = ContextWindow {
            previous: Some("before".to_string()),
            matched: "the hit".to_string(),
            next: None,
        };
        assert_eq!(window.render(), "PREVIOUS: before\n\nMATCH: the hit");
    }

    #[test]
    fn test_statistics_split_projects_and_categories() {
        let item = conversation(&["x"]);
        let processed = vec![
            ProcessedItem {
                text_content: item.text_content(),
                original_data: item.clone(),
                processing_results: vec![
                    ProcessingResult::new(
                        "kw",
                        BTreeSet::from(["Orion".to_string()]),
                        Evidence::Keyword {
                            matched_keywords: vec![],
                            detailed_matches: vec![],
                        },
                    ),
                    ProcessingResult::new(
                        "re",
                        BTreeSet::from(["email".to_string()]),
                        Evidence::Regex {
                            matches: BTreeMap::new(),
                        },
                    ),
                ],
            },
            ProcessedItem {
                text_content: item.text_content(),
                original_data: item,
                processing_results: vec![],
            },
        ];

        let stats = RunStatistics::from_items(&processed);
        assert_eq!(stats.total_items, 2);
        assert_eq!(stats.categorized_items, 1);
        assert_eq!(stats.uncategorized_items, 1);
        assert_eq!(stats.projects, vec!["Orion"]);
        assert_eq!(stats.categories, vec!["email"]);
        assert_eq!(stats.unique_projects, 1);
        assert_eq!(stats.unique_categories, 1);
    }
}
