//! Keyword-table processor.
//!
//! The keyword table is a JSON object mapping a project name to the
//! keywords that identify it:
//!
//! ```json
//! { "Orion": ["orion", "launch window"], "Garden": ["tomato", "compost"] }
//! ```
//!
//! Matching is plain substring containment on the (optionally case-folded)
//! text, so `"orion"` also matches inside `"orionid"`. An empty keyword is
//! contained in every text and therefore labels every item. For conversations,
//! each message is scanned on its own as well and every matching message
//! records a [`ContextWindow`]: the previous and next messages are included
//! only when they do not match any keyword themselves.

use serde::Deserialize;
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::config::ComponentEntry;
use crate::error::{ArkiverError, Result};
use crate::models::{ContextWindow, Evidence, Item, Message, MessageMatch, ProcessingResult};
use crate::traits::Processor;

#[derive(Debug, Deserialize)]
struct KeywordSettings {
    config_path: Option<PathBuf>,
    #[serde(default)]
    case_sensitive: bool,
}

pub struct KeywordProcessor {
    name: String,
    case_sensitive: bool,
    /// Inverted index in table order; a keyword listed twice maps to the
    /// last project that names it.
    index: Vec<(String, String)>,
}

impl KeywordProcessor {
    pub fn from_entry(name: &str, entry: &ComponentEntry) -> Result<Self> {
        let settings: KeywordSettings = entry.settings_as(name)?;
        let path = settings
            .config_path
            .ok_or_else(|| ArkiverError::config(name, "no 'config_path' specified for keyword processor"))?;
        Self::from_file(name, &path, settings.case_sensitive)
    }

    /// Load the keyword table from a JSON file.
    ///
    /// Files that are not strict JSON (such as older Python-literal tables
    /// with single quotes) are rejected with a configuration error.
    pub fn from_file(name: &str, path: &Path, case_sensitive: bool) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ArkiverError::config(
                name,
                format!("cannot read keyword table {}: {}", path.display(), e),
            )
        })?;
        let table: serde_json::Map<String, serde_json::Value> = serde_json::from_str(&content)
            .map_err(|e| {
                ArkiverError::config(
                    name,
                    format!(
                        "keyword table {} is not valid JSON ({}); convert legacy tables to a JSON object of name -> [keywords]",
                        path.display(),
                        e
                    ),
                )
            })?;

        let mut projects = Vec::with_capacity(table.len());
        for (project, keywords) in table {
            let keywords: Vec<String> = serde_json::from_value(keywords).map_err(|e| {
                ArkiverError::config(
                    name,
                    format!("keywords for '{}' must be a list of strings: {}", project, e),
                )
            })?;
            projects.push((project, keywords));
        }
        Ok(Self::new(name, projects, case_sensitive))
    }

    /// Build from an in-memory table of `(project, keywords)`.
    pub fn new<P, K>(name: &str, table: impl IntoIterator<Item = (P, K)>, case_sensitive: bool) -> Self
    where
        P: Into<String>,
        K: IntoIterator,
        K::Item: AsRef<str>,
    {
        let mut index: Vec<(String, String)> = Vec::new();
        let mut slots: HashMap<String, usize> = HashMap::new();
        for (project, keywords) in table {
            let project = project.into();
            for keyword in keywords {
                let keyword = keyword.as_ref();
                if keyword.is_empty() {
                    warn!(processor = name, project = %project, "Empty keyword matches every item");
                }
                let key = if case_sensitive {
                    keyword.to_string()
                } else {
                    keyword.to_lowercase()
                };
                match slots.get(&key) {
                    Some(&slot) => index[slot].1 = project.clone(),
                    None => {
                        slots.insert(key.clone(), index.len());
                        index.push((key, project.clone()));
                    }
                }
            }
        }
        debug!(processor = name, keywords = index.len(), "Keyword index built");

        Self {
            name: name.to_string(),
            case_sensitive,
            index,
        }
    }

    pub fn keyword_count(&self) -> usize {
        self.index.len()
    }

    fn fold(&self, text: &str) -> String {
        if self.case_sensitive {
            text.to_string()
        } else {
            text.to_lowercase()
        }
    }

    /// Projects whose keywords occur in `text`, plus the keywords that hit.
    fn scan(&self, text: &str) -> (BTreeSet<String>, Vec<String>) {
        let folded = self.fold(text);
        let mut projects = BTreeSet::new();
        let mut keywords = Vec::new();
        for (keyword, project) in &self.index {
            if folded.contains(keyword.as_str()) {
                projects.insert(project.clone());
                keywords.push(keyword.clone());
            }
        }
        (projects, keywords)
    }

    fn analyze_messages(&self, messages: &[Message]) -> Vec<MessageMatch> {
        let hits: Vec<BTreeSet<String>> = messages.iter().map(|m| self.scan(&m.text).0).collect();
        let is_hit = |i: usize| !hits[i].is_empty();

        let mut detailed = Vec::new();
        for (i, message) in messages.iter().enumerate() {
            if !is_hit(i) {
                continue;
            }
            let previous = (i > 0 && !is_hit(i - 1)).then(|| messages[i - 1].text.clone());
            let next = (i + 1 < messages.len() && !is_hit(i + 1))
                .then(|| messages[i + 1].text.clone());

            detailed.push(MessageMatch {
                message_index: i,
                categories: hits[i].clone(),
                context: ContextWindow {
                    previous,
                    matched: message.text.clone(),
                    next,
                },
            });
        }
        detailed
    }
}

impl Processor for KeywordProcessor {
    fn name(&self) -> &str {
        &self.name
    }

    fn processor_type(&self) -> &str {
        "keyword"
    }

    fn process(&self, item: &Item, text: &str) -> Result<ProcessingResult> {
        let (mut projects, matched_keywords) = self.scan(text);

        let detailed_matches = self.analyze_messages(item.messages());
        for m in &detailed_matches {
            projects.extend(m.categories.iter().cloned());
        }

        Ok(ProcessingResult::new(
            &self.name,
            projects,
            Evidence::Keyword {
                matched_keywords,
                detailed_matches,
            },
        ))
    }
}
