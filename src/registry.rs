//! Type-key → implementation mapping for each component family.
//!
//! A [`Registry`] is built explicitly (usually with
//! [`Registry::with_builtins`]) and handed to the pipeline. There is no
//! process-wide registry; a caller wanting an extra extractor, processor,
//! or output type adds one constructor to its own registry:
//!
//! ```rust
//! use arkiver::registry::Registry;
//!
//! let registry = Registry::with_builtins();
//! assert!(registry.has_extractor("conversation_json"));
//! // registry.register_extractor("mbox", MboxExtractor::from_entry);
//! ```
//!
//! Built-in keys:
//!
//! | Family | Keys |
//! |--------|------|
//! | extractor | `conversation_json` (alias `conversation`), `text_file` |
//! | processor | `keyword`, `regex` |
//! | output | `text_file`, `json` |

use std::collections::BTreeMap;

use crate::config::ComponentEntry;
use crate::error::{ArkiverError, Result};
use crate::extractor_conversation::ConversationExtractor;
use crate::extractor_text::TextFileExtractor;
use crate::output_json::JsonOutput;
use crate::output_text::TextFileOutput;
use crate::processor_keyword::KeywordProcessor;
use crate::processor_regex::RegexProcessor;
use crate::traits::{Extractor, OutputWriter, Processor};

/// Builds an extractor from its configured name and entry.
pub type ExtractorCtor = fn(&str, &ComponentEntry) -> Result<Box<dyn Extractor>>;
/// Builds a processor from its configured name and entry.
pub type ProcessorCtor = fn(&str, &ComponentEntry) -> Result<Box<dyn Processor>>;
/// Builds an output writer from its configured name and entry.
pub type OutputCtor = fn(&str, &ComponentEntry) -> Result<Box<dyn OutputWriter>>;

#[derive(Clone, Default)]
pub struct Registry {
    extractors: BTreeMap<String, ExtractorCtor>,
    processors: BTreeMap<String, ProcessorCtor>,
    outputs: BTreeMap<String, OutputCtor>,
}

impl Registry {
    /// An empty registry with no known types.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in implementation.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();

        registry.register_extractor("conversation_json", |name, entry| {
            Ok(Box::new(ConversationExtractor::from_entry(name, entry)?))
        });
        registry.register_extractor("conversation", |name, entry| {
            Ok(Box::new(ConversationExtractor::from_entry(name, entry)?))
        });
        registry.register_extractor("text_file", |name, entry| {
            Ok(Box::new(TextFileExtractor::from_entry(name, entry)?))
        });

        registry.register_processor("keyword", |name, entry| {
            Ok(Box::new(KeywordProcessor::from_entry(name, entry)?))
        });
        registry.register_processor("regex", |name, entry| {
            Ok(Box::new(RegexProcessor::from_entry(name, entry)?))
        });

        registry.register_output("text_file", |name, entry| {
            Ok(Box::new(TextFileOutput::from_entry(name, entry)?))
        });
        registry.register_output("json", |name, entry| {
            Ok(Box::new(JsonOutput::from_entry(name, entry)?))
        });

        registry
    }

    pub fn register_extractor(&mut self, key: &str, ctor: ExtractorCtor) {
        self.extractors.insert(key.to_string(), ctor);
    }

    pub fn register_processor(&mut self, key: &str, ctor: ProcessorCtor) {
        self.processors.insert(key.to_string(), ctor);
    }

    pub fn register_output(&mut self, key: &str, ctor: OutputCtor) {
        self.outputs.insert(key.to_string(), ctor);
    }

    pub fn has_extractor(&self, key: &str) -> bool {
        self.extractors.contains_key(key)
    }

    pub fn has_processor(&self, key: &str) -> bool {
        self.processors.contains_key(key)
    }

    pub fn has_output(&self, key: &str) -> bool {
        self.outputs.contains_key(key)
    }

    pub fn build_extractor(&self, name: &str, entry: &ComponentEntry) -> Result<Box<dyn Extractor>> {
        let ctor = self
            .extractors
            .get(&entry.kind)
            .ok_or_else(|| unknown_type(name, "extractor", &entry.kind, self.extractors.keys()))?;
        ctor(name, entry)
    }

    pub fn build_processor(&self, name: &str, entry: &ComponentEntry) -> Result<Box<dyn Processor>> {
        let ctor = self
            .processors
            .get(&entry.kind)
            .ok_or_else(|| unknown_type(name, "processor", &entry.kind, self.processors.keys()))?;
        ctor(name, entry)
    }

    pub fn build_output(&self, name: &str, entry: &ComponentEntry) -> Result<Box<dyn OutputWriter>> {
        let ctor = self
            .outputs
            .get(&entry.kind)
            .ok_or_else(|| unknown_type(name, "output", &entry.kind, self.outputs.keys()))?;
        ctor(name, entry)
    }
}

fn unknown_type<'a>(
    name: &str,
    family: &str,
    kind: &str,
    known: impl Iterator<Item = &'a String>,
) -> ArkiverError {
    let known: Vec<&str> = known.map(String::as_str).collect();
    ArkiverError::config(
        name,
        format!(
            "unknown {} type '{}'. Available: {}",
            family,
            kind,
            known.join(", ")
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_keys() {
        let registry = Registry::with_builtins();
        assert!(registry.has_extractor("conversation_json"));
        assert!(registry.has_extractor("conversation"));
        assert!(registry.has_extractor("text_file"));
        assert!(registry.has_processor("keyword"));
        assert!(registry.has_processor("regex"));
        assert!(registry.has_output("text_file"));
        assert!(registry.has_output("json"));
        assert!(!registry.has_output("csv"));
    }

    #[test]
    fn test_unknown_type_is_configuration_error() {
        let registry = Registry::with_builtins();
        let err = registry
            .build_output("report", &ComponentEntry::new("csv"))
            .err()
            .unwrap();
        match err {
            ArkiverError::Configuration { component, reason } => {
                assert_eq!(component, "report");
                assert!(reason.contains("csv"));
                assert!(reason.contains("json, text_file"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_registry_knows_nothing() {
        let registry = Registry::new();
        assert!(!registry.has_processor("keyword"));
        assert!(registry
            .build_processor("kw", &ComponentEntry::new("keyword"))
            .is_err());
    }
}
