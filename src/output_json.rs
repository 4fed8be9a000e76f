//! Single-document JSON output.
//!
//! Writes every processed item, with its extracted text and all processor
//! results, to one file:
//!
//! ```json
//! { "version": "2.0.0", "total_items": 2, "results": [ ... ] }
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{info, warn};

use crate::config::{ComponentEntry, CONFIG_VERSION};
use crate::error::{ArkiverError, Result};
use crate::models::ProcessedItem;
use crate::traits::OutputWriter;

pub const DEFAULT_JSON_FILENAME: &str = "extraction_results.json";

#[derive(Debug, Deserialize)]
struct JsonOutputSettings {
    #[serde(default = "default_output_dir")]
    output_dir: PathBuf,
    #[serde(default = "default_pretty")]
    pretty_print: bool,
    #[serde(default = "default_filename")]
    filename: String,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}
fn default_pretty() -> bool {
    true
}
fn default_filename() -> String {
    DEFAULT_JSON_FILENAME.to_string()
}

#[derive(Serialize)]
struct JsonDocument<'a> {
    version: &'a str,
    total_items: usize,
    results: &'a [ProcessedItem],
}

pub struct JsonOutput {
    name: String,
    output_dir: PathBuf,
    pretty_print: bool,
    filename: String,
}

impl JsonOutput {
    pub fn new(name: &str, output_dir: impl Into<PathBuf>, pretty_print: bool) -> Self {
        Self {
            name: name.to_string(),
            output_dir: output_dir.into(),
            pretty_print,
            filename: default_filename(),
        }
    }

    pub fn from_entry(name: &str, entry: &ComponentEntry) -> Result<Self> {
        let settings: JsonOutputSettings = entry.settings_as(name)?;
        if settings.filename.trim().is_empty() {
            return Err(ArkiverError::config(name, "'filename' must not be empty"));
        }
        Ok(Self {
            name: name.to_string(),
            output_dir: settings.output_dir,
            pretty_print: settings.pretty_print,
            filename: settings.filename,
        })
    }

    fn write(&self, items: &[ProcessedItem]) -> Result<PathBuf> {
        let path = self.output_dir.join(&self.filename);
        std::fs::create_dir_all(&self.output_dir)
            .map_err(|e| ArkiverError::write(&self.output_dir, e))?;

        let doc = JsonDocument {
            version: CONFIG_VERSION,
            total_items: items.len(),
            results: items,
        };
        let json = if self.pretty_print {
            serde_json::to_string_pretty(&doc)
        } else {
            serde_json::to_string(&doc)
        }
        .map_err(|e| ArkiverError::write(&path, e))?;

        std::fs::write(&path, json).map_err(|e| ArkiverError::write(&path, e))?;
        Ok(path)
    }
}

impl OutputWriter for JsonOutput {
    fn name(&self) -> &str {
        &self.name
    }

    fn output_type(&self) -> &str {
        "json"
    }

    fn write_results(&self, items: &[ProcessedItem]) -> Vec<PathBuf> {
        match self.write(items) {
            Ok(path) => {
                info!(output = %self.name, path = %path.display(), items = items.len(), "Wrote JSON results");
                vec![path]
            }
            Err(e) => {
                warn!(output = %self.name, error = %e, "Skipping JSON output");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Evidence, Item, ItemPayload, ProcessingResult};
    use serde_json::Value;
    use std::collections::{BTreeMap, BTreeSet};
    use tempfile::TempDir;

    fn processed() -> ProcessedItem {
        let item = Item {
            title: "notes.txt".to_string(),
            created_at: None,
            updated_at: None,
            source_name: "notes".to_string(),
            payload: ItemPayload::TextFile {
                path: PathBuf::from("notes.txt"),
                content: "ticket-1".to_string(),
            },
        };
        ProcessedItem {
            text_content: item.text_content(),
            original_data: item,
            processing_results: vec![ProcessingResult::new(
                "re",
                BTreeSet::from(["ticket".to_string()]),
                Evidence::Regex {
                    matches: BTreeMap::new(),
                },
            )],
        }
    }

    #[test]
    fn test_document_shape() {
        let tmp = TempDir::new().unwrap();
        let output = JsonOutput::new("dump", tmp.path().join("json"), true);
        let written = output.write_results(&[processed()]);

        assert_eq!(written, vec![tmp.path().join("json").join(DEFAULT_JSON_FILENAME)]);
        let raw = std::fs::read_to_string(&written[0]).unwrap();
        assert!(raw.contains("\n  \"version\""));

        let doc: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(doc["version"], "2.0.0");
        assert_eq!(doc["total_items"], 1);
        let result = &doc["results"][0];
        assert_eq!(result["original_data"]["payload"]["type"], "text_file");
        assert_eq!(result["text_content"], "ticket-1");
        assert_eq!(result["processing_results"][0]["has_matches"], true);
        assert_eq!(result["processing_results"][0]["evidence"]["processor"], "regex");
    }

    #[test]
    fn test_compact_and_custom_filename() {
        let tmp = TempDir::new().unwrap();
        let entry = ComponentEntry::new("json")
            .with("output_dir", tmp.path().to_string_lossy().to_string())
            .with("pretty_print", false)
            .with("filename", "run.json");
        let output = JsonOutput::from_entry("dump", &entry).unwrap();
        let written = output.write_results(&[]);

        let raw = std::fs::read_to_string(&written[0]).unwrap();
        assert!(written[0].ends_with("run.json"));
        assert!(!raw.contains('\n'));
        assert_eq!(raw, r#"{"version":"2.0.0","total_items":0,"results":[]}"#);
    }
}
