//! Per-category text file output.
//!
//! Every category an item matched gets the item listed in that category's
//! file, so an item matching two projects appears in two files. Items with
//! no matches can be collected into `uncategorized_items.txt`.
//!
//! ```text
//! === ORION MESSAGES ===
//! Total items: 1
//!
//! === Item 1: Budget chat ===
//! Only matches this category
//! Context:
//!   MATCH: Project Orion budget review
//!
//! ```

use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::config::ComponentEntry;
use crate::error::{ArkiverError, Result};
use crate::models::{ItemKind, ProcessedItem};
use crate::traits::OutputWriter;

pub const UNCATEGORIZED_FILENAME: &str = "uncategorized_items.txt";
pub const PREVIEW_CHARS: usize = 200;

#[derive(Debug, Deserialize)]
struct TextOutputSettings {
    #[serde(default = "default_output_dir")]
    output_dir: PathBuf,
    #[serde(default = "default_true")]
    include_uncategorized: bool,
    #[serde(default = "default_true")]
    include_context: bool,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}
fn default_true() -> bool {
    true
}

pub struct TextFileOutput {
    name: String,
    output_dir: PathBuf,
    include_uncategorized: bool,
    include_context: bool,
}

impl TextFileOutput {
    pub fn new(name: &str, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            name: name.to_string(),
            output_dir: output_dir.into(),
            include_uncategorized: true,
            include_context: true,
        }
    }

    pub fn include_uncategorized(mut self, yes: bool) -> Self {
        self.include_uncategorized = yes;
        self
    }

    pub fn include_context(mut self, yes: bool) -> Self {
        self.include_context = yes;
        self
    }

    pub fn from_entry(name: &str, entry: &ComponentEntry) -> Result<Self> {
        let settings: TextOutputSettings = entry.settings_as(name)?;
        Ok(Self {
            name: name.to_string(),
            output_dir: settings.output_dir,
            include_uncategorized: settings.include_uncategorized,
            include_context: settings.include_context,
        })
    }

    fn render_category(&self, category: &str, items: &[&ProcessedItem]) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "=== {} MESSAGES ===", category.to_uppercase());
        let _ = writeln!(out, "Total items: {}", items.len());
        out.push('\n');

        for (i, item) in items.iter().enumerate() {
            let _ = writeln!(out, "=== Item {}: {} ===", i + 1, item.original_data.title);

            let others: Vec<String> = item
                .all_categories()
                .into_iter()
                .filter(|c| c != category)
                .collect();
            if others.is_empty() {
                out.push_str("Only matches this category\n");
            } else {
                let _ = writeln!(out, "Also matches: {}", others.join(", "));
            }

            if self.include_context && item.original_data.kind() == ItemKind::Conversation {
                write_context(&mut out, item);
            }
            out.push('\n');
        }
        out
    }

    fn render_uncategorized(&self, items: &[&ProcessedItem]) -> String {
        let mut out = String::new();
        out.push_str("=== UNCATEGORIZED ITEMS ===\n");
        let _ = writeln!(
            out,
            "Found {} items without matching criteria:",
            items.len()
        );
        out.push('\n');

        for item in items {
            let _ = writeln!(out, "- {}", item.original_data.title);
            let preview = preview(&item.original_data.text_content(), PREVIEW_CHARS);
            if !preview.trim().is_empty() {
                let _ = writeln!(out, "  Preview: {}", preview);
            }
            out.push('\n');
        }
        out
    }
}

/// Context windows from keyword results, each line indented two spaces.
fn write_context(out: &mut String, item: &ProcessedItem) {
    for result in &item.processing_results {
        let matches = result.detailed_matches();
        if matches.is_empty() {
            continue;
        }
        out.push_str("Context:\n");
        for m in matches {
            for line in m.context.render().split('\n') {
                let _ = writeln!(out, "  {}", line);
            }
            out.push('\n');
        }
    }
}

/// First `max_chars` characters, with `...` when truncated.
pub fn preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let head: String = text.chars().take(max_chars).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}

/// Filesystem-safe file name: lowercase, spaces to underscores, then only
/// `a-z0-9_-.` kept. Applying it twice changes nothing.
pub fn sanitize_filename(name: &str) -> String {
    name.to_lowercase()
        .replace(' ', "_")
        .chars()
        .filter(|c| matches!(c, 'a'..='z' | '0'..='9' | '_' | '-' | '.'))
        .collect()
}

/// Filename for one category's output.
pub fn category_filename(category: &str) -> String {
    sanitize_filename(&format!("{}_messages.txt", category))
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    std::fs::write(path, content).map_err(|e| ArkiverError::write(path, e))
}

impl OutputWriter for TextFileOutput {
    fn name(&self) -> &str {
        &self.name
    }

    fn output_type(&self) -> &str {
        "text_file"
    }

    fn write_results(&self, items: &[ProcessedItem]) -> Vec<PathBuf> {
        if let Err(e) = std::fs::create_dir_all(&self.output_dir) {
            let err = ArkiverError::write(&self.output_dir, e);
            warn!(output = %self.name, error = %err, "Cannot create output directory");
            return Vec::new();
        }

        let mut by_category: BTreeMap<String, Vec<&ProcessedItem>> = BTreeMap::new();
        let mut uncategorized: Vec<&ProcessedItem> = Vec::new();
        for item in items {
            if item.has_matches() {
                for category in item.all_categories() {
                    by_category.entry(category).or_default().push(item);
                }
            } else {
                uncategorized.push(item);
            }
        }

        let mut written = Vec::new();
        let mut claimed: BTreeMap<String, String> = BTreeMap::new();

        for (category, members) in &by_category {
            let filename = category_filename(category);
            if let Some(previous) = claimed.insert(filename.clone(), category.clone()) {
                warn!(
                    output = %self.name,
                    file = %filename,
                    "Categories '{}' and '{}' share a file name; the later one overwrites",
                    previous,
                    category
                );
            }

            let path = self.output_dir.join(&filename);
            match write_file(&path, &self.render_category(category, members)) {
                Ok(()) => {
                    info!(output = %self.name, path = %path.display(), items = members.len(), "Wrote category file");
                    if !written.contains(&path) {
                        written.push(path);
                    }
                }
                Err(e) => warn!(output = %self.name, error = %e, "Skipping category file"),
            }
        }

        if self.include_uncategorized && !uncategorized.is_empty() {
            let path = self.output_dir.join(UNCATEGORIZED_FILENAME);
            match write_file(&path, &self.render_uncategorized(&uncategorized)) {
                Ok(()) => {
                    info!(output = %self.name, path = %path.display(), items = uncategorized.len(), "Wrote uncategorized file");
                    written.push(path);
                }
                Err(e) => warn!(output = %self.name, error = %e, "Skipping uncategorized file"),
            }
        }

        written
    }
}
