//! Capability traits for the three pipeline stages.
//!
//! ```text
//! ┌────────────┐   ┌────────────┐   ┌──────────────┐
//! │ Extractor  │──▶│ Processor  │──▶│ OutputWriter │
//! │ conv/text  │   │ kw/regex   │   │ text/json    │
//! └────────────┘   └────────────┘   └──────────────┘
//! ```
//!
//! Concrete implementations are selected from config `type` keys by the
//! [`Registry`](crate::registry::Registry). Custom implementations can be
//! added to a registry before the pipeline is built.

use std::path::PathBuf;

use crate::error::Result;
use crate::models::{Item, ProcessedItem, ProcessingResult};

/// Lazy, one-shot sequence of extracted items.
pub type ItemIter<'a> = Box<dyn Iterator<Item = Item> + 'a>;

/// Turns one configured data source into items.
pub trait Extractor {
    /// Configured source name; copied onto every produced item.
    fn name(&self) -> &str;

    /// Registry key of this extractor.
    fn extractor_type(&self) -> &str;

    /// Read the source and yield its items.
    ///
    /// Fails with [`ArkiverError::SourceRead`](crate::error::ArkiverError::SourceRead)
    /// when the input cannot be read or parsed.
    fn extract(&self) -> Result<ItemIter<'_>>;

    /// Flat text for processors. Pure; repeated calls agree.
    fn text_content(&self, item: &Item) -> String {
        item.text_content()
    }
}

/// Labels an item with zero or more categories.
pub trait Processor {
    fn name(&self) -> &str;

    fn processor_type(&self) -> &str;

    /// Match `text` (the item's flat text) and return labels plus evidence.
    fn process(&self, item: &Item, text: &str) -> Result<ProcessingResult>;
}

/// Serializes processed items to one or more files.
pub trait OutputWriter {
    fn name(&self) -> &str;

    fn output_type(&self) -> &str;

    /// Write everything and return the paths that were actually written.
    ///
    /// A failure on one file is logged and that path is left out; it does
    /// not stop the remaining files.
    fn write_results(&self, items: &[ProcessedItem]) -> Vec<PathBuf>;
}
