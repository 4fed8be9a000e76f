//! Pipeline orchestration.
//!
//! Runs the three phases strictly in order, each finishing for every
//! source or item before the next begins:
//!
//! ```text
//! Extract (every enabled source) → Process (every item × processor) → Output (every writer)
//! ```
//!
//! Failures stay inside their phase: a source that cannot be built or read
//! is skipped, a processor that fails on one item contributes nothing for
//! that item, and an output file that cannot be written is left out of the
//! returned list. A run only reports failure when extraction produced no
//! items at all.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::models::{Item, ProcessedItem, RunResult, RunStatistics};
use crate::registry::Registry;
use crate::traits::{Extractor, OutputWriter, Processor};

pub struct Pipeline {
    extractors: Vec<Box<dyn Extractor>>,
    processors: Vec<Box<dyn Processor>>,
    outputs: Vec<Box<dyn OutputWriter>>,
    prompt_delete_outputs: bool,
}

impl Pipeline {
    /// Assemble a pipeline from already-built components.
    pub fn new(
        extractors: Vec<Box<dyn Extractor>>,
        processors: Vec<Box<dyn Processor>>,
        outputs: Vec<Box<dyn OutputWriter>>,
    ) -> Self {
        Self {
            extractors,
            processors,
            outputs,
            prompt_delete_outputs: false,
        }
    }

    /// Offer post-run deletion of generated files.
    pub fn prompt_delete_outputs(mut self, yes: bool) -> Self {
        self.prompt_delete_outputs = yes;
        self
    }

    /// Build every enabled entry of `config` through `registry`.
    ///
    /// Entries that fail to build (unknown type, missing settings, bad
    /// keyword table) are logged and left out.
    pub fn from_config(config: &Config, registry: &Registry) -> Self {
        let mut extractors = Vec::new();
        for (name, entry) in config.enabled_sources() {
            match registry.build_extractor(name, entry) {
                Ok(extractor) => extractors.push(extractor),
                Err(e) => error!(source = %name, error = %e, "Skipping data source"),
            }
        }

        let mut processors = Vec::new();
        for (name, entry) in config.enabled_processors() {
            match registry.build_processor(name, entry) {
                Ok(processor) => processors.push(processor),
                Err(e) => error!(processor = %name, error = %e, "Skipping processor"),
            }
        }

        let mut outputs = Vec::new();
        for (name, entry) in config.enabled_outputs() {
            match registry.build_output(name, entry) {
                Ok(output) => outputs.push(output),
                Err(e) => error!(output = %name, error = %e, "Skipping output"),
            }
        }

        Self::new(extractors, processors, outputs)
            .prompt_delete_outputs(config.security.prompt_delete_outputs)
    }

    /// Extract phase: items from every source, in source order.
    pub fn extract_data(&self) -> Vec<Item> {
        let mut all_items = Vec::new();

        for extractor in &self.extractors {
            info!(source = extractor.name(), kind = extractor.extractor_type(), "Extracting data");
            match extractor.extract() {
                Ok(items) => {
                    let before = all_items.len();
                    all_items.extend(items);
                    info!(
                        source = extractor.name(),
                        items = all_items.len() - before,
                        "Extracted items"
                    );
                }
                Err(e) => error!(source = extractor.name(), error = %e, "Error extracting from source"),
            }
        }

        all_items
    }

    /// Process phase: every item through every processor.
    pub fn process_data(&self, items: Vec<Item>) -> Vec<ProcessedItem> {
        let by_source: HashMap<&str, &dyn Extractor> = self
            .extractors
            .iter()
            .map(|e| (e.name(), e.as_ref()))
            .collect();

        items
            .into_iter()
            .map(|item| {
                debug!(title = %item.title, "Processing item");
                let text_content = match by_source.get(item.source_name.as_str()) {
                    Some(extractor) => extractor.text_content(&item),
                    None => item.text_content(),
                };

                let mut processing_results = Vec::with_capacity(self.processors.len());
                for processor in &self.processors {
                    match processor.process(&item, &text_content) {
                        Ok(result) => processing_results.push(result),
                        Err(e) => error!(
                            processor = processor.name(),
                            title = %item.title,
                            error = %e,
                            "Processor failed on item"
                        ),
                    }
                }

                ProcessedItem {
                    original_data: item,
                    text_content,
                    processing_results,
                }
            })
            .collect()
    }

    /// Output phase: hand everything to every writer.
    pub fn generate_outputs(&self, items: &[ProcessedItem]) -> Vec<PathBuf> {
        let mut all_files = Vec::new();
        for output in &self.outputs {
            info!(output = output.name(), kind = output.output_type(), "Generating output");
            let files = output.write_results(items);
            info!(output = output.name(), files = files.len(), "Created output files");
            all_files.extend(files);
        }
        all_files
    }

    /// Run all three phases.
    ///
    /// When deletion prompting is on, `confirm_cleanup` is asked once with
    /// the written files; only `true` deletes them.
    pub fn run<F>(&self, confirm_cleanup: F) -> RunResult
    where
        F: FnOnce(&[PathBuf]) -> bool,
    {
        info!("Starting data extraction pipeline");

        let items = self.extract_data();
        if items.is_empty() {
            warn!("No data extracted from sources");
            return RunResult {
                success: false,
                statistics: RunStatistics::default(),
                output_files: Vec::new(),
                message: "No data extracted".to_string(),
                cleaned_up: false,
            };
        }

        let processed = self.process_data(items);
        let statistics = RunStatistics::from_items(&processed);
        info!(
            total = statistics.total_items,
            categorized = statistics.categorized_items,
            uncategorized = statistics.uncategorized_items,
            "Processing complete"
        );

        let output_files = self.generate_outputs(&processed);

        let mut cleaned_up = false;
        if self.prompt_delete_outputs && !output_files.is_empty() && confirm_cleanup(&output_files) {
            delete_outputs(&output_files);
            cleaned_up = true;
        }

        let message = format!(
            "Processed {} items ({} categorized), wrote {} files",
            statistics.total_items,
            statistics.categorized_items,
            output_files.len()
        );

        RunResult {
            success: true,
            statistics,
            output_files,
            message,
            cleaned_up,
        }
    }
}

/// Remove generated files; returns how many were deleted.
///
/// Files already gone are ignored.
pub fn delete_outputs(files: &[PathBuf]) -> usize {
    let mut deleted = 0;
    for path in files {
        match std::fs::remove_file(path) {
            Ok(()) => {
                info!(path = %path.display(), "Deleted");
                deleted += 1;
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!(path = %path.display(), error = %e, "Could not delete output file"),
        }
    }
    info!(deleted, "Output files deleted for security");
    deleted
}
