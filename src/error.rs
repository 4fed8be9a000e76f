//! Error kinds raised by pipeline components.
//!
//! Every variant names the component it came from so a log line is enough
//! to find the offending config entry. None of these abort a run: the
//! pipeline logs them and skips the affected source, processor
//! contribution, or output file.

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced by extractors, processors, and output writers.
#[derive(Error, Debug)]
pub enum ArkiverError {
    /// A required setting is missing or invalid.
    #[error("configuration error in '{component}': {reason}")]
    Configuration { component: String, reason: String },

    /// An input file could not be read or parsed.
    #[error("cannot read source '{source_name}' ({}): {reason}", .path.display())]
    SourceRead {
        source_name: String,
        path: PathBuf,
        reason: String,
    },

    /// A processor failed on a single item.
    #[error("processor '{processor}' failed on '{title}': {reason}")]
    Processing {
        processor: String,
        title: String,
        reason: String,
    },

    /// An output target could not be written.
    #[error("cannot write {}: {reason}", .path.display())]
    Write { path: PathBuf, reason: String },
}

impl ArkiverError {
    pub fn config(component: impl Into<String>, reason: impl Into<String>) -> Self {
        ArkiverError::Configuration {
            component: component.into(),
            reason: reason.into(),
        }
    }

    pub fn source_read(
        source_name: impl Into<String>,
        path: impl Into<PathBuf>,
        reason: impl ToString,
    ) -> Self {
        ArkiverError::SourceRead {
            source_name: source_name.into(),
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn write(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        ArkiverError::Write {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ArkiverError>;
