use chrono::{DateTime, TimeZone, Utc};
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

use crate::config::ComponentEntry;
use crate::error::{ArkiverError, Result};
use crate::models::{Item, ItemPayload};
use crate::traits::{Extractor, ItemIter};

#[derive(Debug, Deserialize)]
struct TextSourceSettings {
    path: Option<PathBuf>,
    #[serde(default = "default_include_globs")]
    include_globs: Vec<String>,
    #[serde(default)]
    exclude_globs: Vec<String>,
    #[serde(default)]
    follow_symlinks: bool,
}

fn default_include_globs() -> Vec<String> {
    vec!["**/*.txt".to_string(), "**/*.md".to_string()]
}

/// Reads a single text file, or every matching file under a directory.
pub struct TextFileExtractor {
    name: String,
    path: PathBuf,
    include: GlobSet,
    exclude: GlobSet,
    follow_symlinks: bool,
}

impl TextFileExtractor {
    pub fn new(name: &str, path: impl Into<PathBuf>) -> Result<Self> {
        Self::build(name, path.into(), &default_include_globs(), &[], false)
    }

    pub fn from_entry(name: &str, entry: &ComponentEntry) -> Result<Self> {
        let settings: TextSourceSettings = entry.settings_as(name)?;
        let path = settings
            .path
            .ok_or_else(|| ArkiverError::config(name, "no 'path' specified for text source"))?;
        Self::build(
            name,
            path,
            &settings.include_globs,
            &settings.exclude_globs,
            settings.follow_symlinks,
        )
    }

    fn build(
        name: &str,
        path: PathBuf,
        include_globs: &[String],
        exclude_globs: &[String],
        follow_symlinks: bool,
    ) -> Result<Self> {
        let mut excludes = vec!["**/.git/**".to_string(), "**/node_modules/**".to_string()];
        excludes.extend(exclude_globs.iter().cloned());

        Ok(Self {
            name: name.to_string(),
            path,
            include: build_globset(name, include_globs)?,
            exclude: build_globset(name, &excludes)?,
            follow_symlinks,
        })
    }

    /// Matching files under the root directory, sorted by relative path.
    fn walk(&self) -> Result<Vec<(PathBuf, String)>> {
        let mut files = Vec::new();
        let walker = WalkDir::new(&self.path).follow_links(self.follow_symlinks);
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                // Depth 0 is the root itself; anything below it is skipped.
                Err(e) if e.depth() == 0 => {
                    return Err(ArkiverError::source_read(&self.name, &self.path, e));
                }
                Err(e) => {
                    warn!(source = %self.name, error = %e, "Skipping unreadable directory entry");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let relative = path.strip_prefix(&self.path).unwrap_or(path);
            let rel_str = relative.to_string_lossy().to_string();

            if self.exclude.is_match(&rel_str) || !self.include.is_match(&rel_str) {
                continue;
            }
            files.push((path.to_path_buf(), rel_str));
        }

        files.sort_by(|a, b| a.1.cmp(&b.1));
        Ok(files)
    }
}

impl Extractor for TextFileExtractor {
    fn name(&self) -> &str {
        &self.name
    }

    fn extractor_type(&self) -> &str {
        "text_file"
    }

    fn extract(&self) -> Result<ItemIter<'_>> {
        if self.path.is_dir() {
            let files = self.walk()?;
            let iter = files.into_iter().filter_map(move |(path, relative)| {
                match file_to_item(&self.name, &path, relative) {
                    Ok(item) => Some(item),
                    Err(e) => {
                        warn!(source = %self.name, error = %e, "Skipping unreadable file");
                        None
                    }
                }
            });
            return Ok(Box::new(iter));
        }

        let title = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.path.display().to_string());
        let item = file_to_item(&self.name, &self.path, title)?;
        Ok(Box::new(std::iter::once(item)))
    }
}

fn file_to_item(source_name: &str, path: &Path, title: String) -> Result<Item> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| ArkiverError::source_read(source_name, path, e))?;
    let modified = std::fs::metadata(path)
        .and_then(|m| m.modified())
        .ok()
        .and_then(system_time_to_datetime);

    Ok(Item {
        title,
        created_at: modified,
        updated_at: modified,
        source_name: source_name.to_string(),
        payload: ItemPayload::TextFile {
            path: path.to_path_buf(),
            content,
        },
    })
}

fn system_time_to_datetime(time: std::time::SystemTime) -> Option<DateTime<Utc>> {
    let secs = time
        .duration_since(std::time::SystemTime::UNIX_EPOCH)
        .ok()?
        .as_secs() as i64;
    Utc.timestamp_opt(secs, 0).single()
}

fn build_globset(name: &str, patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern)
            .map_err(|e| ArkiverError::config(name, format!("bad glob '{}': {}", pattern, e)))?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| ArkiverError::config(name, e.to_string()))
}
