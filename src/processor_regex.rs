//! Regex pattern processor.
//!
//! Each configured category owns one pattern, compiled once. A category is
//! reported when its pattern matches at least once; the evidence lists
//! every non-overlapping match with `findall` shape: the matched text when
//! the pattern has no capture groups, the first group's text when it has
//! one, and all group texts otherwise (unmatched groups become `""`).

use regex::{Regex, RegexBuilder};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::config::ComponentEntry;
use crate::error::{ArkiverError, Result};
use crate::models::{Evidence, Item, ProcessingResult, RegexMatch};
use crate::traits::Processor;

#[derive(Debug, Deserialize)]
struct RegexSettings {
    patterns: Option<BTreeMap<String, String>>,
    #[serde(default)]
    case_sensitive: bool,
}

pub struct RegexProcessor {
    name: String,
    patterns: BTreeMap<String, Regex>,
}

impl RegexProcessor {
    pub fn from_entry(name: &str, entry: &ComponentEntry) -> Result<Self> {
        let settings: RegexSettings = entry.settings_as(name)?;
        let patterns = settings
            .patterns
            .ok_or_else(|| ArkiverError::config(name, "no 'patterns' specified for regex processor"))?;
        Self::new(name, &patterns, settings.case_sensitive)
    }

    pub fn new(name: &str, patterns: &BTreeMap<String, String>, case_sensitive: bool) -> Result<Self> {
        if patterns.is_empty() {
            return Err(ArkiverError::config(name, "regex processor has no patterns"));
        }

        let mut compiled = BTreeMap::new();
        for (category, pattern) in patterns {
            let regex = RegexBuilder::new(pattern)
                .case_insensitive(!case_sensitive)
                .build()
                .map_err(|e| {
                    ArkiverError::config(name, format!("invalid pattern for '{}': {}", category, e))
                })?;
            compiled.insert(category.clone(), regex);
        }

        Ok(Self {
            name: name.to_string(),
            patterns: compiled,
        })
    }
}

/// All non-overlapping matches of `regex` in `text`, shaped like `findall`.
fn find_all(regex: &Regex, text: &str) -> Vec<RegexMatch> {
    let groups = regex.captures_len() - 1;
    if groups == 0 {
        return regex
            .find_iter(text)
            .map(|m| RegexMatch::Text(m.as_str().to_string()))
            .collect();
    }

    regex
        .captures_iter(text)
        .map(|caps| {
            let group = |i: usize| caps.get(i).map(|m| m.as_str()).unwrap_or("").to_string();
            if groups == 1 {
                RegexMatch::Text(group(1))
            } else {
                RegexMatch::Groups((1..=groups).map(group).collect())
            }
        })
        .collect()
}

impl Processor for RegexProcessor {
    fn name(&self) -> &str {
        &self.name
    }

    fn processor_type(&self) -> &str {
        "regex"
    }

    fn process(&self, _item: &Item, text: &str) -> Result<ProcessingResult> {
        let mut matches = BTreeMap::new();
        let mut categories = BTreeSet::new();

        for (category, regex) in &self.patterns {
            let found = find_all(regex, text);
            if !found.is_empty() {
                categories.insert(category.clone());
                matches.insert(category.clone(), found);
            }
        }

        Ok(ProcessingResult::new(
            &self.name,
            categories,
            Evidence::Regex { matches },
        ))
    }
}
