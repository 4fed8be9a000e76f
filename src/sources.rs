use anyhow::Result;
use std::io::Write;

use crate::config::{ComponentEntry, Config};
use crate::registry::Registry;

#[derive(Debug, Clone, PartialEq)]
pub struct ComponentStatus {
    pub section: &'static str,
    pub name: String,
    pub kind: String,
    pub enabled: bool,
    /// Whether the registry knows the entry's type.
    pub known: bool,
}

/// Status of every configured component, sources first, then processors,
/// then outputs, each in name order.
pub fn component_statuses(config: &Config, registry: &Registry) -> Vec<ComponentStatus> {
    let mut statuses = Vec::new();
    let mut push = |section: &'static str, name: &String, entry: &ComponentEntry, known: bool| {
        statuses.push(ComponentStatus {
            section,
            name: name.clone(),
            kind: entry.kind.clone(),
            enabled: entry.enabled,
            known,
        });
    };

    for (name, entry) in &config.data_sources {
        push("source", name, entry, registry.has_extractor(&entry.kind));
    }
    for (name, entry) in &config.processors {
        push("processor", name, entry, registry.has_processor(&entry.kind));
    }
    for (name, entry) in &config.outputs {
        push("output", name, entry, registry.has_output(&entry.kind));
    }
    statuses
}

pub fn list_sources(config: &Config, registry: &Registry, out: &mut impl Write) -> Result<()> {
    let statuses = component_statuses(config, registry);
    if statuses.is_empty() {
        writeln!(out, "No components configured.")?;
        return Ok(());
    }

    writeln!(
        out,
        "{:<10} {:<20} {:<18} {:<8} STATUS",
        "SECTION", "NAME", "TYPE", "ENABLED"
    )?;
    for s in statuses {
        let status = if s.known { "OK" } else { "UNKNOWN TYPE" };
        writeln!(
            out,
            "{:<10} {:<20} {:<18} {:<8} {}",
            s.section, s.name, s.kind, s.enabled, status
        )?;
    }
    Ok(())
}
