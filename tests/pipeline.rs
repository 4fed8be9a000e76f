use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use arkiver::config::{ComponentEntry, Config};
use arkiver::pipeline::Pipeline;
use arkiver::registry::Registry;

fn conversation(title: &str, texts: &[&str]) -> serde_json::Value {
    let mapping: serde_json::Map<String, serde_json::Value> = texts
        .iter()
        .enumerate()
        .map(|(i, text)| {
            let role = if i % 2 == 0 { "user" } else { "assistant" };
            (
                format!("node-{}", i),
                json!({
                    "message": {
                        "author": { "role": role },
                        "content": { "content_type": "text", "parts": [text] }
                    }
                }),
            )
        })
        .collect();
    json!({
        "title": title,
        "create_time": 1700000000.0,
        "update_time": 1700000100.0,
        "mapping": mapping
    })
}

fn write_json(path: &Path, value: &serde_json::Value) -> PathBuf {
    fs::write(path, serde_json::to_string_pretty(value).unwrap()).unwrap();
    path.to_path_buf()
}

/// Conversation source + keyword processor + text output, all inside `root`.
fn base_config(root: &Path, conversations: serde_json::Value) -> Config {
    let chats = write_json(&root.join("conversations.json"), &conversations);
    let keywords = write_json(&root.join("keywords.json"), &json!({ "Orion": ["orion"] }));
    Config::template(Some(&chats), Some(&keywords), &root.join("output"))
}

fn run(config: &Config) -> arkiver::models::RunResult {
    Pipeline::from_config(config, &Registry::with_builtins()).run(|_| false)
}

#[test]
fn test_single_matching_conversation() {
    let tmp = TempDir::new().unwrap();
    let config = base_config(
        tmp.path(),
        json!([conversation("Budget chat", &["Project Orion budget review"])]),
    );

    let result = run(&config);
    assert!(result.success, "{}", result.message);
    assert_eq!(result.statistics.total_items, 1);
    assert_eq!(result.statistics.categorized_items, 1);
    assert_eq!(result.statistics.unique_projects, 1);
    assert_eq!(result.statistics.projects, vec!["Orion".to_string()]);

    let out = tmp.path().join("output");
    let orion = out.join("orion_messages.txt");
    assert_eq!(result.output_files, vec![orion.clone()]);
    assert!(!out.join("uncategorized_items.txt").exists());

    let content = fs::read_to_string(orion).unwrap();
    assert!(content.starts_with("=== ORION MESSAGES ===\nTotal items: 1\n"));
    assert_eq!(content.matches("=== Item ").count(), 1);
    assert!(content.contains("=== Item 1: Budget chat ==="));
    assert!(content.contains("  MATCH: Project Orion budget review"));
}

#[test]
fn test_empty_conversation_array_fails() {
    let tmp = TempDir::new().unwrap();
    let config = base_config(tmp.path(), json!([]));

    let result = run(&config);
    assert!(!result.success);
    assert!(result.output_files.is_empty());
    assert!(!tmp.path().join("output").join("uncategorized_items.txt").exists());
}

#[test]
fn test_disabled_processor_never_contributes() {
    let tmp = TempDir::new().unwrap();
    let mut config = base_config(
        tmp.path(),
        json!([conversation("Budget chat", &["Project Orion budget review"])]),
    );
    let mut regex = ComponentEntry::new("regex").with("patterns", json!({ "budget": "budget" }));
    regex.enabled = false;
    config.processors.insert("patterns".to_string(), regex);
    config.outputs.insert(
        "dump".to_string(),
        ComponentEntry::new("json")
            .with("output_dir", tmp.path().join("json").to_string_lossy().to_string()),
    );

    let result = run(&config);
    assert!(result.success);
    assert_eq!(result.statistics.unique_categories, 0);

    let doc: serde_json::Value = serde_json::from_str(
        &fs::read_to_string(tmp.path().join("json").join("extraction_results.json")).unwrap(),
    )
    .unwrap();
    let results = doc["results"][0]["processing_results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["processor_name"], "keyword_matcher");
}

#[test]
fn test_broken_source_is_isolated() {
    let tmp = TempDir::new().unwrap();
    let mut config = base_config(
        tmp.path(),
        json!([conversation("Budget chat", &["Project Orion budget review"])]),
    );
    config.data_sources.insert(
        "missing".to_string(),
        ComponentEntry::new("conversation_json")
            .with("path", tmp.path().join("nope.json").to_string_lossy().to_string()),
    );
    config
        .data_sources
        .insert("untyped".to_string(), ComponentEntry::new("mbox"));

    let result = run(&config);
    assert!(result.success);
    assert_eq!(result.statistics.total_items, 1);
}

#[test]
fn test_mixed_sources_and_processors() {
    let tmp = TempDir::new().unwrap();
    let mut config = base_config(
        tmp.path(),
        json!([
            conversation("Budget chat", &["hello", "orion launch", "see TICKET-9"]),
            conversation("Garden", &["tomatoes are ripe"]),
        ]),
    );

    let notes = tmp.path().join("notes");
    fs::create_dir_all(notes.join("sub")).unwrap();
    fs::write(notes.join("a.md"), "Orion retro and TICKET-12").unwrap();
    fs::write(notes.join("sub").join("b.txt"), "nothing here").unwrap();
    fs::write(notes.join("skip.bin"), "orion").unwrap();
    config.data_sources.insert(
        "notes".to_string(),
        ComponentEntry::new("text_file").with("path", notes.to_string_lossy().to_string()),
    );
    config.processors.insert(
        "patterns".to_string(),
        ComponentEntry::new("regex").with("patterns", json!({ "tickets": r"ticket-\d+" })),
    );

    let result = run(&config);
    assert!(result.success);
    let stats = &result.statistics;
    assert_eq!(stats.total_items, 4);
    assert_eq!(stats.categorized_items, 2);
    assert_eq!(stats.uncategorized_items, 2);
    assert_eq!(stats.projects, vec!["Orion".to_string()]);
    assert_eq!(stats.categories, vec!["tickets".to_string()]);

    let out = tmp.path().join("output");
    let tickets = fs::read_to_string(out.join("tickets_messages.txt")).unwrap();
    assert!(tickets.contains("Total items: 2"));
    assert!(tickets.contains("Also matches: Orion"));

    let uncategorized = fs::read_to_string(out.join("uncategorized_items.txt")).unwrap();
    assert!(uncategorized.contains("Found 2 items without matching criteria:"));
    assert!(uncategorized.contains("- Garden"));
    assert!(uncategorized.contains("- sub/b.txt"));
}

#[test]
fn test_cleanup_deletes_only_when_confirmed() {
    let tmp = TempDir::new().unwrap();
    let mut config = base_config(
        tmp.path(),
        json!([conversation("Budget chat", &["Project Orion budget review"])]),
    );
    config.security.prompt_delete_outputs = true;
    let pipeline = Pipeline::from_config(&config, &Registry::with_builtins());

    let kept = pipeline.run(|_| false);
    assert!(!kept.cleaned_up);
    assert!(kept.output_files.iter().all(|p| p.exists()));

    let removed = pipeline.run(|_| true);
    assert!(removed.cleaned_up);
    assert!(removed.output_files.iter().all(|p| !p.exists()));
}

#[test]
fn test_config_file_roundtrip_drives_run() {
    let tmp = TempDir::new().unwrap();
    let config = base_config(
        tmp.path(),
        json!([conversation("Budget chat", &["Project Orion budget review"])]),
    );
    let path = tmp.path().join("arkiver_config.toml");
    config.save(&path).unwrap();

    let loaded = Config::load(&path).unwrap();
    assert_eq!(loaded, config);
    assert!(run(&loaded).success);
}
