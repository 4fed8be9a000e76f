//! # Arkiver CLI (`arkiver`)
//!
//! Runs the extract → process → output pipeline described by a config file
//! and prints a summary of what was categorized and written.
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `arkiver run` | Run the pipeline (default when no command is given) |
//! | `arkiver init` | Write a starter config file |
//! | `arkiver sources` | List configured sources, processors, and outputs |
//! | `arkiver categorize "<text>"` | Match ad-hoc text against a keyword table |
//! | `arkiver regex "<text>"` | Match ad-hoc text against regex patterns |
//! | `arkiver conversations <file>` | List conversations in an export |
//! | `arkiver extract <path>` | Show the text content of a file or directory |
//!
//! ## Examples
//!
//! ```bash
//! arkiver init --conversations conversations.json --keywords keywords.json
//! arkiver run --config arkiver_config.json --verbose
//! arkiver categorize "Orion budget review" --keywords keywords.json
//! arkiver regex "see TICKET-12" --pattern 'tickets=ticket-\d+'
//! ```

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::collections::BTreeMap;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use arkiver::config::{Config, LoggingConfig, DEFAULT_CONFIG_PATH};
use arkiver::extractor_conversation::ConversationExtractor;
use arkiver::extractor_text::TextFileExtractor;
use arkiver::logging::init_logging;
use arkiver::models::{Evidence, Item, ItemPayload, RunResult};
use arkiver::output_text::{preview, PREVIEW_CHARS};
use arkiver::pipeline::Pipeline;
use arkiver::processor_keyword::KeywordProcessor;
use arkiver::processor_regex::RegexProcessor;
use arkiver::registry::Registry;
use arkiver::sources::list_sources;
use arkiver::traits::{Extractor, Processor};

/// Preview length for `arkiver extract`.
const EXTRACT_PREVIEW_CHARS: usize = 500;

/// Arkiver: sort conversation exports and text archives into per-project
/// files using keyword tables and regex patterns.
#[derive(Parser)]
#[command(name = "arkiver", version, about)]
struct Cli {
    /// Path to the configuration file (JSON, or TOML by `.toml` extension).
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Log at debug level regardless of the configured level.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the pipeline described by the config file.
    Run {
        /// Answer "yes" to the post-run deletion prompt.
        ///
        /// Only takes effect when `security.prompt_delete_outputs` is set.
        #[arg(long)]
        delete_outputs: bool,
    },

    /// Write a starter config file.
    Init {
        /// Conversation export to add as a source.
        #[arg(long)]
        conversations: Option<PathBuf>,

        /// Keyword table to add as a processor.
        #[arg(long)]
        keywords: Option<PathBuf>,

        /// Directory for the generated text files.
        #[arg(long, default_value = "output")]
        output_dir: PathBuf,

        /// Overwrite an existing config file.
        #[arg(long)]
        force: bool,
    },

    /// List configured sources, processors, and outputs.
    Sources,

    /// Match a piece of text against a keyword table.
    Categorize {
        /// Text to categorize.
        text: String,

        /// Keyword table (JSON object of project -> keywords).
        #[arg(long)]
        keywords: PathBuf,

        #[arg(long)]
        case_sensitive: bool,
    },

    /// Match a piece of text against regex patterns.
    Regex {
        /// Text to match.
        text: String,

        /// Category and pattern as `NAME=REGEX`; repeat for more categories.
        #[arg(long = "pattern", value_parser = parse_key_val, required = true)]
        patterns: Vec<(String, String)>,

        #[arg(long)]
        case_sensitive: bool,
    },

    /// List the conversations in an export with a short preview of each.
    Conversations {
        /// Conversation export (JSON array).
        path: PathBuf,

        /// Only list conversations whose title contains this text (any case).
        #[arg(long)]
        title_filter: Option<String>,
    },

    /// Show the title, length, and start of a text file, or of every
    /// `.txt`/`.md` file under a directory.
    Extract {
        path: PathBuf,
    },
}

/// Parse a `key=value` pair for `--pattern` arguments.
fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let pos = s
        .find('=')
        .ok_or_else(|| format!("invalid NAME=REGEX: no '=' found in '{}'", s))?;
    Ok((s[..pos].to_string(), s[pos + 1..].to_string()))
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match dispatch(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(1)
        }
    }
}

async fn dispatch(cli: Cli) -> Result<ExitCode> {
    match cli.command.unwrap_or(Commands::Run {
        delete_outputs: false,
    }) {
        Commands::Run { delete_outputs } => {
            let config = Config::load(&cli.config)?;
            init_logging(&config.logging, cli.verbose)?;
            run_pipeline(config, delete_outputs).await
        }
        Commands::Init {
            conversations,
            keywords,
            output_dir,
            force,
        } => {
            write_template(
                &cli.config,
                conversations.as_deref(),
                keywords.as_deref(),
                &output_dir,
                force,
            )?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Sources => {
            let config = Config::load(&cli.config)?;
            let mut stdout = std::io::stdout().lock();
            list_sources(&config, &Registry::with_builtins(), &mut stdout)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Categorize {
            text,
            keywords,
            case_sensitive,
        } => {
            init_logging(&LoggingConfig::default(), cli.verbose)?;
            categorize(&text, &keywords, case_sensitive)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Regex {
            text,
            patterns,
            case_sensitive,
        } => {
            init_logging(&LoggingConfig::default(), cli.verbose)?;
            match_patterns(&text, patterns, case_sensitive)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Conversations { path, title_filter } => {
            init_logging(&LoggingConfig::default(), cli.verbose)?;
            list_conversations(&path, title_filter)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Extract { path } => {
            init_logging(&LoggingConfig::default(), cli.verbose)?;
            show_text_content(&path)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn run_pipeline(config: Config, delete_outputs: bool) -> Result<ExitCode> {
    let task = tokio::task::spawn_blocking(move || {
        let pipeline = Pipeline::from_config(&config, &Registry::with_builtins());
        pipeline.run(|files| delete_outputs || confirm_delete(files))
    });

    tokio::select! {
        joined = task => {
            let result = joined.context("Pipeline task failed")?;
            print_summary(&result);
            Ok(if result.success { ExitCode::SUCCESS } else { ExitCode::from(1) })
        }
        _ = tokio::signal::ctrl_c() => {
            println!("interrupted");
            // The blocking task cannot be cancelled; leave without waiting for it.
            std::process::exit(1);
        }
    }
}

/// Ask on stdin whether generated files should be deleted.
///
/// Anything other than an explicit yes, including EOF, keeps the files.
fn confirm_delete(files: &[PathBuf]) -> bool {
    println!();
    println!("{} output files were written.", files.len());
    print!("Delete output files for security? (y/N): ");
    if std::io::stdout().flush().is_err() {
        return false;
    }

    let mut answer = String::new();
    match std::io::stdin().lock().read_line(&mut answer) {
        Ok(0) | Err(_) => false,
        Ok(_) => matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
    }
}

fn print_summary(result: &RunResult) {
    let stats = &result.statistics;
    if !result.success {
        println!("Run failed: {}", result.message);
        return;
    }

    println!("Extraction complete.");
    println!("  Items:         {}", stats.total_items);
    println!("  Categorized:   {}", stats.categorized_items);
    println!("  Uncategorized: {}", stats.uncategorized_items);
    println!(
        "  Projects ({}):  {}",
        stats.unique_projects,
        stats.projects.join(", ")
    );
    println!(
        "  Categories ({}): {}",
        stats.unique_categories,
        stats.categories.join(", ")
    );

    if result.cleaned_up {
        println!("Output files deleted ({}).", result.output_files.len());
    } else {
        println!("Output files ({}):", result.output_files.len());
        for path in &result.output_files {
            println!("  {}", path.display());
        }
    }
}

fn write_template(
    path: &Path,
    conversations: Option<&Path>,
    keywords: Option<&Path>,
    output_dir: &Path,
    force: bool,
) -> Result<()> {
    if path.exists() && !force {
        bail!(
            "Config file already exists: {} (use --force to overwrite)",
            path.display()
        );
    }
    Config::template(conversations, keywords, output_dir).save(path)?;
    println!("Wrote starter config to {}", path.display());
    Ok(())
}

fn categorize(text: &str, keywords: &Path, case_sensitive: bool) -> Result<()> {
    let processor = KeywordProcessor::from_file("categorize", keywords, case_sensitive)?;
    let item = Item {
        title: "input".to_string(),
        created_at: None,
        updated_at: None,
        source_name: "cli".to_string(),
        payload: ItemPayload::TextFile {
            path: PathBuf::from("-"),
            content: text.to_string(),
        },
    };
    let result = processor.process(&item, text)?;

    if !result.has_matches() {
        println!("No matching projects found.");
        return Ok(());
    }

    let projects: Vec<&str> = result.matched_categories.iter().map(String::as_str).collect();
    println!("Matched projects: {}", projects.join(", "));
    if let Evidence::Keyword {
        matched_keywords, ..
    } = &result.evidence
    {
        println!("Matched keywords: {}", matched_keywords.join(", "));
    }
    Ok(())
}

fn match_patterns(text: &str, patterns: Vec<(String, String)>, case_sensitive: bool) -> Result<()> {
    let patterns: BTreeMap<String, String> = patterns.into_iter().collect();
    let processor = RegexProcessor::new("regex", &patterns, case_sensitive)?;
    let item = Item {
        title: "input".to_string(),
        created_at: None,
        updated_at: None,
        source_name: "cli".to_string(),
        payload: ItemPayload::TextFile {
            path: PathBuf::from("-"),
            content: text.to_string(),
        },
    };
    let result = processor.process(&item, text)?;

    if !result.has_matches() {
        println!("No matching categories found.");
        return Ok(());
    }

    let categories: Vec<&str> = result.matched_categories.iter().map(String::as_str).collect();
    println!("Matched categories: {}", categories.join(", "));
    if let Evidence::Regex { matches } = &result.evidence {
        for (category, found) in matches {
            println!("  {}: {}", category, serde_json::to_string(found)?);
        }
    }
    Ok(())
}

fn list_conversations(path: &Path, title_filter: Option<String>) -> Result<()> {
    let mut extractor = ConversationExtractor::new("conversations", path);
    if let Some(filter) = title_filter {
        extractor = extractor.with_title_filter(filter);
    }

    let mut count = 0;
    for item in extractor.extract()? {
        count += 1;
        println!("{}. {}", count, item.title);
        println!("   Messages: {}", item.messages().len());
        println!("   Preview: {}", preview(&extractor.text_content(&item), PREVIEW_CHARS));
    }

    if count == 0 {
        println!("No conversations found.");
    } else {
        println!("Total conversations: {}", count);
    }
    Ok(())
}

fn show_text_content(path: &Path) -> Result<()> {
    let extractor = TextFileExtractor::new("extract", path)?;
    for item in extractor.extract()? {
        let text = extractor.text_content(&item);
        println!("Title: {}", item.title);
        println!("Length: {} characters", text.chars().count());
        println!("Preview: {}", preview(&text, EXTRACT_PREVIEW_CHARS));
        println!();
    }
    Ok(())
}
