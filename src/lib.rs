//! # Arkiver
//!
//! A configurable extract → categorize → output pipeline for personal
//! archives such as chat-assistant conversation exports and folders of
//! notes.
//!
//! Sources turn files into [`Item`](models::Item)s, processors label each
//! item with projects (keyword tables) or categories (regex patterns), and
//! outputs write one text file per label or a single JSON document.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//! │   Sources    │──▶│  Processors  │──▶│   Outputs    │
//! │ conv / text  │   │ kw / regex   │   │ text / json  │
//! └──────────────┘   └──────────────┘   └──────────────┘
//!         ▲                  ▲                  ▲
//!         └──────── Registry (type key → ctor) ─┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! arkiver init --conversations conversations.json --keywords keywords.json
//! arkiver sources
//! arkiver run
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | JSON/TOML configuration parsing |
//! | [`error`] | Typed error kinds |
//! | [`models`] | Core data types |
//! | [`traits`] | Extractor, Processor, and OutputWriter traits |
//! | [`registry`] | Type key → constructor mapping |
//! | [`extractor_conversation`] | Conversation export source |
//! | [`extractor_text`] | Text file and directory source |
//! | [`processor_keyword`] | Keyword table matching with context windows |
//! | [`processor_regex`] | Regex pattern matching |
//! | [`output_text`] | Per-category text files |
//! | [`output_json`] | Single JSON document |
//! | [`pipeline`] | Run orchestration and statistics |
//! | [`sources`] | Configured component listing |
//! | [`logging`] | Subscriber setup for the binary |

pub mod config;
pub mod error;
pub mod extractor_conversation;
pub mod extractor_text;
pub mod logging;
pub mod models;
pub mod output_json;
pub mod output_text;
pub mod pipeline;
pub mod processor_keyword;
pub mod processor_regex;
pub mod registry;
pub mod sources;
pub mod traits;
