//! Mailbox ingest library - Outlook MSG/PST normalization and sender deduplication

#![allow(clippy::multiple_crate_versions)] // Transitive dependencies

pub mod classify;
pub mod cli;
pub mod config;
pub mod context;
pub mod dedup;
pub mod email;
pub mod error;
pub mod identity;
pub mod normalize;
pub mod output;
pub mod pipeline;
pub mod reader;

pub use config::Config;
pub use context::{RunContext, RunReport};
pub use dedup::{deduplicate, DedupSummary, Deduplicator};
pub use email::Email;
pub use error::{IngestError, Result};
pub use identity::{extract_email_address, split_display_name};
pub use pipeline::IngestionPipeline;
pub use reader::{ContainerKind, SourceReader};
