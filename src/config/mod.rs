//! Configuration structures for mailbox ingestion

use crate::cli::Args;
use crate::error::{IngestError, Result};
use crate::reader::ContainerKind;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration shared by every stage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Folder holding .msg files
    pub msg_input_dir: PathBuf,

    /// Folder holding .pst files, or a single .pst file
    pub pst_input_dir: PathBuf,

    /// Folder the classifier sorts files out of
    pub unsorted_dir: PathBuf,

    /// Folder for `msg_emails_*.json` / `pst_emails_*.json`
    pub output_dir: PathBuf,

    /// Folder for `deduplicated_emails_*.json` and the summary
    pub dedup_output_dir: PathBuf,

    /// Enable debug logging
    pub debug_mode: bool,

    /// Draw a progress bar while ingesting
    pub show_progress: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            msg_input_dir: PathBuf::from("input/msg"),
            pst_input_dir: PathBuf::from("input/pst"),
            unsorted_dir: PathBuf::from("input/unsorted"),
            output_dir: PathBuf::from("output"),
            dedup_output_dir: PathBuf::from("output/deduplicated"),
            debug_mode: false,
            show_progress: true,
        }
    }
}

impl Config {
    /// Input location for a container family
    #[must_use]
    pub fn input_for(&self, kind: ContainerKind) -> &Path {
        match kind {
            ContainerKind::Msg => &self.msg_input_dir,
            ContainerKind::Pst => &self.pst_input_dir,
        }
    }

    /// Reject layouts where deduplication would read back its own output
    ///
    /// # Errors
    /// Returns [`IngestError::Config`] when the artifact and dedup folders coincide.
    pub fn validate(&self) -> Result<()> {
        if self.output_dir == self.dedup_output_dir {
            return Err(IngestError::Config(format!(
                "Deduplication output must differ from the artifact folder ({})",
                self.output_dir.display()
            )));
        }
        Ok(())
    }
}

impl From<&Args> for Config {
    fn from(args: &Args) -> Self {
        Self {
            msg_input_dir: args.msg_input.clone(),
            pst_input_dir: args.pst_input.clone(),
            unsorted_dir: args.unsorted.clone(),
            output_dir: args.output.clone(),
            dedup_output_dir: args.dedup_output.clone(),
            debug_mode: args.debug,
            show_progress: !args.no_progress,
        }
    }
}
