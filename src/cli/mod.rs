//! CLI argument parsing using clap

use crate::reader::ContainerKind;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Mailbox ingest - normalize Outlook MSG/PST archives and deduplicate senders
#[derive(Parser, Debug)]
#[command(name = "mailbox-ingest")]
#[command(version)]
#[command(about = "Normalize Outlook MSG/PST archives into JSON and deduplicate by sender")]
#[command(long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Folder holding .msg files
    #[arg(long, global = true, default_value = "input/msg")]
    pub msg_input: PathBuf,

    /// Folder holding .pst files, or a single .pst file
    #[arg(long, global = true, default_value = "input/pst")]
    pub pst_input: PathBuf,

    /// Folder of unsorted files for `classify`
    #[arg(long, global = true, default_value = "input/unsorted")]
    pub unsorted: PathBuf,

    /// Folder for the per-format email artifacts
    #[arg(short, long, global = true, default_value = "output")]
    pub output: PathBuf,

    /// Folder for the deduplicated emails and summary
    #[arg(long, global = true, default_value = "output/deduplicated")]
    pub dedup_output: PathBuf,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Hide the progress bar
    #[arg(long, global = true)]
    pub no_progress: bool,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Move unsorted files into the MSG and PST input folders by extension
    Classify,
    /// Read containers and write one JSON array per format
    Ingest {
        /// Only ingest this format
        #[arg(long, value_enum)]
        only: Option<ContainerArg>,
    },
    /// Deduplicate the JSON arrays in the output folder by sender
    Dedup,
    /// Ingest PST, ingest MSG, then deduplicate
    Run,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerArg {
    Msg,
    Pst,
}

impl From<ContainerArg> for ContainerKind {
    fn from(arg: ContainerArg) -> Self {
        match arg {
            ContainerArg::Msg => Self::Msg,
            ContainerArg::Pst => Self::Pst,
        }
    }
}
