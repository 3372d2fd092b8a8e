//! Container readers: one variant per container family

pub mod msg;
pub mod pst;
pub mod walk;

pub use msg::MsgReader;
pub use pst::PstReader;
pub use walk::{walk_folder, FieldValue, MailFolder, MailMessage, MessageField};

use crate::context::RunContext;
use crate::email::NativeRecord;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Container families, identified by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerKind {
    /// Single-message Outlook file
    Msg,
    /// Multi-folder Outlook mailbox
    Pst,
}

impl ContainerKind {
    pub const ALL: [Self; 2] = [Self::Msg, Self::Pst];

    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Msg => "msg",
            Self::Pst => "pst",
        }
    }

    /// Case-insensitive extension match
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?;
        Self::ALL
            .into_iter()
            .find(|kind| ext.eq_ignore_ascii_case(kind.extension()))
    }
}

impl fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Msg => "MSG",
            Self::Pst => "PST",
        })
    }
}

/// Reader for one container family
#[derive(Debug, Clone, Copy)]
pub enum SourceReader {
    Msg(MsgReader),
    Pst(PstReader),
}

impl SourceReader {
    #[must_use]
    pub const fn for_kind(kind: ContainerKind) -> Self {
        match kind {
            ContainerKind::Msg => Self::Msg(MsgReader::new()),
            ContainerKind::Pst => Self::Pst(PstReader::new()),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> ContainerKind {
        match self {
            Self::Msg(_) => ContainerKind::Msg,
            Self::Pst(_) => ContainerKind::Pst,
        }
    }

    /// Read every native record held by the container at `path`
    ///
    /// # Errors
    /// Returns an error when the container cannot be opened at all.
    pub fn read(&self, path: &Path, ctx: &mut RunContext) -> Result<Vec<NativeRecord>> {
        match self {
            Self::Msg(reader) => reader.read(path, ctx).map(|record| vec![record]),
            Self::Pst(reader) => reader.read(path, ctx),
        }
    }
}
