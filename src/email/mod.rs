//! Canonical email record and the reader-side native record

mod timestamp;

pub use timestamp::{format_sent_at, RawTimestamp, SENT_AT_FORMAT};

use serde::{Deserialize, Serialize};

/// Canonical, normalized email record shared by every container reader
///
/// Field names serialize exactly as the downstream JSON artifacts expect.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Email {
    pub subject: String,
    pub message_id: String,
    /// Display name only, never an embedded address
    pub sender_name: String,
    pub sender_email: String,
    pub body: String,
    /// `DD/MM/YYYY - HHhMM`, or `None` when the source had no timestamp
    pub sent_at: Option<String>,
}

impl Email {
    /// Sender address as used for grouping: trimmed and lowercased
    #[must_use]
    pub fn normalized_sender(&self) -> String {
        self.sender_email.trim().to_lowercase()
    }
}

/// Unnormalized field set pulled straight out of a container
///
/// Every field is optional; [`crate::normalize::EmailNormalizer`] applies the
/// defaults and decides whether the record survives.
#[derive(Debug, Clone, Default)]
pub struct NativeRecord {
    pub subject: Option<String>,
    pub message_id: Option<String>,
    pub sender_name: Option<String>,
    pub sender_email: Option<String>,
    pub body: Option<String>,
    pub sent_at: Option<RawTimestamp>,
    /// File path, plus folder path for PST messages. Diagnostics only.
    pub origin: String,
}
