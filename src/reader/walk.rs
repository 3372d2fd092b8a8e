//! Recursive mailbox traversal written once against folder/message capabilities
//!
//! Any hierarchical container plugs in by implementing [`MailFolder`] and
//! [`MailMessage`]. The walk processes a folder's own messages first, then
//! descends into each subfolder depth-first. Sibling order is whatever the
//! container enumerates and is not guaranteed to be stable across runs.

use crate::context::RunContext;
use crate::email::{NativeRecord, RawTimestamp};
use crate::error::Result;
use crate::identity::extract_email_address;
use log::{debug, trace};
use regex::Regex;
use std::sync::LazyLock;

/// `Message-ID:` header line (case-sensitive key)
static MESSAGE_ID_LINE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^Message-ID:[ \t]*([^\r\n]*)").expect("Invalid MESSAGE_ID_LINE_REGEX pattern")
});

/// `From:` header line (case-sensitive key)
static FROM_LINE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^From:[ \t]*([^\r\n]*)").expect("Invalid FROM_LINE_REGEX pattern")
});

/// Fields a hierarchical container message can be asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageField {
    Subject,
    SenderName,
    TransportHeaders,
    PlainBody,
    /// Decompressed RTF, used when there is no plain body
    RichBody,
    DeliveryTime,
}

/// A field value as stored by the container
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Bytes(Vec<u8>),
    /// 100ns ticks since 1601-01-01 UTC
    FileTime(i64),
}

impl FieldValue {
    /// Text view of the value; byte payloads are decoded as lossy UTF-8
    #[must_use]
    pub fn into_text(self) -> Option<String> {
        match self {
            Self::Text(text) => Some(text),
            Self::Bytes(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
            Self::FileTime(_) => None,
        }
    }
}

/// Read access to one message inside a hierarchical container
pub trait MailMessage {
    /// Field lookup; `None` when the message does not carry the field
    fn read_field(&self, field: MessageField) -> Option<FieldValue>;
}

/// Enumeration of one folder inside a hierarchical container
pub trait MailFolder: Sized {
    type Message: MailMessage;

    fn display_name(&self) -> Option<String>;

    fn message_count(&self) -> usize;

    fn message(&self, index: usize) -> Result<Self::Message>;

    fn subfolder_count(&self) -> usize;

    fn subfolder(&self, index: usize) -> Result<Self>;
}

/// Walk `folder` and everything below it, appending one record per readable message
///
/// Failures on a single message or subfolder are recorded in `ctx` and the
/// walk moves on to the next sibling.
pub fn walk_folder<F: MailFolder>(
    folder: &F,
    folder_path: &str,
    ctx: &mut RunContext,
    records: &mut Vec<NativeRecord>,
) {
    let message_count = folder.message_count();
    trace!("{folder_path}: {message_count} messages");

    for index in 0..message_count {
        match folder.message(index) {
            Ok(message) => {
                records.push(extract_record(&message, format!("{folder_path}#{index}")));
                ctx.message_read();
            }
            Err(e) => {
                ctx.message_failed();
                ctx.warn(format!("Error processing message {index} in {folder_path}: {e}"));
            }
        }
    }

    for index in 0..folder.subfolder_count() {
        match folder.subfolder(index) {
            Ok(subfolder) => {
                let name = subfolder
                    .display_name()
                    .filter(|n| !n.is_empty())
                    .unwrap_or_else(|| format!("folder_{index}"));
                let child_path = format!("{folder_path}/{name}");
                debug!("Entering folder {child_path}");
                walk_folder(&subfolder, &child_path, ctx, records);
            }
            Err(e) => {
                ctx.folder_failed();
                ctx.warn(format!("Error processing subfolder {index} in {folder_path}: {e}"));
            }
        }
    }
}

/// Pull the native field set out of one hierarchical-container message
pub fn extract_record<M: MailMessage>(message: &M, origin: String) -> NativeRecord {
    let text = |field| message.read_field(field).and_then(FieldValue::into_text);

    let headers = text(MessageField::TransportHeaders).filter(|h| !h.is_empty());

    let message_id = headers.as_deref().and_then(message_id_from_headers);
    let sender_email = headers.as_deref().and_then(sender_from_headers);

    let body = text(MessageField::PlainBody)
        .filter(|b| !b.is_empty())
        .or_else(|| text(MessageField::RichBody).filter(|b| !b.is_empty()));

    let sent_at = match message.read_field(MessageField::DeliveryTime) {
        Some(FieldValue::FileTime(ticks)) => Some(RawTimestamp::FileTime(ticks)),
        Some(other) => other.into_text().map(RawTimestamp::Text),
        None => None,
    };

    NativeRecord {
        subject: text(MessageField::Subject),
        message_id,
        sender_name: text(MessageField::SenderName),
        sender_email,
        body,
        sent_at,
        origin,
    }
}

/// Remainder of the first `Message-ID:` line, trimmed
#[must_use]
pub fn message_id_from_headers(headers: &str) -> Option<String> {
    MESSAGE_ID_LINE_REGEX
        .captures(headers)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|id| !id.is_empty())
}

/// First address on the first `From:` line
#[must_use]
pub fn sender_from_headers(headers: &str) -> Option<String> {
    FROM_LINE_REGEX
        .captures(headers)
        .and_then(|caps| caps.get(1))
        .and_then(|m| extract_email_address(m.as_str()))
}
