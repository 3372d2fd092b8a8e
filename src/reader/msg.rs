//! Outlook MSG (single message) reading
//!
//! An MSG file is an OLE compound file. Variable-length MAPI properties live
//! in `__substg1.0_<ID><TYPE>` streams; fixed-size ones (timestamps) are
//! packed into the `__properties_version1.0` stream.

use crate::context::RunContext;
use crate::email::{NativeRecord, RawTimestamp};
use crate::error::{IngestError, Result};
use crate::identity::extract_email_address;
use cfb::CompoundFile;
use chrono::DateTime;
use log::{debug, trace};
use std::io::{Read, Seek};
use std::path::Path;

// MAPI Property IDs
const PR_SUBJECT: u16 = 0x0037;
const PR_CLIENT_SUBMIT_TIME: u16 = 0x0039;
const PR_TRANSPORT_MESSAGE_HEADERS: u16 = 0x007D;
const PR_SENDER_NAME: u16 = 0x0C1A;
const PR_SENDER_EMAIL_ADDRESS: u16 = 0x0C1F;
const PR_MESSAGE_DELIVERY_TIME: u16 = 0x0E06;
const PR_BODY: u16 = 0x1000;
const PR_INTERNET_MESSAGE_ID: u16 = 0x1035;
const PR_SENDER_SMTP_ADDRESS: u16 = 0x5D01;

// MAPI property types
const PT_STRING8: u16 = 0x001E;
const PT_UNICODE: u16 = 0x001F;
const PT_SYSTIME: u16 = 0x0040;

const PROPERTIES_STREAM: &str = "/__properties_version1.0";
/// Header preceding the property entries of a top-level message
const TOP_LEVEL_HEADER_LEN: usize = 32;
const PROPERTY_ENTRY_LEN: usize = 16;

/// Reads the single message held by an MSG file
#[derive(Debug, Default, Clone, Copy)]
pub struct MsgReader;

impl MsgReader {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Open `msg_path` and extract its native record
    ///
    /// The compound file handle is dropped before this returns, on success
    /// and on error alike.
    ///
    /// # Errors
    /// Returns an error when the file is missing or is not a compound file.
    pub fn read(&self, msg_path: &Path, ctx: &mut RunContext) -> Result<NativeRecord> {
        debug!("Opening MSG file: {}", msg_path.display());

        let file = cfb::open(msg_path)
            .map_err(|e| IngestError::Msg(format!("Failed to open MSG file: {e}")))?;
        let mut message = MsgProperties::new(file);

        let record = message.native_record(msg_path.display().to_string());
        ctx.message_read();

        Ok(record)
    }
}

/// Property accessors over an open compound file
struct MsgProperties<F> {
    file: CompoundFile<F>,
    fixed: Option<Vec<u8>>,
}

impl<F: Read + Seek> MsgProperties<F> {
    fn new(mut file: CompoundFile<F>) -> Self {
        let fixed = read_stream(&mut file, PROPERTIES_STREAM);
        Self { file, fixed }
    }

    fn native_record(&mut self, origin: String) -> NativeRecord {
        let headers = self
            .string(PR_TRANSPORT_MESSAGE_HEADERS)
            .map(|text| TransportHeaders::parse(&text))
            .unwrap_or_default();

        let sender_field = self.sender_field(&headers);
        let sender_email = resolve_sender_email(sender_field.as_deref(), &headers);

        let subject = self.string(PR_SUBJECT).or_else(|| headers.get("subject"));
        let message_id = self
            .string(PR_INTERNET_MESSAGE_ID)
            .or_else(|| headers.get("message-id"));
        let body = self.string(PR_BODY);

        let sent_at = headers
            .get("date")
            .map(|date| parse_header_date(&date))
            .or_else(|| self.systime(PR_CLIENT_SUBMIT_TIME).map(RawTimestamp::FileTime))
            .or_else(|| self.systime(PR_MESSAGE_DELIVERY_TIME).map(RawTimestamp::FileTime));

        trace!("{origin}: sender field {sender_field:?}, address {sender_email:?}");

        NativeRecord {
            subject,
            message_id,
            sender_name: sender_field,
            sender_email,
            body,
            sent_at,
            origin,
        }
    }

    /// The sender as a display string: the `From` header when present,
    /// otherwise `Name <address>` assembled from the sender properties
    fn sender_field(&mut self, headers: &TransportHeaders) -> Option<String> {
        if let Some(from) = headers.get("from").filter(|f| !f.trim().is_empty()) {
            return Some(from);
        }

        let name = self.string(PR_SENDER_NAME).filter(|n| !n.trim().is_empty());
        let address = self
            .string(PR_SENDER_SMTP_ADDRESS)
            .or_else(|| self.string(PR_SENDER_EMAIL_ADDRESS))
            .filter(|a| !a.trim().is_empty());

        match (name, address) {
            (Some(name), Some(address)) => Some(format!("{name} <{address}>")),
            (name, address) => name.or(address),
        }
    }

    /// A string property, Unicode stream first, then the 8-bit variant
    fn string(&mut self, prop_id: u16) -> Option<String> {
        if let Some(bytes) = read_stream(&mut self.file, &substg_path(prop_id, PT_UNICODE)) {
            return Some(decode_utf16le(&bytes));
        }
        read_stream(&mut self.file, &substg_path(prop_id, PT_STRING8)).map(|bytes| {
            String::from_utf8_lossy(&bytes)
                .trim_end_matches('\0')
                .to_string()
        })
    }

    /// A `PT_SYSTIME` value from the fixed-size property stream
    fn systime(&self, prop_id: u16) -> Option<i64> {
        let tag = (u32::from(prop_id) << 16) | u32::from(PT_SYSTIME);
        self.fixed
            .as_deref()?
            .get(TOP_LEVEL_HEADER_LEN..)?
            .chunks_exact(PROPERTY_ENTRY_LEN)
            .find(|entry| entry[..4] == tag.to_le_bytes())
            .and_then(|entry| entry[8..16].try_into().ok())
            .map(i64::from_le_bytes)
    }
}

/// Transport headers parsed into ordered `(key, value)` pairs
#[derive(Debug, Default, Clone)]
pub struct TransportHeaders {
    fields: Vec<(String, String)>,
}

impl TransportHeaders {
    /// Parse a raw header block; unparseable input gives an empty map
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let fields = mailparse::parse_headers(text.as_bytes())
            .map(|(headers, _)| {
                headers
                    .iter()
                    .map(|h| (h.get_key(), h.get_value()))
                    .collect()
            })
            .unwrap_or_default();
        Self { fields }
    }

    /// First value for `key`, compared case-insensitively
    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        self.fields
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.clone())
    }
}

/// Address from the sender field, then from the `From` header, else nothing
fn resolve_sender_email(sender_field: Option<&str>, headers: &TransportHeaders) -> Option<String> {
    sender_field
        .and_then(extract_email_address)
        .or_else(|| headers.get("from").as_deref().and_then(extract_email_address))
}

/// RFC 2822 keeps the header's own offset; mailparse's lenient parser only
/// recovers an instant, so it is the fallback
fn parse_header_date(value: &str) -> RawTimestamp {
    if let Ok(dt) = DateTime::parse_from_rfc2822(value.trim()) {
        return RawTimestamp::Zoned(dt);
    }
    mailparse::dateparse(value)
        .map_or_else(|_| RawTimestamp::Text(value.to_string()), RawTimestamp::UnixSeconds)
}

fn substg_path(prop_id: u16, prop_type: u16) -> String {
    format!("/__substg1.0_{prop_id:04X}{prop_type:04X}")
}

/// Whole stream contents, or `None` if absent or unreadable
fn read_stream<F: Read + Seek>(file: &mut CompoundFile<F>, path: &str) -> Option<Vec<u8>> {
    if !file.is_stream(path) {
        return None;
    }
    let mut stream = file.open_stream(path).ok()?;
    let mut buf = Vec::new();
    stream.read_to_end(&mut buf).ok()?;
    Some(buf)
}

fn decode_utf16le(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    String::from_utf16_lossy(&units)
        .trim_end_matches('\0')
        .to_string()
}
