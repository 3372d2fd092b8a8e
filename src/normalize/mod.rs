//! Native record to canonical [`Email`] mapping

use crate::context::RunContext;
use crate::email::{format_sent_at, Email, NativeRecord};
use crate::identity::{extract_email_address, split_display_name};
use log::trace;

/// Maps reader output onto the canonical schema
///
/// Records without a recoverable sender address never leave this stage.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmailNormalizer;

impl EmailNormalizer {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Normalize one record, or drop it when it has no sender address
    pub fn normalize(&self, record: NativeRecord, ctx: &mut RunContext) -> Option<Email> {
        let NativeRecord {
            subject,
            message_id,
            sender_name,
            sender_email,
            body,
            sent_at,
            origin,
        } = record;

        let subject = subject.unwrap_or_default();
        let sender_email = resolve_sender_email(sender_email.as_deref());

        let Some(sender_email) = sender_email else {
            ctx.dropped_no_sender();
            ctx.warn(format!(
                "No sender email found in {origin} (subject: {:?})",
                truncate(&subject, 50)
            ));
            return None;
        };

        let email = Email {
            subject,
            message_id: message_id.map(|id| id.trim().to_string()).unwrap_or_default(),
            sender_name: clean_sender_name(sender_name.as_deref()),
            sender_email,
            body: body.unwrap_or_default(),
            sent_at: format_sent_at(sent_at.as_ref()),
        };

        ctx.email_emitted();
        trace!("Normalized email from {}: {}", email.sender_email, truncate(&email.subject, 50));

        Some(email)
    }
}

/// Keep an address that is already well-formed, otherwise recover one from the text
fn resolve_sender_email(raw: Option<&str>) -> Option<String> {
    let raw = raw.map(str::trim).filter(|s| !s.is_empty())?;
    extract_email_address(raw)
}

/// Sender names must not carry an embedded `<address>`
fn clean_sender_name(raw: Option<&str>) -> String {
    let Some(raw) = raw else {
        return String::new();
    };
    if raw.contains('<') && raw.contains('>') {
        let (name, _) = split_display_name(raw);
        return name;
    }
    raw.to_string()
}

fn truncate(text: &str, max_chars: usize) -> &str {
    text.char_indices()
        .nth(max_chars)
        .map_or(text, |(idx, _)| &text[..idx])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::email::RawTimestamp;

    fn record(sender_email: Option<&str>) -> NativeRecord {
        NativeRecord {
            subject: Some("Quarterly numbers".to_string()),
            sender_name: Some("\"Jane Roe\" <jane@corp.com>".to_string()),
            sender_email: sender_email.map(str::to_string),
            origin: "test.msg".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults_for_missing_fields() {
        let mut ctx = RunContext::new();
        let email = EmailNormalizer::new()
            .normalize(record(Some("jane@corp.com")), &mut ctx)
            .unwrap();

        assert_eq!(email.subject, "Quarterly numbers");
        assert_eq!(email.message_id, "");
        assert_eq!(email.body, "");
        assert_eq!(email.sent_at, None);
        assert_eq!(email.sender_name, "Jane Roe");
        assert_eq!(ctx.report().emails_emitted, 1);
    }

    #[test]
    fn test_missing_sender_is_dropped() {
        let mut ctx = RunContext::new();
        let normalizer = EmailNormalizer::new();

        assert!(normalizer.normalize(record(None), &mut ctx).is_none());
        assert!(normalizer.normalize(record(Some("   ")), &mut ctx).is_none());
        assert!(normalizer.normalize(record(Some("not an address")), &mut ctx).is_none());

        let report = ctx.finish();
        assert_eq!(report.dropped_no_sender, 3);
        assert_eq!(report.emails_emitted, 0);
        assert_eq!(report.warnings.len(), 3);
        assert!(report.warnings[0].contains("Quarterly numbers"));
    }

    #[test]
    fn test_sender_recovered_from_display_form() {
        let mut ctx = RunContext::new();
        let email = EmailNormalizer::new()
            .normalize(record(Some("Jane <Jane@Corp.com>")), &mut ctx)
            .unwrap();
        assert_eq!(email.sender_email, "Jane@Corp.com");
    }

    #[test]
    fn test_timestamp_is_formatted() {
        let mut ctx = RunContext::new();
        let mut native = record(Some("jane@corp.com"));
        native.sent_at = Some(RawTimestamp::UnixSeconds(1_709_647_620));

        let email = EmailNormalizer::new().normalize(native, &mut ctx).unwrap();
        assert_eq!(email.sent_at.as_deref(), Some("05/03/2024 - 14h07"));
    }

    #[test]
    fn test_truncate_multibyte() {
        assert_eq!(truncate("héllo wörld", 4), "héll");
        assert_eq!(truncate("short", 50), "short");
    }
}
