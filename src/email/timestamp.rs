//! Timestamp sources and the `DD/MM/YYYY - HHhMM` rendering

use chrono::{DateTime, FixedOffset};

/// chrono format string for the `sentAt` field
pub const SENT_AT_FORMAT: &str = "%d/%m/%Y - %Hh%M";

/// Seconds between 1601-01-01 (FILETIME epoch) and 1970-01-01
const FILETIME_UNIX_OFFSET_SECS: i64 = 11_644_473_600;

/// 100ns ticks per second
const FILETIME_TICKS_PER_SEC: i64 = 10_000_000;

/// A timestamp as found in a container, before formatting
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawTimestamp {
    /// MAPI `PT_SYSTIME`: 100ns ticks since 1601-01-01 UTC
    FileTime(i64),
    /// Seconds since the Unix epoch, rendered in UTC
    UnixSeconds(i64),
    /// A `Date:` header with its own offset, rendered as the sender's wall clock
    Zoned(DateTime<FixedOffset>),
    /// A date value that could not be parsed, kept verbatim
    Text(String),
}

impl RawTimestamp {
    fn unix_seconds(&self) -> Option<i64> {
        match self {
            Self::FileTime(ticks) => {
                Some(ticks.div_euclid(FILETIME_TICKS_PER_SEC) - FILETIME_UNIX_OFFSET_SECS)
            }
            Self::UnixSeconds(secs) => Some(*secs),
            Self::Zoned(_) | Self::Text(_) => None,
        }
    }
}

impl std::fmt::Display for RawTimestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FileTime(ticks) => write!(f, "{ticks}"),
            Self::UnixSeconds(secs) => write!(f, "{secs}"),
            Self::Zoned(dt) => write!(f, "{}", dt.to_rfc2822()),
            Self::Text(text) => f.write_str(text),
        }
    }
}

/// Render a timestamp for the `sentAt` field
///
/// Absent stays absent. A value that cannot be turned into a calendar date
/// falls back to its plain string form instead of failing.
#[must_use]
pub fn format_sent_at(raw: Option<&RawTimestamp>) -> Option<String> {
    let raw = raw?;
    if let RawTimestamp::Zoned(dt) = raw {
        return Some(dt.format(SENT_AT_FORMAT).to_string());
    }
    let formatted = raw
        .unix_seconds()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .map_or_else(|| raw.to_string(), |dt| dt.format(SENT_AT_FORMAT).to_string());
    Some(formatted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent() {
        assert_eq!(format_sent_at(None), None);
    }

    #[test]
    fn test_unix_seconds() {
        // 2024-03-05 14:07:00 UTC
        let raw = RawTimestamp::UnixSeconds(1_709_647_620);
        assert_eq!(format_sent_at(Some(&raw)).as_deref(), Some("05/03/2024 - 14h07"));
    }

    #[test]
    fn test_zoned_keeps_sender_offset() {
        let dt = DateTime::parse_from_rfc2822("Tue, 5 Mar 2024 16:07:00 +0200").unwrap();
        let raw = RawTimestamp::Zoned(dt);
        assert_eq!(format_sent_at(Some(&raw)).as_deref(), Some("05/03/2024 - 16h07"));

        let dt = DateTime::parse_from_rfc2822("Mon, 4 Mar 2024 23:30:00 -0500").unwrap();
        let raw = RawTimestamp::Zoned(dt);
        assert_eq!(format_sent_at(Some(&raw)).as_deref(), Some("04/03/2024 - 23h30"));
    }

    #[test]
    fn test_filetime() {
        // 2024-03-05 14:07:00 UTC in FILETIME ticks
        let ticks = (1_709_647_620 + FILETIME_UNIX_OFFSET_SECS) * FILETIME_TICKS_PER_SEC;
        let raw = RawTimestamp::FileTime(ticks);
        assert_eq!(format_sent_at(Some(&raw)).as_deref(), Some("05/03/2024 - 14h07"));
    }

    #[test]
    fn test_out_of_range_falls_back() {
        let raw = RawTimestamp::UnixSeconds(i64::MAX);
        assert_eq!(format_sent_at(Some(&raw)), Some(i64::MAX.to_string()));
    }

    #[test]
    fn test_text_is_kept() {
        let raw = RawTimestamp::Text("sometime last week".to_string());
        assert_eq!(
            format_sent_at(Some(&raw)).as_deref(),
            Some("sometime last week")
        );
    }
}
