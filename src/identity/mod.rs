//! Sender identity recovery from unstructured text
//!
//! Header blocks, display strings like `"Jane Doe" <jane@corp.com>` and
//! free text all go through the same address pattern. Nothing here fails:
//! text with no recognisable address yields `None`.

use regex::Regex;
use std::sync::LazyLock;

/// Address shape: local part, `@`, a dotted domain whose final label is 2+ letters
static ADDRESS_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}")
        .expect("Invalid ADDRESS_REGEX pattern")
});

/// `Name <address>` with optional quotes around the name
static ANGLE_ADDRESS_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.*?)<([^<>]*)>").expect("Invalid ANGLE_ADDRESS_REGEX pattern"));

/// Return the first address-shaped substring of `text`, in document order
#[must_use]
pub fn extract_email_address(text: &str) -> Option<String> {
    ADDRESS_REGEX.find(text).map(|m| m.as_str().to_string())
}

/// Split a sender field into its display name and the address between `<` and `>`
///
/// A bare name comes back as the name with no address. A bare address comes
/// back unchanged as the name, since there are no delimiters to split on.
#[must_use]
pub fn split_display_name(sender: &str) -> (String, Option<String>) {
    if let Some(caps) = ANGLE_ADDRESS_REGEX.captures(sender) {
        let name = caps.get(1).map_or("", |m| m.as_str());
        let address = caps
            .get(2)
            .map(|m| m.as_str().trim().to_string())
            .filter(|a| !a.is_empty());
        return (strip_quotes(name), address);
    }

    (strip_quotes(sender), None)
}

fn strip_quotes(name: &str) -> String {
    name.trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_address_wins() {
        let text = "Reply to ops@corp.io or to admin@corp.io";
        assert_eq!(extract_email_address(text), Some("ops@corp.io".to_string()));
    }

    #[test]
    fn test_no_address() {
        assert_eq!(extract_email_address("John Doe"), None);
        assert_eq!(extract_email_address(""), None);
        assert_eq!(extract_email_address("user@localhost"), None);
        assert_eq!(extract_email_address("user@domain.c0m"), None);
    }

    #[test]
    fn test_header_block() {
        let headers = "From: John Doe <john@example.com>\r\nTo: jane@example.org\r\n";
        assert_eq!(
            extract_email_address(headers),
            Some("john@example.com".to_string())
        );
    }

    #[test]
    fn test_binary_contaminated_text() {
        let bytes = b"\xff\xfe\x00garbage\x80 bob.smith+tag@mail.example.co.uk\x00\xff";
        assert_eq!(
            extract_email_address(&String::from_utf8_lossy(bytes)),
            Some("bob.smith+tag@mail.example.co.uk".to_string())
        );
        assert_eq!(extract_email_address(&String::from_utf8_lossy(b"\xff\xfe\xfd")), None);
    }

    #[test]
    fn test_split_quoted_name() {
        let (name, address) = split_display_name("\"Doe, John\" <john@example.com>");
        assert_eq!(name, "Doe, John");
        assert_eq!(address, Some("john@example.com".to_string()));
    }

    #[test]
    fn test_split_unquoted_name() {
        let (name, address) = split_display_name("  Jane Roe   <jane@corp.com>");
        assert_eq!(name, "Jane Roe");
        assert_eq!(address, Some("jane@corp.com".to_string()));
    }

    #[test]
    fn test_split_bare_values() {
        assert_eq!(split_display_name("Jane Roe"), ("Jane Roe".to_string(), None));
        assert_eq!(
            split_display_name("jane@corp.com"),
            ("jane@corp.com".to_string(), None)
        );
        assert_eq!(split_display_name(""), (String::new(), None));
    }

    #[test]
    fn test_split_address_only_in_brackets() {
        let (name, address) = split_display_name("<jane@corp.com>");
        assert_eq!(name, "");
        assert_eq!(address, Some("jane@corp.com".to_string()));
    }
}
