//! Compiled patterns for the text rules.

use regex::Regex;
use std::sync::LazyLock;

/// Letters, digits, underscore, and space only
static NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_ ]*$").expect("name pattern compiles"));

/// North American numbering plan: optional +1, optional area code
/// (bare or parenthesised), exchange, subscriber, optional extension.
/// Separators are ASCII whitespace only.
static US_TELEPHONE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^(?:(?:\+?1(?-u:\s)*(?:[.-](?-u:\s)*)?)?",
        r"(?:\((?-u:\s)*([2-9]1[02-9]|[2-9][02-8]1|[2-9][02-8][02-9])(?-u:\s)*\)",
        r"|([2-9]1[02-9]|[2-9][02-8]1|[2-9][02-8][02-9]))(?-u:\s)*(?:[.-](?-u:\s)*)?)?",
        r"([2-9]1[02-9]|[2-9][02-9]1|[2-9][02-9]{2})(?-u:\s)*(?:[.-](?-u:\s)*)?",
        r"([0-9]{4})",
        r"(?:(?-u:\s)*(?:#|x\.?|ext\.?|extension)(?-u:\s)*([0-9]+))?$",
    ))
    .expect("telephone pattern compiles")
});

/// Dot-atom local part, dotted hostname domain
static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+(?:\.[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+)*",
        r"@(?:[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?\.)+",
        r"[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?$",
    ))
    .expect("email pattern compiles")
});

const MAX_EMAIL_LEN: usize = 254;
const MAX_LOCAL_PART_LEN: usize = 64;

pub fn is_name(value: &str) -> bool {
    NAME.is_match(value)
}

pub fn is_us_telephone(value: &str) -> bool {
    US_TELEPHONE.is_match(value)
}

/// Syntactic address check; returns the domain part when it passes
pub fn email_domain(value: &str) -> Option<&str> {
    if value.len() > MAX_EMAIL_LEN || !EMAIL.is_match(value) {
        return None;
    }
    let (local, domain) = value.rsplit_once('@')?;
    if local.len() > MAX_LOCAL_PART_LEN {
        return None;
    }
    Some(domain)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_pattern() {
        assert!(is_name("Ann Lee_2"));
        assert!(is_name(""));
        assert!(!is_name("Ann-Lee"));
        assert!(!is_name("Zoë"));
    }

    #[test]
    fn test_us_telephone_accepts_common_shapes() {
        for number in [
            "555-0123",
            "(212) 555-0123",
            "212.555.0123",
            "+1 212 555 0123",
            "1-800-555-0199",
            "2125550123",
            "212-555-0123 ext. 42",
            "212-555-0123 x7",
            "212-555-0123 #12",
        ] {
            assert!(is_us_telephone(number), "{number} should be accepted");
        }
    }

    #[test]
    fn test_us_telephone_rejects_invalid_ranges() {
        for number in [
            "",
            "123-4567",
            "(112) 555-0123",
            "212-155-0123",
            "555-012",
            "phone me",
            "+44 20 7946 0958",
        ] {
            assert!(!is_us_telephone(number), "{number} should be rejected");
        }
    }

    #[test]
    fn test_us_telephone_separators_are_ascii_only() {
        assert!(is_us_telephone("212\t555 0123"));
        assert!(!is_us_telephone("212\u{00A0}555-0123"));
        assert!(!is_us_telephone("212-555-0123\u{2003}x7"));
    }

    #[test]
    fn test_email_domain() {
        assert_eq!(email_domain("a@b.com"), Some("b.com"));
        assert_eq!(email_domain("first.last+tag@mail.example.org"), Some("mail.example.org"));
        assert_eq!(email_domain("no-at-sign"), None);
        assert_eq!(email_domain("a@localhost"), None);
        assert_eq!(email_domain(".a@b.com"), None);
        assert_eq!(email_domain("a..b@b.com"), None);
        assert_eq!(email_domain("a@-b.com"), None);
        assert_eq!(email_domain(""), None);
    }
}
