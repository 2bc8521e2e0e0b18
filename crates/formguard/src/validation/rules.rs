//! Single-rule evaluation for text-like fields.
//!
//! Everything here is pure except for the `email` rule's domain lookup,
//! which is handed back to the caller as [`Step::LookupDomain`].

use formguard_common::{FieldValue, Rule};

use super::patterns;
use super::sanitize::sanitize_text;

const MAX25_LIMIT: usize = 26;
const MAX5000_LIMIT: usize = 5000;
const MIN2_LIMIT: usize = 2;

/// Result of evaluating one rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Pass,
    /// Rule failed; `clear_value` asks for the stored value to be wiped
    Fail { clear_value: bool },
    /// Syntax passed; the rule still needs the domain to accept mail
    LookupDomain(String),
}

impl Step {
    fn fail_if(failed: bool) -> Self {
        if failed {
            Self::Fail { clear_value: false }
        } else {
            Self::Pass
        }
    }
}

/// Evaluate `rule` against `value`.
///
/// `message` rewrites the value in place before measuring it. Rules
/// that fail with `clear_value` are not cleared here; the caller does it
/// after recording the error. Unknown rule names always pass.
pub fn check(rule: &Rule, value: &mut FieldValue, challenge: &str) -> Step {
    match rule {
        Rule::Required => Step::fail_if(value.is_empty()),
        Rule::Email => match patterns::email_domain(value.as_text()) {
            Some(domain) => Step::LookupDomain(domain.to_string()),
            None => Step::Fail { clear_value: false },
        },
        Rule::Name => Step::fail_if(!patterns::is_name(value.as_text())),
        Rule::Max25 => Step::fail_if(value.as_text().len() >= MAX25_LIMIT),
        Rule::Max5000 => Step::fail_if(value.as_text().len() >= MAX5000_LIMIT),
        Rule::Message => {
            let cleaned = sanitize_text(value.as_text());
            let failed = cleaned.len() >= MAX5000_LIMIT;
            *value = FieldValue::Text(cleaned);
            Step::fail_if(failed)
        }
        Rule::Min2 => Step::fail_if(value.as_text().len() < MIN2_LIMIT),
        Rule::UsTelephone => Step::fail_if(!patterns::is_us_telephone(value.as_text())),
        Rule::Turing => {
            if value.as_text() == challenge {
                Step::Pass
            } else {
                Step::Fail { clear_value: true }
            }
        }
        Rule::Empty => {
            if value.as_text().is_empty() && !value.is_checked() {
                Step::Pass
            } else {
                Step::Fail { clear_value: true }
            }
        }
        Rule::Other(_) => Step::Pass,
    }
}
