//! Core types shared across Formguard components.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of form control a field is rendered as.
///
/// Kinds the engine has no special handling for deserialize as
/// [`FieldKind::Other`] and are validated by their rules like text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Textarea,
    Password,
    Select,
    Radio,
    Checkbox,
    #[serde(other)]
    Other,
}

impl FieldKind {
    /// Select and radio fields validate by membership in a value list
    pub fn is_choice(&self) -> bool {
        matches!(self, Self::Select | Self::Radio)
    }

    /// Checkbox data is simply absent from a post when unchecked
    pub fn is_toggle(&self) -> bool {
        matches!(self, Self::Checkbox)
    }
}

/// A named validation rule attached to a field.
///
/// Names that are not recognised are kept verbatim in [`Rule::Other`]
/// and always pass.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Rule {
    Required,
    Email,
    Name,
    Max25,
    Max5000,
    Message,
    Min2,
    UsTelephone,
    Turing,
    Empty,
    Other(String),
}

impl Rule {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Required => "required",
            Self::Email => "email",
            Self::Name => "name",
            Self::Max25 => "max25",
            Self::Max5000 => "max5000",
            Self::Message => "message",
            Self::Min2 => "min2",
            Self::UsTelephone => "usTelephone",
            Self::Turing => "turing",
            Self::Empty => "empty",
            Self::Other(name) => name,
        }
    }
}

impl From<String> for Rule {
    fn from(name: String) -> Self {
        match name.as_str() {
            "required" => Self::Required,
            "email" => Self::Email,
            "name" => Self::Name,
            "max25" => Self::Max25,
            "max5000" => Self::Max5000,
            "message" => Self::Message,
            "min2" => Self::Min2,
            "usTelephone" => Self::UsTelephone,
            "turing" => Self::Turing,
            "empty" => Self::Empty,
            _ => Self::Other(name),
        }
    }
}

impl From<&str> for Rule {
    fn from(name: &str) -> Self {
        Self::from(name.to_string())
    }
}

impl From<Rule> for String {
    fn from(rule: Rule) -> Self {
        match rule {
            Rule::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current value of a field.
///
/// Checkboxes that were not posted hold `Flag(false)`; everything else
/// holds the posted text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Flag(bool),
    Text(String),
}

impl FieldValue {
    /// Text view of the value; flags read as empty text
    pub fn as_text(&self) -> &str {
        match self {
            Self::Text(text) => text,
            Self::Flag(_) => "",
        }
    }

    /// Whether a toggle control counts as checked
    pub fn is_checked(&self) -> bool {
        match self {
            Self::Flag(checked) => *checked,
            Self::Text(text) => !text.is_empty(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Flag(checked) => !checked,
            Self::Text(text) => text.is_empty(),
        }
    }
}

impl Default for FieldValue {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

impl From<&str> for FieldValue {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flag(checked) => write!(f, "{}", checked),
            Self::Text(text) => f.write_str(text),
        }
    }
}

/// Per-field state kept in a form session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldState {
    pub value: FieldValue,

    #[serde(rename = "type")]
    pub kind: FieldKind,

    /// Rules evaluated in declared order
    pub rules: Vec<Rule>,

    /// Allowed values for select/radio fields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub possible_values: Option<Vec<String>>,

    pub error: bool,
    pub error_message: String,
}

impl FieldState {
    pub fn set_error(&mut self, message: impl Into<String>) {
        self.error = true;
        self.error_message = message.into();
    }

    pub fn clear_error(&mut self) {
        self.error = false;
        self.error_message.clear();
    }

    /// Empty value appropriate for the field kind
    pub fn blank_value(&self) -> FieldValue {
        if self.kind.is_toggle() {
            FieldValue::Flag(false)
        } else {
            FieldValue::default()
        }
    }
}

/// Why a protocol step was rejected.
///
/// Discriminants are the numeric codes reported to callers and the
/// indices of the top-level error message table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Failure {
    /// One or more fields failed validation
    DataInvalid = 1,
    /// Posted after the submission window closed
    Expired = 2,
    /// Posted before the minimum fill-in time elapsed
    TooFast = 3,
    /// Validation token missing, mismatched, or never issued
    BadValidationLink = 4,
    /// No initialized session (cookies disabled or steps out of order)
    CookiesOrOrderError = 5,
    /// Submission token missing, mismatched, or never issued
    BadSubmissionLink = 6,
}

impl Failure {
    pub const ALL: [Failure; 6] = [
        Failure::DataInvalid,
        Failure::Expired,
        Failure::TooFast,
        Failure::BadValidationLink,
        Failure::CookiesOrOrderError,
        Failure::BadSubmissionLink,
    ];

    pub fn code(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::DataInvalid => "data invalid",
            Self::Expired => "expired",
            Self::TooFast => "too fast",
            Self::BadValidationLink => "bad validation link",
            Self::CookiesOrOrderError => "cookies or order error",
            Self::BadSubmissionLink => "bad submission link",
        };
        f.write_str(name)
    }
}

/// Result of a protocol step that can be rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Passed,
    Rejected(Failure),
}

impl Outcome {
    pub fn is_passed(&self) -> bool {
        matches!(self, Self::Passed)
    }

    /// Numeric code: 0 for success, otherwise the failure code
    pub fn code(&self) -> u8 {
        match self {
            Self::Passed => 0,
            Self::Rejected(failure) => failure.code(),
        }
    }

    pub fn failure(&self) -> Option<Failure> {
        match self {
            Self::Passed => None,
            Self::Rejected(failure) => Some(*failure),
        }
    }
}

impl From<Failure> for Outcome {
    fn from(failure: Failure) -> Self {
        Self::Rejected(failure)
    }
}
