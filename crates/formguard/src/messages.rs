//! Human-readable error messages.
//!
//! Resolution order: built-in defaults, then configuration overrides,
//! then overrides carried by the form definition. An empty override
//! string keeps whatever message was there before.

use std::collections::{BTreeMap, HashMap};

use formguard_common::definition::FORM_MESSAGE_COUNT;
use formguard_common::{Failure, FormDefinition};

/// Message key for an empty password field
pub const NO_PASSWORD_KEY: &str = "nopassword";

/// Message key for a select/radio value outside its allowed list
pub const SELECT_NO_VALUE_KEY: &str = "selectnovalue";

/// Used when no message is registered for a rule
pub const GENERIC_FIELD_MESSAGE: &str = "This field contains an error";

const DEFAULT_FORM_MESSAGES: [&str; FORM_MESSAGE_COUNT] = [
    "",
    "The form contains errors. Please correct these errors and submit again.",
    "Your form has expired. Please try again.",
    "The submission of this form appeared to be automated. Please wait a few seconds and try again.",
    "There was an error processing your form. Please try again.",
    "Your browser must support cookies and have them enabled in order to submit this form.",
    "ERROR: There was an error processing your form. Please try again.",
];

const DEFAULT_FIELD_MESSAGES: &[(&str, &str)] = &[
    ("email", "Please enter a valid email address"),
    ("empty", "Please leave this field empty"),
    ("max25", "This field can have no more than 25 characters"),
    ("max5000", "This field must have fewer than 5000 characters"),
    ("message", "Please enter fewer than 5000 characters"),
    ("min2", "This field must have at least 2 characters"),
    ("name", "Please only use letters, spaces, and numbers"),
    (NO_PASSWORD_KEY, "Please enter your password"),
    ("required", "This field is required"),
    (SELECT_NO_VALUE_KEY, "Please choose one of the listed options"),
    ("turing", "This field is not correct"),
    ("usTelephone", "Please enter a valid US telephone number"),
];

/// Resolved message tables for one form
#[derive(Debug, Clone)]
pub struct Messages {
    form: Vec<String>,
    fields: HashMap<String, String>,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            form: DEFAULT_FORM_MESSAGES.iter().map(|m| m.to_string()).collect(),
            fields: DEFAULT_FIELD_MESSAGES
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}

impl Messages {
    /// Apply overrides; extra form messages past the table are ignored
    pub fn with_overrides(mut self, form: &[String], fields: &BTreeMap<String, String>) -> Self {
        for (slot, custom) in self.form.iter_mut().zip(form) {
            if !custom.is_empty() {
                *slot = custom.clone();
            }
        }
        for (key, custom) in fields {
            if !custom.is_empty() {
                self.fields.insert(key.clone(), custom.clone());
            }
        }
        self
    }

    pub fn with_definition(self, definition: &FormDefinition) -> Self {
        self.with_overrides(&definition.form_error_messages, &definition.field_error_messages)
    }

    /// Top-level message for a failure
    pub fn form_message(&self, failure: Failure) -> &str {
        self.form
            .get(failure.code() as usize)
            .map(String::as_str)
            .unwrap_or(GENERIC_FIELD_MESSAGE)
    }

    /// Field message registered under a rule key
    pub fn field_message(&self, key: &str) -> &str {
        self.fields
            .get(key)
            .map(String::as_str)
            .unwrap_or(GENERIC_FIELD_MESSAGE)
    }
}
