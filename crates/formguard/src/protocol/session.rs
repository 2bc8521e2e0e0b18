//! Per-client, per-form session record.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as _;

use formguard_common::constants::FAIL_TOKEN;
use formguard_common::{FieldState, FieldValue, FormDefinition};

/// Where a session stands in the initialize → validate → submit protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Never initialized (fresh session or lost cookies)
    Uninitialized,
    /// Waiting for a validation post
    Initialized,
    /// Validation passed, submission token issued
    Validated,
}

/// State tracked for one form across the protocol stages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormSession {
    pub form_name: String,

    /// Field name -> state; key set always equals the definition's
    pub fields: BTreeMap<String, FieldState>,

    /// Top-level error, empty when there is none
    pub form_error_message: String,

    pub validation_token: String,
    pub submission_token: String,

    /// Start of the current submission window (Unix seconds)
    pub initialized_at: Option<i64>,

    pub challenge_text: String,

    /// Number of protocol calls made on this session
    pub call_count: u64,

    /// Last seen client address
    pub client_address: Option<String>,

    /// Page views before the form, when the client reports them
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_counter: Option<String>,
}

impl FormSession {
    /// Brand new session for a definition
    pub fn new(definition: &FormDefinition) -> Self {
        Self {
            form_name: definition.form_name.clone(),
            fields: definition.initial_fields(),
            form_error_message: String::new(),
            validation_token: FAIL_TOKEN.to_string(),
            submission_token: FAIL_TOKEN.to_string(),
            initialized_at: None,
            challenge_text: String::new(),
            call_count: 0,
            client_address: None,
            page_counter: None,
        }
    }

    /// Resume a stored session (or start one) at the top of a request.
    ///
    /// Clears the previous request's form error, counts the call, and
    /// records the client. A stored field set that no longer matches the
    /// definition is rebuilt from the definition.
    pub fn open(stored: Option<Self>, definition: &FormDefinition, client: Option<&str>) -> Self {
        let mut session = match stored {
            Some(mut session) => {
                if !session.fields.keys().map(String::as_str).eq(definition.field_names()) {
                    tracing::warn!(
                        form = %definition.form_name,
                        "Stored fields differ from definition, resetting fields"
                    );
                    session.fields = definition.initial_fields();
                }
                session
            }
            None => Self::new(definition),
        };

        session.form_error_message.clear();
        session.call_count += 1;
        if let Some(client) = client {
            session.client_address = Some(client.to_string());
        }
        session
    }

    pub fn stage(&self) -> Stage {
        if self.initialized_at.is_none() {
            Stage::Uninitialized
        } else if self.submission_token != FAIL_TOKEN {
            Stage::Validated
        } else {
            Stage::Initialized
        }
    }

    /// Copy posted values into the session.
    ///
    /// Posted keys outside the definition are ignored. A checkbox with
    /// nothing posted is unchecked.
    pub fn merge_posted(&mut self, posted: &HashMap<String, String>) {
        for (name, field) in self.fields.iter_mut() {
            match posted.get(name) {
                Some(value) => field.value = FieldValue::Text(value.clone()),
                None if field.kind.is_toggle() => field.value = FieldValue::Flag(false),
                None => {}
            }
        }
    }

    /// Reset every field's error flag and message; values are untouched
    pub fn clear_field_errors(&mut self) {
        for field in self.fields.values_mut() {
            field.clear_error();
        }
    }

    /// Blank every field value
    pub fn clear_fields(&mut self) {
        for field in self.fields.values_mut() {
            field.value = field.blank_value();
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldState> {
        self.fields.get(name)
    }

    pub fn has_field_errors(&self) -> bool {
        self.fields.values().any(|f| f.error)
    }

    /// Field values in name order, for delivery
    pub fn summary(&self) -> Vec<(String, String)> {
        self.fields
            .iter()
            .map(|(name, field)| (name.clone(), field.value.to_string()))
            .collect()
    }

    /// Telemetry gathered outside the form data itself
    pub fn extra_data(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Session calls: {}", self.call_count);
        let _ = writeln!(
            out,
            "IP: {}",
            self.client_address.as_deref().unwrap_or("unknown")
        );
        if let Some(counter) = &self.page_counter {
            let _ = writeln!(out, "counter: {}", counter);
        }
        out
    }
}
