//! Form definitions: the immutable description of a form's fields.
//!
//! Definitions are JSON documents. Anything before the first `{` is
//! ignored so the same file can be served to browsers as a script
//! assignment (`var formData = {...}`).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::FormGuardError;
use crate::types::{FieldKind, FieldState, FieldValue, Rule};

/// Number of top-level messages (index 0 is "no error")
pub const FORM_MESSAGE_COUNT: usize = 7;

/// Declaration of one field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSpec {
    #[serde(rename = "type")]
    pub kind: FieldKind,

    #[serde(default, alias = "valTypes")]
    pub rules: Vec<Rule>,

    #[serde(default, alias = "posValues", skip_serializing_if = "Option::is_none")]
    pub possible_values: Option<Vec<String>>,

    /// Initial value shown on a fresh form
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl FieldSpec {
    /// Fresh session state for this field: no error, default value
    pub fn initial_state(&self) -> FieldState {
        let value = match (&self.value, self.kind.is_toggle()) {
            (Some(text), _) => FieldValue::Text(text.clone()),
            (None, true) => FieldValue::Flag(false),
            (None, false) => FieldValue::default(),
        };

        FieldState {
            value,
            kind: self.kind,
            rules: self.rules.clone(),
            possible_values: self.possible_values.clone(),
            error: false,
            error_message: String::new(),
        }
    }
}

/// A complete form definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormDefinition {
    pub form_name: String,

    /// Field name -> declaration
    pub form: BTreeMap<String, FieldSpec>,

    /// Top-level message overrides indexed by failure code; empty
    /// strings keep the default
    #[serde(default, alias = "formErrorMsg")]
    pub form_error_messages: Vec<String>,

    /// Per-rule field message overrides
    #[serde(default, alias = "fieldErrorMsg")]
    pub field_error_messages: BTreeMap<String, String>,
}

impl FormDefinition {
    /// Parse and validate a definition from JSON text
    pub fn from_json_str(text: &str) -> Result<Self, FormGuardError> {
        let start = text
            .find('{')
            .ok_or_else(|| FormGuardError::Definition("no JSON object found".to_string()))?;

        let definition: Self = serde_json::from_str(&text[start..])
            .map_err(|e| FormGuardError::Definition(e.to_string()))?;
        definition.validate()?;
        Ok(definition)
    }

    /// Read and validate a definition file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, FormGuardError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            FormGuardError::Definition(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&text)
    }

    /// Check the definition's shape once so later lookups can trust it
    pub fn validate(&self) -> Result<(), FormGuardError> {
        if self.form_name.trim().is_empty() {
            return Err(FormGuardError::Definition("formName is empty".to_string()));
        }
        if self.form.is_empty() {
            return Err(FormGuardError::Definition(format!(
                "form '{}' declares no fields",
                self.form_name
            )));
        }
        for (name, spec) in &self.form {
            if name.is_empty() {
                return Err(FormGuardError::Definition(
                    "field with empty name".to_string(),
                ));
            }
            if spec.kind.is_choice() && spec.possible_values.is_none() {
                return Err(FormGuardError::Definition(format!(
                    "field '{}' is a select/radio without possibleValues",
                    name
                )));
            }
        }
        if self.form_error_messages.len() > FORM_MESSAGE_COUNT {
            return Err(FormGuardError::Definition(format!(
                "at most {} form error messages allowed, got {}",
                FORM_MESSAGE_COUNT,
                self.form_error_messages.len()
            )));
        }
        Ok(())
    }

    /// Initial field states for a brand new session
    pub fn initial_fields(&self) -> BTreeMap<String, FieldState> {
        self.form
            .iter()
            .map(|(name, spec)| (name.clone(), spec.initial_state()))
            .collect()
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.form.keys().map(String::as_str)
    }
}
