//! Field validation engine.
//!
//! Maps each field's kind, rules, and value to pass/fail and records the
//! first failing rule's message on the field:
//!
//! | Kind            | Check                                      |
//! |-----------------|--------------------------------------------|
//! | password        | non-empty                                  |
//! | select / radio  | value is one of `possibleValues`           |
//! | checkbox        | checked, when `required` is listed         |
//! | everything else | each rule in declared order, first failure |

mod dns;
mod patterns;
mod rules;
mod sanitize;

pub use dns::{DnsResolver, HickoryResolver, StaticResolver, domain_accepts_mail};
pub use rules::{Step, check};
pub use sanitize::sanitize_text;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use formguard_common::{FieldKind, FieldState, Rule};

use crate::messages::{Messages, NO_PASSWORD_KEY, SELECT_NO_VALUE_KEY};

/// Validation engine service
pub struct FieldValidator {
    messages: Arc<Messages>,
    dns: Arc<dyn DnsResolver>,
    dns_timeout: Duration,
}

impl FieldValidator {
    pub fn new(messages: Arc<Messages>, dns: Arc<dyn DnsResolver>, dns_timeout: Duration) -> Self {
        Self {
            messages,
            dns,
            dns_timeout,
        }
    }

    /// Validate every field, marking errors in place.
    ///
    /// Returns true when no field failed.
    pub async fn validate_all(
        &self,
        fields: &mut BTreeMap<String, FieldState>,
        challenge: &str,
    ) -> bool {
        let mut all_passed = true;

        for (name, field) in fields.iter_mut() {
            if let Some(key) = self.validate_field(field, challenge).await {
                tracing::debug!(field = %name, rule = %key, "Field failed validation");
                all_passed = false;
            }
        }

        all_passed
    }

    /// Validate one field; returns the message key of the failing rule
    pub async fn validate_field(&self, field: &mut FieldState, challenge: &str) -> Option<String> {
        field.clear_error();

        let failed = self.first_failure(field, challenge).await;
        if let Some(key) = &failed {
            field.set_error(self.messages.field_message(key));
        }
        failed
    }

    async fn first_failure(&self, field: &mut FieldState, challenge: &str) -> Option<String> {
        match field.kind {
            FieldKind::Password => field
                .value
                .is_empty()
                .then(|| NO_PASSWORD_KEY.to_string()),
            FieldKind::Select | FieldKind::Radio => {
                // An empty or missing value list can never be satisfied
                let allowed = field.possible_values.as_deref().unwrap_or_default();
                let chosen = field.value.as_text();
                (!allowed.iter().any(|v| v == chosen)).then(|| SELECT_NO_VALUE_KEY.to_string())
            }
            FieldKind::Checkbox => (field.rules.contains(&Rule::Required)
                && !field.value.is_checked())
            .then(|| Rule::Required.to_string()),
            FieldKind::Text | FieldKind::Textarea | FieldKind::Other => {
                for rule in &field.rules {
                    let passed = match check(rule, &mut field.value, challenge) {
                        Step::Pass => true,
                        Step::Fail { clear_value } => {
                            if clear_value {
                                field.value = field.blank_value();
                            }
                            false
                        }
                        Step::LookupDomain(domain) => {
                            domain_accepts_mail(self.dns.as_ref(), &domain, self.dns_timeout).await
                        }
                    };
                    if !passed {
                        return Some(rule.to_string());
                    }
                }
                None
            }
        }
    }
}
