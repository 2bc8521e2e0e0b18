//! Store-backed entry points for the form protocol.
//!
//! Each call loads (or creates) the caller's form session, runs one
//! protocol step, and writes the session back before returning it for
//! rendering.

use std::collections::HashMap;
use std::sync::Arc;

use formguard_common::{FormDefinition, FormGuardError, Outcome};

use crate::protocol::{FormSession, Lifecycle};
use crate::store::SessionStore;

/// Who is calling: session id plus telemetry the transport knows about
#[derive(Debug, Clone, Default)]
pub struct Caller {
    pub session_id: String,
    pub client_address: Option<String>,
    pub page_counter: Option<String>,
}

impl Caller {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            ..Default::default()
        }
    }
}

/// Form protocol service
pub struct FormGuard {
    definition: Arc<FormDefinition>,
    lifecycle: Lifecycle,
    store: Arc<dyn SessionStore>,
}

impl FormGuard {
    pub fn new(
        definition: Arc<FormDefinition>,
        lifecycle: Lifecycle,
        store: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            definition,
            lifecycle,
            store,
        }
    }

    pub fn definition(&self) -> &FormDefinition {
        &self.definition
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    async fn open(&self, caller: &Caller) -> Result<FormSession, FormGuardError> {
        let stored = self
            .store
            .load(&caller.session_id, &self.definition.form_name)
            .await?;
        let mut session = FormSession::open(
            stored,
            &self.definition,
            caller.client_address.as_deref(),
        );
        if caller.page_counter.is_some() {
            session.page_counter = caller.page_counter.clone();
        }
        Ok(session)
    }

    async fn save(&self, caller: &Caller, session: &FormSession) -> Result<(), FormGuardError> {
        self.store.save(&caller.session_id, session).await
    }

    /// Open a new submission window
    pub async fn initialize(&self, caller: &Caller) -> Result<FormSession, FormGuardError> {
        let mut session = self.open(caller).await?;
        self.lifecycle.initialize(&mut session);
        self.save(caller, &session).await?;
        Ok(session)
    }

    /// First visit: open a window and present the form without errors
    pub async fn start(&self, caller: &Caller) -> Result<FormSession, FormGuardError> {
        let mut session = self.open(caller).await?;
        self.lifecycle.initialize(&mut session);
        session.clear_field_errors();
        self.save(caller, &session).await?;
        Ok(session)
    }

    /// Check a posted form against the presented validation token
    pub async fn validate(
        &self,
        caller: &Caller,
        posted: &HashMap<String, String>,
        token: Option<&str>,
    ) -> Result<(Outcome, FormSession), FormGuardError> {
        let mut session = self.open(caller).await?;
        let outcome = self.lifecycle.validate(&mut session, posted, token).await;
        self.save(caller, &session).await?;
        Ok((outcome, session))
    }

    /// Check the final submission link
    pub async fn confirm_submit(
        &self,
        caller: &Caller,
        token: Option<&str>,
    ) -> Result<(Outcome, FormSession), FormGuardError> {
        let mut session = self.open(caller).await?;
        let outcome = self.lifecycle.confirm_submit(&mut session, token);
        self.save(caller, &session).await?;
        Ok((outcome, session))
    }

    pub async fn clear_field_errors(&self, caller: &Caller) -> Result<FormSession, FormGuardError> {
        let mut session = self.open(caller).await?;
        session.clear_field_errors();
        self.save(caller, &session).await?;
        Ok(session)
    }

    pub async fn clear_fields(&self, caller: &Caller) -> Result<FormSession, FormGuardError> {
        let mut session = self.open(caller).await?;
        session.clear_fields();
        self.save(caller, &session).await?;
        Ok(session)
    }

    /// Remove the form session entirely
    pub async fn delete_session(&self, caller: &Caller) -> Result<(), FormGuardError> {
        self.store
            .delete(&caller.session_id, &self.definition.form_name)
            .await?;
        tracing::debug!(form = %self.definition.form_name, "Form session discarded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::messages::Messages;
    use crate::protocol::{Stage, SubmitWindow};
    use crate::store::MemorySessionStore;
    use crate::validation::{FieldValidator, StaticResolver};
    use formguard_common::Failure;
    use formguard_common::constants::FAIL_TOKEN;
    use std::time::Duration;

    fn guard(clock: &FixedClock) -> (FormGuard, Arc<MemorySessionStore>) {
        let definition = Arc::new(
            FormDefinition::from_json_str(
                r#"{"formName": "contact", "form": {
                    "firstName": {"type": "text", "rules": ["required", "name"]},
                    "turingbox": {"type": "text", "rules": ["required", "turing"]}
                }}"#,
            )
            .unwrap(),
        );
        let messages = Arc::new(Messages::default().with_definition(&definition));
        let validator = FieldValidator::new(
            messages.clone(),
            Arc::new(StaticResolver::new()),
            Duration::from_millis(100),
        );
        let lifecycle = Lifecycle::new(
            SubmitWindow {
                min_secs: 4,
                max_secs: 1800,
            },
            vec!["Humans only".to_string()],
            messages,
            validator,
            Arc::new(clock.clone()),
        );
        let store = Arc::new(MemorySessionStore::new());
        (FormGuard::new(definition, lifecycle, store.clone()), store)
    }

    #[tokio::test]
    async fn test_sessions_persist_between_calls() {
        let clock = FixedClock::new(1_000);
        let (guard, store) = guard(&clock);
        let caller = Caller::new("sid");

        let first = guard.start(&caller).await.unwrap();
        assert_eq!(first.call_count, 1);

        clock.advance(10);
        let posted = HashMap::from([
            ("firstName".to_string(), "Ann".to_string()),
            ("turingbox".to_string(), first.challenge_text.clone()),
        ]);
        let (outcome, session) = guard
            .validate(&caller, &posted, Some(first.validation_token.as_str()))
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::Passed);
        assert_eq!(session.call_count, 2);

        let stored = store.load("sid", "contact").await.unwrap().unwrap();
        assert_eq!(stored.stage(), Stage::Validated);
        assert_eq!(stored.submission_token, session.submission_token);

        let (outcome, _) = guard
            .confirm_submit(&caller, Some(session.submission_token.as_str()))
            .await
            .unwrap();
        assert!(outcome.is_passed());
    }

    #[tokio::test]
    async fn test_validate_without_session_is_order_error() {
        let clock = FixedClock::new(1_000);
        let (guard, store) = guard(&clock);
        let caller = Caller::new("cookieless");

        let (outcome, session) = guard
            .validate(&caller, &HashMap::new(), Some("anything"))
            .await
            .unwrap();

        assert_eq!(outcome, Outcome::Rejected(Failure::CookiesOrOrderError));
        assert_eq!(outcome.code(), 5);
        assert_eq!(session.submission_token, FAIL_TOKEN);
        assert!(store.load("cookieless", "contact").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_delete_session() {
        let clock = FixedClock::new(1_000);
        let (guard, store) = guard(&clock);
        let caller = Caller {
            session_id: "sid".to_string(),
            client_address: Some("192.0.2.7".to_string()),
            page_counter: Some("3".to_string()),
        };

        let session = guard.initialize(&caller).await.unwrap();
        assert!(session.extra_data().contains("IP: 192.0.2.7"));
        assert!(session.extra_data().contains("counter: 3"));

        guard.delete_session(&caller).await.unwrap();
        assert!(store.is_empty().await);

        // A fresh session starts counting from scratch
        let session = guard.initialize(&caller).await.unwrap();
        assert_eq!(session.call_count, 1);
    }

    #[tokio::test]
    async fn test_clear_fields_keeps_tokens() {
        let clock = FixedClock::new(1_000);
        let (guard, _) = guard(&clock);
        let caller = Caller::new("sid");

        let started = guard.start(&caller).await.unwrap();
        clock.advance(1);
        let posted = HashMap::from([("firstName".to_string(), "Ann".to_string())]);
        let (outcome, _) = guard
            .validate(&caller, &posted, Some(started.validation_token.as_str()))
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::Rejected(Failure::TooFast));

        let cleared = guard.clear_fields(&caller).await.unwrap();
        assert_eq!(cleared.fields["firstName"].value.as_text(), "");
        assert_ne!(cleared.validation_token, FAIL_TOKEN);
    }
}
