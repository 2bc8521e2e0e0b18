//! The initialize → validate → submit state machine.
//!
//! Every rejection re-initializes the session (new validation token,
//! new window, new challenge, submission token revoked) while keeping
//! whatever the client posted, then records the top-level message.

use std::collections::HashMap;
use std::sync::Arc;

use formguard_common::constants::FAIL_TOKEN;
use formguard_common::{Failure, Outcome};

use super::session::FormSession;
use crate::clock::Clock;
use crate::messages::Messages;
use crate::token::{generate_token, pick_challenge, redact, token_matches};
use crate::validation::FieldValidator;

/// Allowed delay between initialize and validate, in seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmitWindow {
    pub min_secs: i64,
    pub max_secs: i64,
}

/// Session lifecycle service
pub struct Lifecycle {
    window: SubmitWindow,
    challenge_pool: Vec<String>,
    messages: Arc<Messages>,
    validator: FieldValidator,
    clock: Arc<dyn Clock>,
}

impl Lifecycle {
    pub fn new(
        window: SubmitWindow,
        challenge_pool: Vec<String>,
        messages: Arc<Messages>,
        validator: FieldValidator,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            window,
            challenge_pool,
            messages,
            validator,
            clock,
        }
    }

    /// Start a new submission window.
    ///
    /// Issues a fresh validation token and challenge and revokes any
    /// submission token, so submitting always needs a fresh validation.
    pub fn initialize(&self, session: &mut FormSession) -> bool {
        session.initialized_at = Some(self.clock.now());
        session.validation_token = generate_token();
        session.challenge_text = pick_challenge(&self.challenge_pool).unwrap_or_default();
        session.submission_token = FAIL_TOKEN.to_string();

        tracing::debug!(
            form = %session.form_name,
            validation_token = %redact(&session.validation_token),
            "Form session initialized"
        );
        true
    }

    /// Check a posted form.
    ///
    /// Posted values are merged before any check so they survive a
    /// rejection. On success the validation token is spent and a
    /// submission token is issued.
    pub async fn validate(
        &self,
        session: &mut FormSession,
        posted: &HashMap<String, String>,
        presented_token: Option<&str>,
    ) -> Outcome {
        let Some(initialized_at) = session.initialized_at else {
            return self.reject(session, Failure::CookiesOrOrderError);
        };

        session.merge_posted(posted);

        if !token_matches(presented_token, &session.validation_token) {
            return self.reject(session, Failure::BadValidationLink);
        }

        let now = self.clock.now();
        if now < initialized_at.saturating_add(self.window.min_secs) {
            return self.reject(session, Failure::TooFast);
        }
        if now > initialized_at.saturating_add(self.window.max_secs) {
            return self.reject(session, Failure::Expired);
        }

        let challenge = session.challenge_text.clone();
        if !self.validator.validate_all(&mut session.fields, &challenge).await {
            return self.reject(session, Failure::DataInvalid);
        }

        session.validation_token = FAIL_TOKEN.to_string();
        session.submission_token = generate_token();

        tracing::info!(
            form = %session.form_name,
            elapsed_secs = now.saturating_sub(initialized_at),
            "Form validated"
        );
        Outcome::Passed
    }

    /// Check the final submission link. Only a match leaves the session
    /// untouched; the caller may then hand the data on.
    pub fn confirm_submit(&self, session: &mut FormSession, presented_token: Option<&str>) -> Outcome {
        if !token_matches(presented_token, &session.submission_token) {
            return self.reject(session, Failure::BadSubmissionLink);
        }

        tracing::info!(form = %session.form_name, "Form submission confirmed");
        Outcome::Passed
    }

    fn reject(&self, session: &mut FormSession, failure: Failure) -> Outcome {
        tracing::warn!(
            form = %session.form_name,
            failure = %failure,
            code = failure.code(),
            calls = session.call_count,
            client = ?session.client_address,
            "Form step rejected"
        );

        self.initialize(session);
        session.form_error_message = self.messages.form_message(failure).to_string();
        Outcome::Rejected(failure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::protocol::session::Stage;
    use crate::validation::StaticResolver;
    use formguard_common::FormDefinition;
    use std::time::Duration;

    const START: i64 = 1_700_000_000;

    fn definition() -> FormDefinition {
        FormDefinition::from_json_str(
            r#"{
                "formName": "contact",
                "form": {
                    "empty": {"type": "text", "rules": ["empty"]},
                    "firstName": {"type": "text", "rules": ["required", "name", "max25"]},
                    "email": {"type": "text", "rules": ["required", "email"]},
                    "usTelephone": {"type": "text", "rules": ["required", "usTelephone"]},
                    "turingbox": {"type": "text", "rules": ["required", "turing"]}
                }
            }"#,
        )
        .unwrap()
    }

    fn lifecycle(clock: &FixedClock) -> Lifecycle {
        lifecycle_with_window(
            clock,
            SubmitWindow {
                min_secs: 4,
                max_secs: 1800,
            },
        )
    }

    fn lifecycle_with_window(clock: &FixedClock, window: SubmitWindow) -> Lifecycle {
        let messages = Arc::new(Messages::default());
        let dns = StaticResolver::new().with_mx("example.com");
        let validator =
            FieldValidator::new(messages.clone(), Arc::new(dns), Duration::from_millis(200));
        Lifecycle::new(
            window,
            vec!["No bots".to_string()],
            messages,
            validator,
            Arc::new(clock.clone()),
        )
    }

    fn post(session: &FormSession, email: &str) -> HashMap<String, String> {
        HashMap::from([
            ("firstName".to_string(), "Ann".to_string()),
            ("email".to_string(), email.to_string()),
            ("usTelephone".to_string(), "555-0123".to_string()),
            ("turingbox".to_string(), session.challenge_text.clone()),
            ("empty".to_string(), String::new()),
        ])
    }

    fn initialized(lc: &Lifecycle) -> FormSession {
        let mut session = FormSession::new(&definition());
        assert!(lc.initialize(&mut session));
        session
    }

    #[test]
    fn test_initialize_always_revokes_submission_token() {
        let clock = FixedClock::new(START);
        let lc = lifecycle(&clock);
        let mut session = initialized(&lc);
        session.submission_token = "issued".to_string();

        lc.initialize(&mut session);

        assert_eq!(session.submission_token, FAIL_TOKEN);
        assert_ne!(session.validation_token, FAIL_TOKEN);
        assert_eq!(session.challenge_text, "No bots");
        assert_eq!(session.initialized_at, Some(START));
        assert_eq!(session.stage(), Stage::Initialized);
    }

    #[tokio::test]
    async fn test_happy_path_then_submit() {
        let clock = FixedClock::new(START);
        let lc = lifecycle(&clock);
        let mut session = initialized(&lc);
        let token = session.validation_token.clone();

        clock.advance(5);
        let data = post(&session, "ann@example.com");
        let outcome = lc.validate(&mut session, &data, Some(token.as_str())).await;

        assert_eq!(outcome, Outcome::Passed);
        assert_eq!(session.stage(), Stage::Validated);
        assert!(session.form_error_message.is_empty());

        let submit = session.submission_token.clone();
        assert_eq!(lc.confirm_submit(&mut session, Some(submit.as_str())), Outcome::Passed);
    }

    #[tokio::test]
    async fn test_validation_token_is_single_use() {
        let clock = FixedClock::new(START);
        let lc = lifecycle(&clock);
        let mut session = initialized(&lc);
        let token = session.validation_token.clone();

        clock.advance(5);
        let data = post(&session, "ann@example.com");
        assert!(lc.validate(&mut session, &data, Some(token.as_str())).await.is_passed());

        let replay = lc.validate(&mut session, &data, Some(token.as_str())).await;
        assert_eq!(replay, Outcome::Rejected(Failure::BadValidationLink));
        assert_eq!(session.submission_token, FAIL_TOKEN);
    }

    #[tokio::test]
    async fn test_timing_boundaries() {
        for (elapsed, expected) in [
            (3, Outcome::Rejected(Failure::TooFast)),
            (4, Outcome::Passed),
            (1800, Outcome::Passed),
            (1801, Outcome::Rejected(Failure::Expired)),
        ] {
            let clock = FixedClock::new(START);
            let lc = lifecycle(&clock);
            let mut session = initialized(&lc);
            let token = session.validation_token.clone();

            clock.advance(elapsed);
            let data = post(&session, "ann@example.com");
            let outcome = lc.validate(&mut session, &data, Some(token.as_str())).await;
            assert_eq!(outcome, expected, "after {elapsed}s");
        }
    }

    #[tokio::test]
    async fn test_unbounded_window_never_overflows() {
        let clock = FixedClock::new(START);
        let lc = lifecycle_with_window(
            &clock,
            SubmitWindow {
                min_secs: 4,
                max_secs: i64::MAX,
            },
        );
        let mut session = initialized(&lc);
        let token = session.validation_token.clone();

        clock.advance(5);
        let data = post(&session, "ann@example.com");
        let outcome = lc.validate(&mut session, &data, Some(token.as_str())).await;
        assert_eq!(outcome, Outcome::Passed);
    }

    #[tokio::test]
    async fn test_huge_minimum_is_always_too_fast() {
        let clock = FixedClock::new(START);
        let lc = lifecycle_with_window(
            &clock,
            SubmitWindow {
                min_secs: i64::MAX,
                max_secs: i64::MAX,
            },
        );
        let mut session = initialized(&lc);
        let token = session.validation_token.clone();

        clock.advance(1_000_000);
        let data = post(&session, "ann@example.com");
        let outcome = lc.validate(&mut session, &data, Some(token.as_str())).await;
        assert_eq!(outcome, Outcome::Rejected(Failure::TooFast));
    }

    #[tokio::test]
    async fn test_too_fast_rotates_token_and_keeps_data() {
        let clock = FixedClock::new(START);
        let lc = lifecycle(&clock);
        let mut session = initialized(&lc);
        let token = session.validation_token.clone();

        let data = post(&session, "ann@example.com");
        let outcome = lc.validate(&mut session, &data, Some(token.as_str())).await;

        assert_eq!(outcome.code(), 3);
        assert_ne!(session.validation_token, token);
        assert_eq!(session.fields["firstName"].value.as_text(), "Ann");
        assert_eq!(
            session.form_error_message,
            Messages::default().form_message(Failure::TooFast)
        );
    }

    #[tokio::test]
    async fn test_unresolvable_email_fails_only_email() {
        let clock = FixedClock::new(START);
        let lc = lifecycle(&clock);
        let mut session = initialized(&lc);
        let token = session.validation_token.clone();

        clock.advance(5);
        let data = post(&session, "a@b.com");
        let outcome = lc.validate(&mut session, &data, Some(token.as_str())).await;

        assert_eq!(outcome, Outcome::Rejected(Failure::DataInvalid));
        let failed: Vec<&str> = session
            .fields
            .iter()
            .filter(|(_, f)| f.error)
            .map(|(name, _)| name.as_str())
            .collect();
        assert_eq!(failed, vec!["email"]);
    }

    #[tokio::test]
    async fn test_honeypot_and_challenge_are_cleared() {
        let clock = FixedClock::new(START);
        let lc = lifecycle(&clock);
        let mut session = initialized(&lc);
        let token = session.validation_token.clone();

        clock.advance(5);
        let mut data = post(&session, "ann@example.com");
        data.insert("empty".to_string(), "http://spam.example".to_string());
        data.insert("turingbox".to_string(), "I am a human".to_string());
        let outcome = lc.validate(&mut session, &data, Some(token.as_str())).await;

        assert_eq!(outcome, Outcome::Rejected(Failure::DataInvalid));
        assert!(session.fields["empty"].error);
        assert_eq!(session.fields["empty"].value.as_text(), "");
        assert!(session.fields["turingbox"].error);
        assert_eq!(session.fields["turingbox"].value.as_text(), "");
    }

    #[tokio::test]
    async fn test_bad_or_missing_validation_token() {
        let clock = FixedClock::new(START);
        let lc = lifecycle(&clock);
        let mut session = initialized(&lc);
        clock.advance(5);
        let data = post(&session, "ann@example.com");

        for presented in [None, Some("forged"), Some(FAIL_TOKEN)] {
            let outcome = lc.validate(&mut session, &data, presented).await;
            assert_eq!(outcome, Outcome::Rejected(Failure::BadValidationLink));
        }
    }

    #[tokio::test]
    async fn test_validate_before_initialize() {
        let clock = FixedClock::new(START);
        let lc = lifecycle(&clock);
        let mut session = FormSession::new(&definition());

        let outcome = lc.validate(&mut session, &HashMap::new(), Some(FAIL_TOKEN)).await;

        assert_eq!(outcome, Outcome::Rejected(Failure::CookiesOrOrderError));
        // Recovery leaves the session ready for the next attempt
        assert_eq!(session.stage(), Stage::Initialized);
        assert!(!session.form_error_message.is_empty());
    }

    #[test]
    fn test_submit_without_validation() {
        let clock = FixedClock::new(START);
        let lc = lifecycle(&clock);
        let mut session = initialized(&lc);
        let before = session.validation_token.clone();

        for presented in [None, Some(FAIL_TOKEN), Some("stale")] {
            let outcome = lc.confirm_submit(&mut session, presented);
            assert_eq!(outcome, Outcome::Rejected(Failure::BadSubmissionLink));
        }
        assert_ne!(session.validation_token, before);
    }

    #[tokio::test]
    async fn test_failure_after_validation_invalidates_submission_link() {
        let clock = FixedClock::new(START);
        let lc = lifecycle(&clock);
        let mut session = initialized(&lc);
        let token = session.validation_token.clone();

        clock.advance(5);
        let data = post(&session, "ann@example.com");
        assert!(lc.validate(&mut session, &data, Some(token.as_str())).await.is_passed());
        let submit = session.submission_token.clone();

        assert!(!lc.confirm_submit(&mut session, Some("tampered")).is_passed());
        assert_eq!(
            lc.confirm_submit(&mut session, Some(submit.as_str())),
            Outcome::Rejected(Failure::BadSubmissionLink)
        );
    }
}
