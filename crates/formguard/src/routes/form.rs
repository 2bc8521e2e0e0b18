//! Form controller: maps stage markers to protocol steps.
//!
//! - no marker: initialize and show a clean form
//! - `?validate=<token>` with a posted body: validate, then show the
//!   confirmation or the form with errors
//! - `?submit=delete`: discard the session and start over
//! - `?submit=<token>`: confirm and deliver, or show the form with errors
//!
//! Views are JSON view-models; rendering them is up to the front end.

use axum::{
    Form, Json,
    extract::{Query, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use formguard_common::constants::{headers as header_names, stage_markers};
use formguard_common::{FieldValue, FormGuardError, Outcome};

use crate::guard::Caller;
use crate::protocol::FormSession;
use crate::state::AppState;
use crate::token::generate_token;

/// Cookie some front ends use to count page views before the form
const COUNTER_COOKIE: &str = "counter";

#[derive(Debug, Default, Deserialize)]
pub struct StageQuery {
    validate: Option<String>,
    submit: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldView {
    value: FieldValue,
    error: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    error_message: String,
}

/// Form to fill in, possibly annotated with errors
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormView {
    form: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    form_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    failure_code: Option<u8>,
    challenge: String,
    validation_token: String,
    fields: BTreeMap<String, FieldView>,
}

/// Validated data for the user to check before submitting
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmView {
    form: String,
    submission_token: String,
    fields: BTreeMap<String, FieldView>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedView {
    form: String,
}

#[derive(Serialize)]
#[serde(tag = "view", rename_all = "lowercase")]
pub enum View {
    Form(FormView),
    Confirm(ConfirmView),
    Submitted(SubmittedView),
}

fn field_views(session: &FormSession) -> BTreeMap<String, FieldView> {
    session
        .fields
        .iter()
        .map(|(name, field)| {
            let view = FieldView {
                value: field.value.clone(),
                error: field.error,
                error_message: field.error_message.clone(),
            };
            (name.clone(), view)
        })
        .collect()
}

impl View {
    fn form(session: &FormSession, outcome: Option<Outcome>) -> Self {
        let form_error = (!session.form_error_message.is_empty())
            .then(|| session.form_error_message.clone());

        Self::Form(FormView {
            form: session.form_name.clone(),
            form_error,
            failure_code: outcome.and_then(|o| o.failure()).map(|f| f.code()),
            challenge: session.challenge_text.clone(),
            validation_token: session.validation_token.clone(),
            fields: field_views(session),
        })
    }

    fn confirm(session: &FormSession) -> Self {
        Self::Confirm(ConfirmView {
            form: session.form_name.clone(),
            submission_token: session.submission_token.clone(),
            fields: field_views(session),
        })
    }

    fn submitted(session: &FormSession) -> Self {
        Self::Submitted(SubmittedView {
            form: session.form_name.clone(),
        })
    }
}

/// Infrastructure failure surfaced to the client
pub struct ApiError(FormGuardError);

impl From<FormGuardError> for ApiError {
    fn from(err: FormGuardError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self.0, "Form request failed");

        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = serde_json::json!({
            "error": self.0.to_string(),
            "retryable": self.0.is_retryable(),
        });
        (status, Json(body)).into_response()
    }
}

/// Value of a named cookie from the request headers
fn cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
        .filter(|value| !value.is_empty())
}

/// First hop of X-Forwarded-For
fn client_address(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header_names::X_FORWARDED_FOR)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Identify the caller; the flag is set when a new session id was minted
fn caller(state: &AppState, headers: &HeaderMap) -> (Caller, bool) {
    let existing = cookie(headers, &state.config.cookie_name);
    let minted = existing.is_none();

    let caller = Caller {
        session_id: existing.unwrap_or_else(generate_token),
        client_address: client_address(headers),
        page_counter: cookie(headers, COUNTER_COOKIE),
    };
    (caller, minted)
}

fn with_session_cookie(
    mut response: Response,
    state: &AppState,
    caller: &Caller,
    minted: bool,
) -> Response {
    if minted {
        let cookie = format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax",
            state.config.cookie_name, caller.session_id
        );
        match HeaderValue::from_str(&cookie) {
            Ok(value) => {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
            Err(e) => tracing::error!(error = %e, "Could not encode session cookie"),
        }
    }
    response
}

/// GET /form
pub async fn show_form(
    State(state): State<AppState>,
    Query(query): Query<StageQuery>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    dispatch(state, query, headers, HashMap::new()).await
}

/// POST /form
pub async fn post_form(
    State(state): State<AppState>,
    Query(query): Query<StageQuery>,
    headers: HeaderMap,
    Form(posted): Form<HashMap<String, String>>,
) -> Result<Response, ApiError> {
    dispatch(state, query, headers, posted).await
}

async fn dispatch(
    state: AppState,
    query: StageQuery,
    headers: HeaderMap,
    posted: HashMap<String, String>,
) -> Result<Response, ApiError> {
    let (caller, minted) = caller(&state, &headers);
    let guard = &state.guard;

    let response = if let Some(submit) = query.submit {
        if submit == stage_markers::DELETE {
            guard.delete_session(&caller).await?;
            Redirect::to("/form").into_response()
        } else {
            let (outcome, session) = guard.confirm_submit(&caller, Some(submit.as_str())).await?;
            if outcome.is_passed() {
                state.delivery.deliver(&session).await?;
                Json(View::submitted(&session)).into_response()
            } else {
                Json(View::form(&session, Some(outcome))).into_response()
            }
        }
    } else if let Some(token) = query.validate {
        let (outcome, session) = guard.validate(&caller, &posted, Some(token.as_str())).await?;
        if outcome.is_passed() {
            Json(View::confirm(&session)).into_response()
        } else {
            Json(View::form(&session, Some(outcome))).into_response()
        }
    } else {
        let session = guard.start(&caller).await?;
        Json(View::form(&session, None)).into_response()
    };

    Ok(with_session_cookie(response, &state, &caller, minted))
}
