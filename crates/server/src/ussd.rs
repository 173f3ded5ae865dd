//! Gateway-facing webhook.
//!
//! One endpoint: `POST /ussd`, form-encoded `sessionId`, `phoneNumber`,
//! `text` (cumulative dialog input, may be empty) and optional
//! `serviceCode`. The response body is plain text prefixed with `CON` (keep
//! the dialog open) or `END` (terminate), truncated at the configured
//! display budget.

use std::sync::Arc;

use axum::{
    extract::{Form, State},
    http::StatusCode,
    routing::post,
    Router,
};
use serde::Deserialize;
use tracing::{error, info, warn};

use harborcall_core::errors::RequestValidationError;
use harborcall_core::prompts;
use harborcall_core::{DialogPath, MenuResolver, Msisdn, SessionId};

#[derive(Clone)]
pub struct UssdState {
    resolver: Arc<MenuResolver>,
    max_reply_chars: usize,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UssdRequest {
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub service_code: Option<String>,
}

pub fn router(resolver: Arc<MenuResolver>, max_reply_chars: usize) -> Router {
    Router::new()
        .route("/ussd", post(handle_ussd))
        .with_state(UssdState { resolver, max_reply_chars })
}

pub async fn handle_ussd(
    State(state): State<UssdState>,
    Form(request): Form<UssdRequest>,
) -> (StatusCode, String) {
    let (session_id, caller_phone) = match validate(&request) {
        Ok(validated) => validated,
        Err(validation_error) => {
            warn!(
                event_name = "ussd.request_rejected",
                error = %validation_error,
                "gateway request failed validation"
            );
            return (
                StatusCode::BAD_REQUEST,
                format!("END {}", validation_error.user_message()),
            );
        }
    };

    let text = request.text.unwrap_or_default();
    let path = DialogPath::parse(&text);

    info!(
        event_name = "ussd.request",
        session_id = session_id.as_str(),
        service_code = request.service_code.as_deref().unwrap_or("-"),
        depth = path.depth(),
        "resolving dialog position"
    );

    // Resolution runs on its own task so that a panic anywhere below the
    // handler degrades to a safe reply instead of a dropped request.
    let resolver = state.resolver.clone();
    let task_session = session_id.clone();
    let resolution =
        tokio::spawn(async move { resolver.resolve(&task_session, &caller_phone, &path).await });

    let reply = match resolution.await {
        Ok(reply) => reply,
        Err(join_error) => {
            error!(
                event_name = "ussd.resolution_aborted",
                session_id = session_id.as_str(),
                error = %join_error,
                "dialog resolution aborted; sending safe default"
            );
            prompts::unexpected_error()
        }
    };

    (StatusCode::OK, reply.render(state.max_reply_chars))
}

fn validate(request: &UssdRequest) -> Result<(SessionId, Msisdn), RequestValidationError> {
    let session_id = request
        .session_id
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or(RequestValidationError::MissingSessionId)?;
    let phone_number = request
        .phone_number
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or(RequestValidationError::MissingPhoneNumber)?;

    Ok((SessionId(session_id.to_owned()), Msisdn::normalize(phone_number)))
}
