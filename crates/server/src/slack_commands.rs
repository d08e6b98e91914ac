//! `POST /slack/commands`: slash-command webhook.
//!
//! When a signing secret is configured, the body is buffered and checked
//! against `X-Slack-Signature` before the form is parsed.

use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::post,
    Form, Json, Router,
};
use chrono::Utc;
use ideameet_slack::commands::{SlashCommandPayload, SlashCommandResponse};
use ideameet_slack::messages::SIGNATURE_REJECTED_TEXT;
use ideameet_slack::signature::{verify_request, SIGNATURE_HEADER, TIMESTAMP_HEADER};
use secrecy::ExposeSecret;
use tracing::warn;

use crate::app::AppState;

const MAX_COMMAND_BODY_BYTES: usize = 64 * 1024;

pub fn routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/slack/commands", post(slash_command))
        .route_layer(middleware::from_fn_with_state(state.clone(), verify_slack_signature))
}

pub async fn slash_command(
    State(state): State<AppState>,
    Form(payload): Form<SlashCommandPayload>,
) -> Json<SlashCommandResponse> {
    Json(state.command_router.handle(payload).await)
}

pub async fn verify_slack_signature(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let Some(secret) = state.signing_secret.as_ref() else {
        return next.run(request).await;
    };

    let (parts, body) = request.into_parts();
    let bytes = match to_bytes(body, MAX_COMMAND_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(error) => {
            warn!(
                event_name = "slack.signature.body_unreadable",
                error = %error,
                "failed to buffer slash command body"
            );
            return StatusCode::PAYLOAD_TOO_LARGE.into_response();
        }
    };

    let header = |name: &str| parts.headers.get(name).and_then(|value| value.to_str().ok());
    if let Err(error) = verify_request(
        secret.expose_secret(),
        header(TIMESTAMP_HEADER),
        header(SIGNATURE_HEADER),
        &bytes,
        Utc::now().timestamp(),
    ) {
        warn!(
            event_name = "slack.signature.rejected",
            error = %error,
            "rejected slash command with invalid signature"
        );
        return (
            StatusCode::UNAUTHORIZED,
            Json(SlashCommandResponse::ephemeral(SIGNATURE_REJECTED_TEXT)),
        )
            .into_response();
    }

    next.run(Request::from_parts(parts, Body::from(bytes))).await
}
