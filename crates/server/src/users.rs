//! User profile API: the topic each user is currently working on.
//!
//! - `GET /api/users/{email}/topic` - stored topic (404 without a profile)
//! - `PUT /api/users/{email}/topic` - upsert, `{ "topic": null }` clears it

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use ideameet_core::errors::{ApplicationError, InterfaceError};
use ideameet_core::{Email, UserProfile};
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use uuid::Uuid;

use crate::app::AppState;

#[derive(Debug, Deserialize)]
pub struct TopicRequest {
    pub topic: Option<String>,
}

#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct TopicResponse {
    pub email: String,
    pub topic: Option<String>,
    pub updated_at: String,
}

#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub error: &'static str,
    pub detail: String,
    pub correlation_id: String,
}

/// HTTP rendering of an [`InterfaceError`].
#[derive(Debug)]
pub struct ApiError(InterfaceError);

impl From<ApplicationError> for ApiError {
    fn from(error: ApplicationError) -> Self {
        Self(error.into_interface(Uuid::new_v4().to_string()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            InterfaceError::NotFound { .. } => StatusCode::NOT_FOUND,
            InterfaceError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        };
        if status.is_server_error() {
            error!(
                event_name = "api.request.failed",
                correlation_id = self.0.correlation_id(),
                error = %self.0,
                "user api request failed"
            );
        }

        let body = ApiErrorBody {
            error: self.0.user_message(),
            detail: self.0.to_string(),
            correlation_id: self.0.correlation_id().to_owned(),
        };
        (status, Json(body)).into_response()
    }
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/users/{email}/topic", get(get_topic).put(put_topic))
}

pub async fn get_topic(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<TopicResponse>, ApiError> {
    let email = Email::parse(&email).map_err(ApplicationError::from)?;
    let profile = state
        .profiles
        .find_by_email(&email)
        .await
        .map_err(ApplicationError::from)?
        .ok_or_else(|| ApplicationError::NotFound(format!("user profile {email}")))?;

    Ok(Json(topic_response(profile)))
}

pub async fn put_topic(
    State(state): State<AppState>,
    Path(email): Path<String>,
    Json(request): Json<TopicRequest>,
) -> Result<Json<TopicResponse>, ApiError> {
    let email = Email::parse(&email).map_err(ApplicationError::from)?;
    let profile = UserProfile::new(email, request.topic);
    state.profiles.save(profile.clone()).await.map_err(ApplicationError::from)?;

    info!(
        event_name = "api.user.topic_saved",
        email = %profile.email,
        has_topic = profile.topic.is_some(),
        "user topic saved"
    );
    Ok(Json(topic_response(profile)))
}

fn topic_response(profile: UserProfile) -> TopicResponse {
    TopicResponse {
        email: profile.email.to_string(),
        topic: profile.topic,
        updated_at: profile.updated_at.to_rfc3339(),
    }
}
