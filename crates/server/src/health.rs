use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use ideameet_db::{CacheHandle, DbPool};
use serde::Serialize;
use tracing::warn;

use crate::app::AppState;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub message: String,
    pub database: HealthCheck,
    pub cache: HealthCheck,
    pub checked_at: String,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

/// Readiness of the service. Only the database decides the status code; a
/// cache failure degrades the report but keeps `200`.
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let database = database_check(&state.db_pool).await;
    let cache = cache_check(state.cache.as_ref()).await;
    let database_ready = database.status == "ready";
    let fully_ready = database_ready && cache.status != "degraded";

    let payload = HealthResponse {
        status: if fully_ready { "ready" } else { "degraded" },
        message: if database_ready {
            "ideameet-server is running".to_string()
        } else {
            "ideameet-server cannot reach its database".to_string()
        },
        database,
        cache,
        checked_at: Utc::now().to_rfc3339(),
    };

    if !fully_ready {
        warn!(
            event_name = "system.health.degraded",
            database = payload.database.status,
            cache = payload.cache.status,
            "health check degraded"
        );
    }

    let status_code = if database_ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

async fn database_check(pool: &DbPool) -> HealthCheck {
    match sqlx::query_scalar::<_, i64>("SELECT 1").fetch_one(pool).await {
        Ok(_) => HealthCheck { status: "ready", detail: "database query succeeded".to_string() },
        Err(error) => {
            HealthCheck { status: "degraded", detail: format!("database query failed: {error}") }
        }
    }
}

async fn cache_check(cache: Option<&CacheHandle>) -> HealthCheck {
    let Some(cache) = cache else {
        return HealthCheck {
            status: "disabled",
            detail: "cache.url is not configured".to_string(),
        };
    };

    match cache.ping().await {
        Ok(()) => HealthCheck { status: "ready", detail: "cache ping succeeded".to_string() },
        Err(error) => {
            HealthCheck { status: "degraded", detail: format!("cache ping failed: {error}") }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{extract::State, http::StatusCode, Json};

    use crate::app::test_support::{state, RecordingSpawner};
    use crate::health::health;

    #[tokio::test]
    async fn health_returns_ready_when_database_is_reachable() {
        let state = state(Arc::new(RecordingSpawner::default())).await;
        let pool = state.db_pool.clone();

        let (status, Json(payload)) = health(State(state)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload.status, "ready");
        assert_eq!(payload.database.status, "ready");
        assert_eq!(payload.cache.status, "disabled");

        pool.close().await;
    }

    #[tokio::test]
    async fn health_returns_service_unavailable_when_database_is_unavailable() {
        let state = state(Arc::new(RecordingSpawner::default())).await;
        state.db_pool.close().await;

        let (status, Json(payload)) = health(State(state)).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(payload.status, "degraded");
        assert_eq!(payload.database.status, "degraded");
        assert!(payload.message.contains("database"));
    }
}
