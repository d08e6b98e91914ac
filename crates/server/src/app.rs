use std::sync::Arc;

use axum::Router;
use ideameet_db::{CacheHandle, DbPool, UserProfileRepository};
use ideameet_slack::commands::CommandRouter;
use secrecy::SecretString;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::{health, slack_commands, users};

/// Long-lived handles shared by every request.
#[derive(Clone)]
pub struct AppState {
    pub db_pool: DbPool,
    pub cache: Option<CacheHandle>,
    pub profiles: Arc<dyn UserProfileRepository>,
    pub command_router: Arc<CommandRouter>,
    pub signing_secret: Option<SecretString>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(slack_commands::routes(&state))
        .nest("/api", health::routes().merge(users::routes()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
