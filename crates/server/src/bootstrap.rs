use std::sync::Arc;
use std::time::Duration;

use ideameet_agent::{GenerationError, HttpLlmClient, LlmClient, LlmIdeaGenerator, LlmSummarizer};
use ideameet_core::config::AppConfig;
use ideameet_db::{
    connect_cache, connect_with_settings, migrations, ProfileTopicLookup, SqlUserProfileRepository,
    UserProfileRepository,
};
use ideameet_slack::commands::CommandRouter;
use ideameet_slack::identity::SlackIdentityResolver;
use ideameet_slack::jobs::{JobRunner, TokioJobSpawner};
use ideameet_slack::web_api::{SlackApi, SlackApiError, SlackWebClient};
use thiserror::Error;
use tracing::info;

use crate::app::AppState;

pub struct Application {
    pub config: AppConfig,
    pub state: AppState,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("cache connection failed: {0}")]
    Cache(#[source] redis::RedisError),
    #[error("slack client setup failed: {0}")]
    SlackClient(#[source] SlackApiError),
    #[error("llm client setup failed: {0}")]
    LlmClient(#[source] GenerationError),
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "database migrations applied"
    );

    let cache = match config.cache.url.as_deref() {
        Some(url) => {
            let cache = connect_cache(url).await.map_err(BootstrapError::Cache)?;
            info!(
                event_name = "system.bootstrap.cache_connected",
                correlation_id = "bootstrap",
                "cache connection established"
            );
            Some(cache)
        }
        None => None,
    };

    let slack: Arc<dyn SlackApi> = Arc::new(
        SlackWebClient::build(
            config.slack.api_base_url.clone(),
            config.slack.bot_token.clone(),
            Duration::from_secs(config.slack.timeout_secs),
        )
        .map_err(BootstrapError::SlackClient)?,
    );
    let llm: Arc<dyn LlmClient> =
        Arc::new(HttpLlmClient::from_config(&config.llm).map_err(BootstrapError::LlmClient)?);

    let profiles: Arc<dyn UserProfileRepository> =
        Arc::new(SqlUserProfileRepository::new(db_pool.clone()));
    let runner = JobRunner::new(
        slack.clone(),
        Arc::new(ProfileTopicLookup::new(profiles.clone())),
        Arc::new(LlmSummarizer::new(llm.clone())),
        Arc::new(LlmIdeaGenerator::new(llm)),
    );
    let command_router = CommandRouter::new(
        Arc::new(SlackIdentityResolver::new(slack)),
        Arc::new(TokioJobSpawner::new(Arc::new(runner))),
    );

    info!(
        event_name = "system.bootstrap.ready",
        correlation_id = "bootstrap",
        llm_provider = ?config.llm.provider,
        llm_model = %config.llm.model,
        signature_verification = config.slack.signing_secret.is_some(),
        cache_enabled = cache.is_some(),
        "application wired"
    );

    let state = AppState {
        db_pool,
        cache,
        profiles,
        command_router: Arc::new(command_router),
        signing_secret: config.slack.signing_secret.clone(),
    };
    Ok(Application { config, state })
}

impl Application {
    /// Releases the datastore handles. Background jobs still in flight are not
    /// awaited.
    pub async fn shutdown(self) {
        let AppState { db_pool, cache, .. } = self.state;
        db_pool.close().await;
        info!(
            event_name = "system.database.closed",
            correlation_id = "shutdown",
            "database pool closed"
        );
        if let Some(cache) = cache {
            cache.close();
        }
    }
}
