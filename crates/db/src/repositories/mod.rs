use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use ideameet_core::{ApplicationError, Email, TopicLookup, UserProfile};

pub mod memory;
pub mod user_profile;

pub use memory::InMemoryUserProfileRepository;
pub use user_profile::SqlUserProfileRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

impl From<RepositoryError> for ApplicationError {
    fn from(value: RepositoryError) -> Self {
        ApplicationError::Persistence(value.to_string())
    }
}

#[async_trait]
pub trait UserProfileRepository: Send + Sync {
    async fn find_by_email(&self, email: &Email) -> Result<Option<UserProfile>, RepositoryError>;
    async fn save(&self, profile: UserProfile) -> Result<(), RepositoryError>;
}

/// Answers topic lookups from the stored user profiles.
pub struct ProfileTopicLookup {
    repository: Arc<dyn UserProfileRepository>,
}

impl ProfileTopicLookup {
    pub fn new(repository: Arc<dyn UserProfileRepository>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl TopicLookup for ProfileTopicLookup {
    async fn topic_for_email(&self, email: &str) -> Result<Option<String>, ApplicationError> {
        let email = Email::parse(email)?;
        let profile = self.repository.find_by_email(&email).await?;
        Ok(profile.and_then(|profile| profile.topic))
    }
}
