use std::collections::HashMap;

use tokio::sync::RwLock;

use ideameet_core::{Email, UserProfile};

use super::{RepositoryError, UserProfileRepository};

#[derive(Default)]
pub struct InMemoryUserProfileRepository {
    profiles: RwLock<HashMap<String, UserProfile>>,
}

#[async_trait::async_trait]
impl UserProfileRepository for InMemoryUserProfileRepository {
    async fn find_by_email(&self, email: &Email) -> Result<Option<UserProfile>, RepositoryError> {
        let profiles = self.profiles.read().await;
        Ok(profiles.get(email.as_str()).cloned())
    }

    async fn save(&self, profile: UserProfile) -> Result<(), RepositoryError> {
        let mut profiles = self.profiles.write().await;
        profiles.insert(profile.email.as_str().to_owned(), profile);
        Ok(())
    }
}
