use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::web_api::SlackApi;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserIdentity {
    pub chat_user_id: String,
    pub email: Option<String>,
}

/// Maps a Slack user to an email address.
///
/// Implementations never fail: any lookup problem yields an identity without
/// an email, and "no such user" is indistinguishable from "Slack unreachable".
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn resolve(&self, user_id: &str) -> UserIdentity;
}

pub struct SlackIdentityResolver {
    api: Arc<dyn SlackApi>,
}

impl SlackIdentityResolver {
    pub fn new(api: Arc<dyn SlackApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl IdentityResolver for SlackIdentityResolver {
    async fn resolve(&self, user_id: &str) -> UserIdentity {
        let email = match self.api.user_email(user_id).await {
            Ok(Some(email)) => Some(email),
            Ok(None) => {
                warn!(
                    event_name = "slack.identity.email_missing",
                    user_id,
                    "slack profile has no email"
                );
                None
            }
            Err(error) => {
                warn!(
                    event_name = "slack.identity.lookup_failed",
                    user_id,
                    error = %error,
                    "failed to resolve user email"
                );
                None
            }
        };

        UserIdentity { chat_user_id: user_id.to_owned(), email }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;

    use super::{IdentityResolver, SlackIdentityResolver};
    use crate::web_api::{SlackApi, SlackApiError};

    struct ProfileApi {
        outcome: fn() -> Result<Option<String>, SlackApiError>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl SlackApi for ProfileApi {
        async fn user_email(&self, _user_id: &str) -> Result<Option<String>, SlackApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            (self.outcome)()
        }

        async fn recent_messages(
            &self,
            _channel_id: &str,
            _limit: u32,
        ) -> Result<Vec<String>, SlackApiError> {
            Ok(Vec::new())
        }

        async fn post_message(&self, _channel_id: &str, _text: &str) -> Result<(), SlackApiError> {
            Ok(())
        }
    }

    type Outcome = fn() -> Result<Option<String>, SlackApiError>;

    fn resolver(outcome: Outcome) -> (Arc<ProfileApi>, SlackIdentityResolver) {
        let api = Arc::new(ProfileApi { outcome, calls: AtomicUsize::new(0) });
        (api.clone(), SlackIdentityResolver::new(api))
    }

    #[tokio::test]
    async fn resolves_profile_email() {
        let (api, resolver) = resolver(|| Ok(Some("minji@team.io".to_owned())));
        let identity = resolver.resolve("U1").await;

        assert_eq!(identity.chat_user_id, "U1");
        assert_eq!(identity.email.as_deref(), Some("minji@team.io"));
        assert_eq!(api.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn api_failure_collapses_to_missing_email_without_retry() {
        let (api, resolver) = resolver(|| {
            Err(SlackApiError::Api { method: "users.info", error: "user_not_found".to_owned() })
        });
        let identity = resolver.resolve("U404").await;

        assert_eq!(identity.email, None);
        assert_eq!(api.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn hidden_email_is_missing() {
        let (_api, resolver) = resolver(|| Ok(None));
        assert_eq!(resolver.resolve("U2").await.email, None);
    }
}
