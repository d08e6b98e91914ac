//! Seams between the Slack workflow and the services it calls out to.
//!
//! The Slack crate drives these traits; the db and agent crates implement
//! them. Every call returns an [`ApplicationError`] so the background job can
//! turn any failure into a single channel notice.

use async_trait::async_trait;

use crate::errors::ApplicationError;

/// User domain: the topic a user is currently working on.
#[async_trait]
pub trait TopicLookup: Send + Sync {
    async fn topic_for_email(&self, email: &str) -> Result<Option<String>, ApplicationError>;
}

/// External summarization service.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(
        &self,
        messages: &[String],
        topic: Option<&str>,
    ) -> Result<String, ApplicationError>;
}

/// External ideation service combining two unrelated words.
#[async_trait]
pub trait IdeaGenerator: Send + Sync {
    async fn synectics(&self, word_a: &str, word_b: &str) -> Result<String, ApplicationError>;
}
