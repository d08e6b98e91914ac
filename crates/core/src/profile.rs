use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// Email address used as the key of a user's profile.
///
/// Stored trimmed and lowercased so lookups by a Slack-reported address match
/// profiles written through the user API regardless of casing.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Email(String);

impl Email {
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let normalized = raw.trim().to_ascii_lowercase();
        let Some((local, domain)) = normalized.split_once('@') else {
            return Err(DomainError::InvalidEmail(raw.to_owned()));
        };

        if local.is_empty() || domain.is_empty() || domain.contains('@') {
            return Err(DomainError::InvalidEmail(raw.to_owned()));
        }
        if normalized.chars().any(char::is_whitespace) {
            return Err(DomainError::InvalidEmail(raw.to_owned()));
        }

        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub email: Email,
    pub topic: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl UserProfile {
    pub fn new(email: Email, topic: Option<String>) -> Self {
        Self { email, topic: normalize_topic(topic), updated_at: Utc::now() }
    }
}

/// Blank topics are treated as unset.
pub fn normalize_topic(topic: Option<String>) -> Option<String> {
    topic.map(|value| value.trim().to_owned()).filter(|value| !value.is_empty())
}
