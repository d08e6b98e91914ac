use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteRow, Row};

use ideameet_core::{Email, UserProfile};

use super::{RepositoryError, UserProfileRepository};
use crate::DbPool;

pub struct SqlUserProfileRepository {
    pool: DbPool,
}

impl SqlUserProfileRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl UserProfileRepository for SqlUserProfileRepository {
    async fn find_by_email(&self, email: &Email) -> Result<Option<UserProfile>, RepositoryError> {
        let row = sqlx::query("SELECT email, topic, updated_at FROM user_profile WHERE email = ?")
            .bind(email.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| decode_profile(&row)).transpose()
    }

    async fn save(&self, profile: UserProfile) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO user_profile (email, topic, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(email) DO UPDATE SET
                topic = excluded.topic,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(profile.email.as_str())
        .bind(profile.topic.as_deref())
        .bind(profile.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

fn decode_profile(row: &SqliteRow) -> Result<UserProfile, RepositoryError> {
    let raw_email: String = row.try_get("email")?;
    let email = Email::parse(&raw_email)
        .map_err(|error| RepositoryError::Decode(format!("user_profile.email: {error}")))?;
    let topic: Option<String> = row.try_get("topic")?;
    let raw_updated_at: String = row.try_get("updated_at")?;
    let updated_at = DateTime::parse_from_rfc3339(&raw_updated_at)
        .map(|value| value.with_timezone(&Utc))
        .map_err(|error| RepositoryError::Decode(format!("user_profile.updated_at: {error}")))?;

    Ok(UserProfile { email, topic, updated_at })
}
