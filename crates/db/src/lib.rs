pub mod cache;
pub mod connection;
pub mod migrations;
pub mod repositories;

pub use cache::{connect_cache, CacheHandle};
pub use connection::{connect_with_settings, DbPool};
pub use repositories::{
    InMemoryUserProfileRepository, ProfileTopicLookup, RepositoryError, SqlUserProfileRepository,
    UserProfileRepository,
};
