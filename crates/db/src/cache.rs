//! Key-value cache connection.
//!
//! The handle is opened once at startup, shared by clones of the underlying
//! connection manager, and dropped at shutdown.

use redis::aio::ConnectionManager;
use redis::{Client, RedisError};
use tracing::info;

#[derive(Clone)]
pub struct CacheHandle {
    manager: ConnectionManager,
}

pub async fn connect_cache(url: &str) -> Result<CacheHandle, RedisError> {
    let client = Client::open(url)?;
    let manager = ConnectionManager::new(client).await?;
    Ok(CacheHandle { manager })
}

impl CacheHandle {
    pub async fn ping(&self) -> Result<(), RedisError> {
        let mut connection = self.manager.clone();
        let _: String = redis::cmd("PING").query_async(&mut connection).await?;
        Ok(())
    }

    pub fn close(self) {
        drop(self.manager);
        info!(
            event_name = "system.cache.closed",
            correlation_id = "shutdown",
            "cache connection closed"
        );
    }
}
