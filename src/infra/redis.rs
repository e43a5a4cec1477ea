//! Redis-backed [`CacheStore`].

use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use tracing::info;

use crate::cache::{CacheError, CacheStore};
use crate::config::CacheSettings;

use super::error::InfraError;

#[derive(Clone)]
pub struct RedisCacheStore {
    conn: ConnectionManager,
    scan_count: u32,
}

impl std::fmt::Debug for RedisCacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisCacheStore")
            .field("conn", &"<ConnectionManager>")
            .field("scan_count", &self.scan_count)
            .finish()
    }
}

impl RedisCacheStore {
    pub async fn connect(settings: &CacheSettings) -> Result<Self, InfraError> {
        let client = redis::Client::open(settings.redis_url.as_str())
            .map_err(|err| InfraError::cache(format!("invalid redis url: {err}")))?;

        let config = ConnectionManagerConfig::new()
            .set_connection_timeout(settings.connect_timeout)
            .set_response_timeout(settings.response_timeout);
        let conn = tokio::time::timeout(
            settings.connect_timeout,
            ConnectionManager::new_with_config(client, config),
        )
        .await
        .map_err(|_| {
            InfraError::cache(format!(
                "timed out connecting to redis after {}ms",
                settings.connect_timeout.as_millis()
            ))
        })?
        .map_err(|err| InfraError::cache(format!("failed to connect to redis: {err}")))?;

        info!(scan_count = settings.scan_count.get(), "Connected to redis");
        Ok(Self {
            conn,
            scan_count: settings.scan_count.get(),
        })
    }
}

#[async_trait]
impl CacheStore for RedisCacheStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.conn.clone();
        conn.get(key).await.map_err(CacheError::backend)
    }

    async fn set_with_expiry(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        let seconds = ttl.as_secs().max(1);
        conn.set_ex::<_, _, ()>(key, value, seconds)
            .await
            .map_err(CacheError::backend)
    }

    async fn delete(&self, keys: &[String]) -> Result<u64, CacheError> {
        if keys.is_empty() {
            return Ok(0);
        }
        let mut conn = self.conn.clone();
        conn.del::<_, u64>(keys).await.map_err(CacheError::backend)
    }

    async fn scan_keys(&self, pattern: &str) -> Result<Vec<String>, CacheError> {
        let mut conn = self.conn.clone();
        let mut cursor = 0u64;
        let mut keys = Vec::new();

        loop {
            let (next_cursor, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(self.scan_count)
                .query_async(&mut conn)
                .await
                .map_err(CacheError::backend)?;

            keys.extend(batch);
            cursor = next_cursor;
            if cursor == 0 {
                break;
            }
        }

        // SCAN may return a key more than once.
        keys.sort();
        keys.dedup();
        Ok(keys)
    }

    async fn ping(&self) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(CacheError::backend)?;
        Ok(())
    }
}
