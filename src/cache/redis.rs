//! Redis primary store.
//!
//! The connection is established lazily on first use; a failed connect is
//! retried on the next call instead of failing startup, so the tracker can
//! boot while Redis is down and run on the fallback store.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use std::future::Future;
use std::time::Duration;
use tokio::sync::OnceCell;

use super::{CacheError, CacheStore};

/// Networked primary cache backed by Redis.
pub struct RedisStore {
    client: Client,
    connection: OnceCell<ConnectionManager>,
    timeout: Duration,
}

impl RedisStore {
    /// Create a store for `address` (`host:port` or a `redis://` URL).
    ///
    /// No connection is made until the first operation.
    pub fn new(address: &str, timeout: Duration) -> Result<Self, CacheError> {
        let url = connection_url(address);
        let client = Client::open(url.as_str()).map_err(|e| CacheError::Backend(e.to_string()))?;

        Ok(Self {
            client,
            connection: OnceCell::new(),
            timeout,
        })
    }

    async fn connection(&self) -> Result<ConnectionManager, CacheError> {
        let conn = self
            .bounded(self.connection.get_or_try_init(|| {
                let client = self.client.clone();
                async move { ConnectionManager::new(client).await }
            }))
            .await?;
        Ok(conn.clone())
    }

    /// Apply the per-operation timeout and map Redis errors.
    async fn bounded<T, Fut>(&self, fut: Fut) -> Result<T, CacheError>
    where
        Fut: Future<Output = redis::RedisResult<T>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(CacheError::Backend(e.to_string())),
            Err(_) => Err(CacheError::Timeout(self.timeout)),
        }
    }
}

#[async_trait]
impl CacheStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let mut conn = self.connection().await?;
        self.bounded(async {
            let data: Option<Vec<u8>> = conn.get(key).await?;
            Ok::<_, redis::RedisError>(data)
        })
        .await
    }

    async fn set(&self, key: &str, payload: Vec<u8>, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.connection().await?;
        let millis = ttl.as_millis().clamp(1, u64::MAX as u128) as u64;
        tracing::debug!(key = %key, ttl = ?ttl, "Saving entry to Redis");
        self.bounded(async {
            let _: () = conn.pset_ex(key, payload, millis).await?;
            Ok::<_, redis::RedisError>(())
        })
        .await
    }

    async fn ping(&self) -> Result<(), CacheError> {
        let mut conn = self.connection().await?;
        let _pong: String = self
            .bounded(redis::cmd("PING").query_async(&mut conn))
            .await?;
        Ok(())
    }
}

/// Accept bare `host:port` as well as full Redis URLs.
fn connection_url(address: &str) -> String {
    let address = address.trim();
    if address.contains("://") {
        address.to_string()
    } else {
        format!("redis://{}", address)
    }
}
