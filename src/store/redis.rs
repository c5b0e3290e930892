use super::lua_scripts::FIXED_WINDOW_SCRIPT;
use super::{CounterStore, WindowSlot};
use crate::error::{ApiError, Result};
use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands, Script};
use tracing::debug;

impl From<redis::RedisError> for ApiError {
    fn from(e: redis::RedisError) -> Self {
        ApiError::Store(e.to_string())
    }
}

/// Redis-backed counter store
///
/// The shared state lives in Redis, so limiter windows and the card counter
/// are correct across horizontally-scaled workers. Window increments run as
/// a Lua script to keep the read-modify-write atomic server-side.
pub struct RedisCounterStore {
    connection: ConnectionManager,
}

impl RedisCounterStore {
    /// Connect to Redis and build a store
    pub async fn connect(redis_url: &str) -> Result<Self> {
        let client = redis::Client::open(redis_url)?;
        let connection = ConnectionManager::new(client).await?;

        Ok(Self { connection })
    }

    /// Test the Redis connection
    pub async fn ping(&self) -> Result<()> {
        let mut conn = self.connection.clone();
        redis::cmd("PING").query_async::<_, ()>(&mut conn).await?;
        Ok(())
    }
}

#[async_trait]
impl CounterStore for RedisCounterStore {
    async fn get(&self, key: &str) -> Result<Option<i64>> {
        let mut conn = self.connection.clone();
        let value: Option<i64> = conn.get(key).await?;
        Ok(value)
    }

    async fn incr(&self, key: &str) -> Result<i64> {
        let mut conn = self.connection.clone();
        let value: i64 = conn.incr(key, 1).await?;
        Ok(value)
    }

    async fn incr_window(&self, key: &str, window_secs: u64) -> Result<WindowSlot> {
        let mut conn = self.connection.clone();

        let result: Vec<i64> = Script::new(FIXED_WINDOW_SCRIPT)
            .key(key)
            .arg(window_secs)
            .invoke_async(&mut conn)
            .await?;

        if result.len() != 2 {
            return Err(ApiError::Store(format!(
                "Unexpected window script reply length: {}",
                result.len()
            )));
        }

        let slot = WindowSlot {
            count: result[0].max(0) as u64,
            reset_after: result[1].max(0) as u64,
        };

        debug!(key, count = slot.count, reset_after = slot.reset_after, "Window incremented");

        Ok(slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // These tests require a running Redis instance.
    // They are ignored by default; run with: cargo test -- --ignored

    async fn create_test_store() -> Option<RedisCounterStore> {
        RedisCounterStore::connect("redis://127.0.0.1:6379").await.ok()
    }

    #[tokio::test]
    #[ignore]
    async fn test_redis_counter_increment() {
        let store = create_test_store().await.expect("Failed to connect to Redis");
        let key = format!("test:counter:{}", rand::random::<u32>());

        let first = store.incr(&key).await.unwrap();
        let second = store.incr(&key).await.unwrap();
        assert_eq!(second, first + 1);

        let read = store.get(&key).await.unwrap();
        assert_eq!(read, Some(second));
    }

    #[tokio::test]
    #[ignore]
    async fn test_redis_window_counts_and_expires() {
        let store = create_test_store().await.expect("Failed to connect to Redis");
        let key = format!("test:window:{}", rand::random::<u32>());

        let first = store.incr_window(&key, 60).await.unwrap();
        assert_eq!(first.count, 1);
        assert!(first.reset_after <= 60);

        let second = store.incr_window(&key, 60).await.unwrap();
        assert_eq!(second.count, 2);
    }

    #[tokio::test]
    #[ignore]
    async fn test_redis_connection() {
        let store = create_test_store().await.expect("Failed to connect to Redis");
        assert!(store.ping().await.is_ok());
    }
}
