/// Optional Redis key-value store with graceful degradation.
///
/// Without a URL, or when Redis cannot be reached, every read returns `None`
/// and every write returns `false` after logging a warning. Callers always have
/// a way to compute the value without Redis.
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use tracing::warn;

use crate::error::CommonError;

pub struct RedisCache {
    client: Option<redis::Client>,
}

impl RedisCache {
    /// Build a cache for `url`. A missing or malformed URL yields a disabled cache.
    pub fn new(url: Option<&str>) -> Self {
        let client = url.and_then(|u| {
            redis::Client::open(u)
                .inspect_err(|e| warn!(error = %e, url = u, "failed to create redis client, cache disabled"))
                .ok()
        });
        Self { client }
    }

    pub fn is_configured(&self) -> bool {
        self.client.is_some()
    }

    async fn connection(&self) -> Result<MultiplexedConnection, CommonError> {
        let client = self.client.as_ref().ok_or(CommonError::RedisUnavailable)?;
        Ok(client.get_multiplexed_async_connection().await?)
    }

    /// Send a PING. Returns `true` if Redis answers.
    pub async fn is_available(&self) -> bool {
        let Ok(mut conn) = self.connection().await else {
            return false;
        };
        let pong: Result<String, _> = redis::cmd("PING").query_async(&mut conn).await;
        pong.is_ok()
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        let mut conn = self
            .connection()
            .await
            .inspect_err(|e| log_unless_disabled(e, key))
            .ok()?;
        let value: Option<String> = conn
            .get(key)
            .await
            .inspect_err(|e| warn!(error = %e, key, "redis GET failed"))
            .ok()?;
        value
    }

    /// Store `value` under `key`, expiring after `ttl_secs`. Returns `true` on success.
    pub async fn set_with_ttl(&self, key: &str, value: &str, ttl_secs: u64) -> bool {
        let Ok(mut conn) = self
            .connection()
            .await
            .inspect_err(|e| log_unless_disabled(e, key))
        else {
            return false;
        };
        conn.set_ex::<_, _, ()>(key, value, ttl_secs)
            .await
            .inspect_err(|e| warn!(error = %e, key, "redis SETEX failed"))
            .is_ok()
    }
}

fn log_unless_disabled(err: &CommonError, key: &str) {
    if !matches!(err, CommonError::RedisUnavailable) {
        warn!(error = %err, key, "redis connection failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn disabled_cache_degrades() {
        let cache = RedisCache::new(None);
        assert!(!cache.is_configured());
        assert!(!cache.is_available().await);
        assert_eq!(cache.get("eco:v1:missing").await, None);
        assert!(!cache.set_with_ttl("eco:v1:key", "value", 60).await);
    }

    #[test]
    fn malformed_url_disables_cache() {
        let cache = RedisCache::new(Some("not a redis url"));
        assert!(!cache.is_configured());
    }
}
