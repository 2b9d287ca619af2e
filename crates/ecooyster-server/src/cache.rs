/// Redis caching layer for advisory text.
///
/// Reads return `Option` and writes are best-effort; without Redis every
/// lookup misses and the advisory model is called directly.
///
/// Key schema:
/// - `eco:v1:advice:{sha256(model|salinity|technique|typhoons|floods)}` - raw advisory text (TTL: 3600s)
use sha2::{Digest, Sha256};
use tracing::debug;

use advice_report::prediction::FarmInputs;
use oyster_common::redis::RedisCache;

const KEY_PREFIX: &str = "eco:v1:";
const ADVICE_TTL_SECS: u64 = 3600;

pub struct AdviceCache {
    redis: RedisCache,
}

impl AdviceCache {
    pub fn new(redis: RedisCache) -> Self {
        Self { redis }
    }

    pub async fn is_available(&self) -> bool {
        self.redis.is_available().await
    }

    pub async fn get_advice(&self, model: &str, inputs: &FarmInputs) -> Option<String> {
        let key = advice_key(model, inputs);
        let advice = self.redis.get(&key).await?;
        debug!(key, "advice cache hit");
        Some(advice)
    }

    pub async fn set_advice(&self, model: &str, inputs: &FarmInputs, advice: &str) {
        let key = advice_key(model, inputs);
        self.redis.set_with_ttl(&key, advice, ADVICE_TTL_SECS).await;
    }
}

/// Deterministic key for one model and one set of farm inputs.
fn advice_key(model: &str, inputs: &FarmInputs) -> String {
    let mut hasher = Sha256::new();
    for part in [
        model.to_string(),
        inputs.salinity.to_string(),
        inputs.technique.code().to_string(),
        inputs.typhoon_count.to_string(),
        inputs.flood_count.to_string(),
    ] {
        hasher.update(part.as_bytes());
        hasher.update(b"|");
    }
    format!("{KEY_PREFIX}advice:{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(salinity: f64, technique: i64) -> FarmInputs {
        FarmInputs::new(salinity, technique, 1, 0).unwrap()
    }

    #[test]
    fn advice_key_is_deterministic_and_input_sensitive() {
        let a = advice_key("model-a", &inputs(20.0, 1));
        assert_eq!(a, advice_key("model-a", &inputs(20.0, 1)));
        assert!(a.starts_with("eco:v1:advice:"));
        assert_eq!(a.len(), "eco:v1:advice:".len() + 64);

        assert_ne!(a, advice_key("model-b", &inputs(20.0, 1)));
        assert_ne!(a, advice_key("model-a", &inputs(20.5, 1)));
        assert_ne!(a, advice_key("model-a", &inputs(20.0, 2)));
    }

    #[tokio::test]
    async fn disabled_cache_always_misses() {
        let cache = AdviceCache::new(RedisCache::new(None));
        cache.set_advice("m", &inputs(20.0, 1), "advice").await;
        assert_eq!(cache.get_advice("m", &inputs(20.0, 1)).await, None);
        assert!(!cache.is_available().await);
    }
}
