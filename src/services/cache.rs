use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde::{de::DeserializeOwned, Serialize};

const KEY_PREFIX: &str = "inkpost:";

fn namespaced(key: &str) -> String {
    format!("{KEY_PREFIX}{key}")
}

/// JSON values in redis. Every failure degrades to a cache miss.
#[derive(Clone)]
pub struct CacheService {
    redis: ConnectionManager,
}

impl CacheService {
    pub fn new(redis: ConnectionManager) -> Self {
        Self { redis }
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let mut conn = self.redis.clone();
        let raw: Option<String> = match conn.get(namespaced(key)).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!("cache read failed for {key}: {e}");
                return None;
            }
        };
        raw.and_then(|s| serde_json::from_str(&s).ok())
    }

    pub async fn set<T: Serialize>(&self, key: &str, value: &T, ttl_secs: u64) {
        let Ok(json) = serde_json::to_string(value) else {
            return;
        };
        let mut conn = self.redis.clone();
        if let Err(e) = conn
            .set_ex::<_, _, ()>(namespaced(key), json, ttl_secs)
            .await
        {
            tracing::warn!("cache write failed for {key}: {e}");
        }
    }

    pub async fn invalidate(&self, key: &str) {
        let mut conn = self.redis.clone();
        if let Err(e) = conn.del::<_, ()>(namespaced(key)).await {
            tracing::warn!("cache invalidation failed for {key}: {e}");
        }
    }
}
