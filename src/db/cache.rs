// db/cache.rs
use redis::{aio::ConnectionManager, AsyncCommands};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;

pub struct CacheHelper;

impl CacheHelper {
    /// Reads and deserializes a JSON value. Missing keys are `Ok(None)`.
    pub async fn get<T: DeserializeOwned>(
        redis: &Arc<ConnectionManager>,
        key: &str,
    ) -> Result<Option<T>, redis::RedisError> {
        let mut conn = ConnectionManager::clone(redis);
        let cached: Option<String> = conn.get(key).await?;

        match cached {
            Some(data) => match serde_json::from_str::<T>(&data) {
                Ok(value) => {
                    tracing::debug!("Cache HIT: {}", key);
                    Ok(Some(value))
                }
                Err(e) => {
                    tracing::warn!("Cache deserialization failed for {}: {}", key, e);
                    Ok(None)
                }
            },
            None => {
                tracing::debug!("Cache MISS: {}", key);
                Ok(None)
            }
        }
    }

    /// Serializes to JSON and stores with a TTL.
    pub async fn set<T: Serialize>(
        redis: &Arc<ConnectionManager>,
        key: &str,
        value: &T,
        ttl_seconds: usize,
    ) -> Result<(), redis::RedisError> {
        let json = serde_json::to_string(value).map_err(|e| {
            redis::RedisError::from((
                redis::ErrorKind::TypeError,
                "serialization failed",
                e.to_string(),
            ))
        })?;
        let mut conn = ConnectionManager::clone(redis);
        let _: () = conn.set_ex(key, json, ttl_seconds).await?;
        tracing::debug!("Cache SET: {} (TTL: {}s)", key, ttl_seconds);
        Ok(())
    }

    pub async fn delete(redis: &Arc<ConnectionManager>, key: &str) -> Result<(), redis::RedisError> {
        let mut conn = ConnectionManager::clone(redis);
        let _: () = conn.del(key).await?;
        tracing::debug!("Cache DELETE: {}", key);
        Ok(())
    }

    pub async fn exists(redis: &Arc<ConnectionManager>, key: &str) -> Result<bool, redis::RedisError> {
        let mut conn = ConnectionManager::clone(redis);
        conn.exists(key).await
    }

    /// Marks a session token as revoked until it would have expired anyway.
    pub async fn blacklist_token(
        redis: &Arc<ConnectionManager>,
        token: &str,
        ttl_seconds: usize,
    ) -> Result<(), redis::RedisError> {
        let mut conn = ConnectionManager::clone(redis);
        let _: () = conn
            .set_ex(blacklist_key(token), "revoked", ttl_seconds.max(1))
            .await?;
        Ok(())
    }

    pub async fn is_token_blacklisted(
        redis: &Arc<ConnectionManager>,
        token: &str,
    ) -> Result<bool, redis::RedisError> {
        Self::exists(redis, &blacklist_key(token)).await
    }

    pub async fn health_check(redis: &Arc<ConnectionManager>) -> Result<bool, redis::RedisError> {
        let mut conn = ConnectionManager::clone(redis);
        let response: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(response == "PONG")
    }
}

fn blacklist_key(token: &str) -> String {
    format!("token_blacklist:{}", token)
}
