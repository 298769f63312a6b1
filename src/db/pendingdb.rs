// db/pendingdb.rs
//! Storage for signups that have not confirmed their OTP yet.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands};
use thiserror::Error;

use crate::models::registrationmodel::PendingRegistration;

/// How long an abandoned signup may linger before the store forgets it.
pub const PENDING_REGISTRATION_TTL: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Error)]
pub enum PendingStoreError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Corrupt pending registration: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[async_trait]
pub trait PendingRegistrationStore: Send + Sync {
    /// Inserts or replaces the entry for `entry.email` and resets its TTL.
    async fn put(&self, entry: &PendingRegistration) -> Result<(), PendingStoreError>;

    async fn get(&self, email: &str) -> Result<Option<PendingRegistration>, PendingStoreError>;

    async fn remove(&self, email: &str) -> Result<(), PendingStoreError>;
}

fn pending_key(email: &str) -> String {
    format!("pending_registration:{}", email)
}

/// Shared, expiring store; works across instances.
pub struct RedisPendingStore {
    redis: Arc<ConnectionManager>,
    ttl: Duration,
}

impl RedisPendingStore {
    pub fn new(redis: Arc<ConnectionManager>) -> Self {
        Self {
            redis,
            ttl: PENDING_REGISTRATION_TTL,
        }
    }
}

#[async_trait]
impl PendingRegistrationStore for RedisPendingStore {
    async fn put(&self, entry: &PendingRegistration) -> Result<(), PendingStoreError> {
        let json = serde_json::to_string(entry)?;
        let mut conn = ConnectionManager::clone(&self.redis);
        let _: () = conn
            .set_ex(pending_key(&entry.email), json, self.ttl.as_secs() as usize)
            .await?;
        Ok(())
    }

    async fn get(&self, email: &str) -> Result<Option<PendingRegistration>, PendingStoreError> {
        let mut conn = ConnectionManager::clone(&self.redis);
        let raw: Option<String> = conn.get(pending_key(email)).await?;
        match raw {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn remove(&self, email: &str) -> Result<(), PendingStoreError> {
        let mut conn = ConnectionManager::clone(&self.redis);
        let _: () = conn.del(pending_key(email)).await?;
        Ok(())
    }
}

/// Process-local fallback used when Redis is not configured.
/// Entries are lost on restart and not shared between instances.
pub struct InMemoryPendingStore {
    entries: RwLock<HashMap<String, (PendingRegistration, Instant)>>,
    ttl: Duration,
}

type Entries = HashMap<String, (PendingRegistration, Instant)>;

impl InMemoryPendingStore {
    pub fn new() -> Self {
        Self::with_ttl(PENDING_REGISTRATION_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    // A panic while holding the lock cannot leave a half-written map entry,
    // so a poisoned lock is still safe to use.
    fn read(&self) -> RwLockReadGuard<'_, Entries> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Entries> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.read()
            .values()
            .filter(|(_, deadline)| *deadline > now)
            .count()
    }

    /// Drops entries past their TTL; returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.write();
        let before = entries.len();
        entries.retain(|_, (_, deadline)| *deadline > now);
        before - entries.len()
    }
}

impl Default for InMemoryPendingStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PendingRegistrationStore for InMemoryPendingStore {
    async fn put(&self, entry: &PendingRegistration) -> Result<(), PendingStoreError> {
        let deadline = Instant::now() + self.ttl;
        self.write()
            .insert(entry.email.clone(), (entry.clone(), deadline));
        Ok(())
    }

    async fn get(&self, email: &str) -> Result<Option<PendingRegistration>, PendingStoreError> {
        let now = Instant::now();
        let found = self.read().get(email).cloned();

        match found {
            Some((entry, deadline)) if deadline > now => Ok(Some(entry)),
            Some(_) => {
                self.write().remove(email);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn remove(&self, email: &str) -> Result<(), PendingStoreError> {
        self.write().remove(email);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(email: &str) -> PendingRegistration {
        PendingRegistration {
            username: "ada".to_string(),
            email: email.to_string(),
            hashed_password: "hash".to_string(),
            role: None,
            tier: None,
            is_seller: false,
            country: None,
            phone: None,
            organization: None,
            next_of_kin: None,
            hashed_otp: "otp-hash".to_string(),
            otp_salt: "salt".to_string(),
            otp_expires: 0,
            failed_attempts: 0,
        }
    }

    #[tokio::test]
    async fn test_put_get_remove() {
        let store = InMemoryPendingStore::new();
        store.put(&entry("a@x.com")).await.unwrap();

        let found = store.get("a@x.com").await.unwrap().unwrap();
        assert_eq!(found.username, "ada");
        assert_eq!(store.len(), 1);

        store.remove("a@x.com").await.unwrap();
        assert!(store.get("a@x.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_overwrites_existing_entry() {
        let store = InMemoryPendingStore::new();
        store.put(&entry("a@x.com")).await.unwrap();

        let mut replacement = entry("a@x.com");
        replacement.username = "grace".to_string();
        store.put(&replacement).await.unwrap();

        assert_eq!(store.get("a@x.com").await.unwrap().unwrap().username, "grace");
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_entries_vanish_after_ttl() {
        let store = InMemoryPendingStore::with_ttl(Duration::from_millis(0));
        store.put(&entry("a@x.com")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;

        assert!(store.get("a@x.com").await.unwrap().is_none());
        assert_eq!(store.purge_expired(), 0);
    }

    #[tokio::test]
    async fn test_put_survives_poisoned_lock() {
        let store = Arc::new(InMemoryPendingStore::new());
        let poisoner = store.clone();
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.entries.write().unwrap();
            panic!("poison the lock");
        })
        .join();
        assert!(store.entries.is_poisoned());

        store.put(&entry("a@x.com")).await.unwrap();
        assert_eq!(store.get("a@x.com").await.unwrap().unwrap().email, "a@x.com");

        store.remove("a@x.com").await.unwrap();
        assert!(store.get("a@x.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let store = InMemoryPendingStore::with_ttl(Duration::from_millis(0));
        store.put(&entry("a@x.com")).await.unwrap();
        store.put(&entry("b@x.com")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;

        assert_eq!(store.purge_expired(), 2);
    }
}
