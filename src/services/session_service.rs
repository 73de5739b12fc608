// src/services/session_service.rs
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use redis::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing;

use crate::errors::{TaxiError as AppError, TaxiResult};

#[derive(Debug, Clone, Copy)]
pub struct SessionConfig {
    pub ttl_seconds: u64,
}

/// Server-side session data, addressed by the `sessionid` cookie.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub driver_id: i64,
    pub num_visits: u32,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }

    fn remaining_seconds(&self) -> u64 {
        (self.expires_at - Utc::now()).num_seconds().max(1) as u64
    }
}

pub struct SessionKeys;

impl SessionKeys {
    pub fn session(key: &str) -> String {
        format!("session:{}", key)
    }
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self, key: &str) -> TaxiResult<Option<Session>>;
    async fn save(&self, key: &str, session: &Session) -> TaxiResult<()>;
    async fn delete(&self, key: &str) -> TaxiResult<()>;
}

// Redis-backed store; expiry is left to Redis TTLs.
pub struct RedisSessionStore {
    connection: redis::aio::MultiplexedConnection,
}

impl RedisSessionStore {
    pub async fn connect(redis_url: &str) -> TaxiResult<Self> {
        let client = Client::open(redis_url)?;
        let connection = client.get_multiplexed_async_connection().await?;
        tracing::info!("Connected to Redis session store");
        Ok(Self { connection })
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn load(&self, key: &str) -> TaxiResult<Option<Session>> {
        let mut conn = self.connection.clone();
        let data: Option<String> = redis::cmd("GET")
            .arg(SessionKeys::session(key))
            .query_async(&mut conn)
            .await?;

        match data {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn save(&self, key: &str, session: &Session) -> TaxiResult<()> {
        let json = serde_json::to_string(session)?;
        let mut conn = self.connection.clone();
        let _: () = redis::cmd("SET")
            .arg(SessionKeys::session(key))
            .arg(json)
            .arg("EX")
            .arg(session.remaining_seconds())
            .query_async(&mut conn)
            .await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> TaxiResult<()> {
        let mut conn = self.connection.clone();
        let _: () = redis::cmd("DEL")
            .arg(SessionKeys::session(key))
            .query_async(&mut conn)
            .await?;
        Ok(())
    }
}

// Memory store for development/testing
#[derive(Default)]
pub struct MemorySessionStore {
    store: RwLock<HashMap<String, Session>>,
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, key: &str) -> TaxiResult<Option<Session>> {
        let store = self.store.read().await;
        Ok(store.get(key).filter(|session| !session.is_expired()).cloned())
    }

    async fn save(&self, key: &str, session: &Session) -> TaxiResult<()> {
        let mut store = self.store.write().await;
        store.retain(|_, existing| !existing.is_expired());
        store.insert(key.to_string(), session.clone());
        Ok(())
    }

    async fn delete(&self, key: &str) -> TaxiResult<()> {
        self.store.write().await.remove(key);
        Ok(())
    }
}

// Enum to wrap the two store implementations
pub enum SessionBackend {
    Redis(RedisSessionStore),
    Memory(MemorySessionStore),
}

#[async_trait]
impl SessionStore for SessionBackend {
    async fn load(&self, key: &str) -> TaxiResult<Option<Session>> {
        match self {
            SessionBackend::Redis(store) => store.load(key).await,
            SessionBackend::Memory(store) => store.load(key).await,
        }
    }

    async fn save(&self, key: &str, session: &Session) -> TaxiResult<()> {
        match self {
            SessionBackend::Redis(store) => store.save(key, session).await,
            SessionBackend::Memory(store) => store.save(key, session).await,
        }
    }

    async fn delete(&self, key: &str) -> TaxiResult<()> {
        match self {
            SessionBackend::Redis(store) => store.delete(key).await,
            SessionBackend::Memory(store) => store.delete(key).await,
        }
    }
}

pub struct SessionService {
    backend: SessionBackend,
    config: SessionConfig,
}

impl SessionService {
    pub async fn new_redis(redis_url: &str, config: SessionConfig) -> TaxiResult<Self> {
        Ok(Self {
            backend: SessionBackend::Redis(RedisSessionStore::connect(redis_url).await?),
            config,
        })
    }

    pub fn new_memory(config: SessionConfig) -> Self {
        Self {
            backend: SessionBackend::Memory(MemorySessionStore::default()),
            config,
        }
    }

    pub fn ttl_seconds(&self) -> u64 {
        self.config.ttl_seconds
    }

    /// Starts a session for a freshly authenticated driver and returns its key.
    pub async fn create(&self, driver_id: i64) -> TaxiResult<(String, Session)> {
        let key = uuid::Uuid::new_v4().simple().to_string();
        let now = Utc::now();
        let ttl = i64::try_from(self.config.ttl_seconds)
            .map_err(|_| AppError::InvalidConfiguration("session ttl too large".to_string()))?;
        let session = Session {
            driver_id,
            num_visits: 0,
            created_at: now,
            expires_at: now + Duration::seconds(ttl),
        };

        self.backend.save(&key, &session).await?;
        tracing::debug!("Session created for driver {}", driver_id);
        Ok((key, session))
    }

    pub async fn load(&self, key: &str) -> TaxiResult<Option<Session>> {
        self.backend.load(key).await
    }

    pub async fn save(&self, key: &str, session: &Session) -> TaxiResult<()> {
        self.backend.save(key, session).await
    }

    pub async fn destroy(&self, key: &str) -> TaxiResult<()> {
        self.backend.delete(key).await?;
        tracing::debug!("Session destroyed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(ttl_seconds: u64) -> SessionService {
        SessionService::new_memory(SessionConfig { ttl_seconds })
    }

    #[tokio::test]
    async fn test_create_and_load() {
        let sessions = service(60);
        let (key, session) = sessions.create(42).await.unwrap();

        assert_eq!(key.len(), 32);
        let loaded = sessions.load(&key).await.unwrap().unwrap();
        assert_eq!(loaded, session);
        assert_eq!(loaded.driver_id, 42);
        assert_eq!(loaded.num_visits, 0);
    }

    #[tokio::test]
    async fn test_save_updates_counter() {
        let sessions = service(60);
        let (key, mut session) = sessions.create(1).await.unwrap();
        session.num_visits += 1;
        sessions.save(&key, &session).await.unwrap();

        assert_eq!(sessions.load(&key).await.unwrap().unwrap().num_visits, 1);
    }

    #[tokio::test]
    async fn test_destroy() {
        let sessions = service(60);
        let (key, _) = sessions.create(1).await.unwrap();
        sessions.destroy(&key).await.unwrap();
        assert!(sessions.load(&key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_expired_sessions_are_invisible() {
        let sessions = service(0);
        let (key, _) = sessions.create(1).await.unwrap();
        assert!(sessions.load(&key).await.unwrap().is_none());
    }

    #[test]
    fn test_session_key_namespace() {
        assert_eq!(SessionKeys::session("abc"), "session:abc");
    }
}
