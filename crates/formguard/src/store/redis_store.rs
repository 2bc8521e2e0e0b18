//! Redis-backed session store.

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;

use formguard_common::FormGuardError;

use super::{SessionStore, decode_session, session_key};
use crate::protocol::FormSession;

/// Sessions stored as JSON strings with a sliding TTL
#[derive(Clone)]
pub struct RedisSessionStore {
    /// Connection manager (auto-reconnecting)
    redis: ConnectionManager,
    /// Session lifetime in seconds, refreshed on every save
    session_ttl: u64,
}

fn store_err(err: redis::RedisError) -> FormGuardError {
    FormGuardError::Store(err.to_string())
}

impl RedisSessionStore {
    /// Connect to Redis
    pub async fn connect(redis_url: &str, session_ttl: u64) -> Result<Self, FormGuardError> {
        let client = redis::Client::open(redis_url).map_err(store_err)?;
        let redis = ConnectionManager::new(client).await.map_err(store_err)?;

        Ok(Self { redis, session_ttl })
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn load(
        &self,
        session_id: &str,
        form_name: &str,
    ) -> Result<Option<FormSession>, FormGuardError> {
        let key = session_key(session_id, form_name);
        let mut conn = self.redis.clone();
        let data: Option<String> = conn.get(&key).await.map_err(store_err)?;

        Ok(data.and_then(|d| decode_session(&key, &d)))
    }

    async fn save(&self, session_id: &str, session: &FormSession) -> Result<(), FormGuardError> {
        let key = session_key(session_id, &session.form_name);
        let data = serde_json::to_string(session)?;

        let mut conn = self.redis.clone();
        conn.set_ex::<_, _, ()>(&key, &data, self.session_ttl)
            .await
            .map_err(store_err)?;

        Ok(())
    }

    async fn delete(&self, session_id: &str, form_name: &str) -> Result<(), FormGuardError> {
        let mut conn = self.redis.clone();
        conn.del::<_, ()>(session_key(session_id, form_name))
            .await
            .map_err(store_err)?;

        tracing::debug!(form = %form_name, "Form session deleted");
        Ok(())
    }

    async fn ping(&self) -> Result<(), FormGuardError> {
        let mut conn = self.redis.clone();
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(store_err)?;
        Ok(())
    }
}
