//! In-process session store.

use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

use formguard_common::FormGuardError;
use formguard_common::constants::DEFAULT_SESSION_TTL_SECS;

use super::{SessionStore, decode_session, session_key};
use crate::protocol::FormSession;

struct Entry {
    data: String,
    expires_at: Instant,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// Sessions held as JSON in a map with a sliding TTL; lost on restart.
///
/// Expired entries read as absent and are swept on every save, so the
/// map holds at most the sessions written within one TTL.
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, Entry>>,
    session_ttl: Duration,
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::with_ttl(Duration::from_secs(DEFAULT_SESSION_TTL_SECS))
    }
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(session_ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            session_ttl,
        }
    }

    /// Entries held, including expired ones not yet swept
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(
        &self,
        session_id: &str,
        form_name: &str,
    ) -> Result<Option<FormSession>, FormGuardError> {
        let key = session_key(session_id, form_name);
        let sessions = self.sessions.read().await;

        Ok(sessions
            .get(&key)
            .filter(|entry| entry.is_live(Instant::now()))
            .and_then(|entry| decode_session(&key, &entry.data)))
    }

    async fn save(&self, session_id: &str, session: &FormSession) -> Result<(), FormGuardError> {
        let data = serde_json::to_string(session)?;
        let now = Instant::now();

        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, entry| entry.is_live(now));
        let swept = before - sessions.len();
        if swept > 0 {
            tracing::debug!(swept, "Expired form sessions removed");
        }

        sessions.insert(
            session_key(session_id, &session.form_name),
            Entry {
                data,
                expires_at: now + self.session_ttl,
            },
        );
        Ok(())
    }

    async fn delete(&self, session_id: &str, form_name: &str) -> Result<(), FormGuardError> {
        self.sessions
            .write()
            .await
            .remove(&session_key(session_id, form_name));
        Ok(())
    }

    async fn ping(&self) -> Result<(), FormGuardError> {
        Ok(())
    }
}
