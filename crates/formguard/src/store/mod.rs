//! Session storage.
//!
//! Sessions are keyed by the client's session id and the form name so
//! several forms can share one client session.

mod memory;
mod redis_store;

pub use memory::MemorySessionStore;
pub use redis_store::RedisSessionStore;

use async_trait::async_trait;

use formguard_common::FormGuardError;
use formguard_common::constants::store_keys::SESSION_PREFIX;

use crate::protocol::FormSession;

/// Per-client key-value storage for form sessions
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(
        &self,
        session_id: &str,
        form_name: &str,
    ) -> Result<Option<FormSession>, FormGuardError>;

    async fn save(&self, session_id: &str, session: &FormSession) -> Result<(), FormGuardError>;

    async fn delete(&self, session_id: &str, form_name: &str) -> Result<(), FormGuardError>;

    /// Check the backend is reachable
    async fn ping(&self) -> Result<(), FormGuardError>;
}

/// Storage key for a form session
pub fn session_key(session_id: &str, form_name: &str) -> String {
    format!("{}{}:{}", SESSION_PREFIX, session_id, form_name)
}

/// Decode a stored session. A record that no longer decodes counts as
/// absent so the session is rebuilt instead of failing every request.
fn decode_session(key: &str, data: &str) -> Option<FormSession> {
    match serde_json::from_str(data) {
        Ok(session) => Some(session),
        Err(e) => {
            tracing::warn!(key = %key, error = %e, "Discarding undecodable form session");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_key() {
        assert_eq!(session_key("abc", "contact"), "formguard:session:abc:contact");
    }

    #[test]
    fn test_undecodable_session_is_absent() {
        assert!(decode_session("k", "{not json").is_none());
        assert!(decode_session("k", r#"{"formName": 7}"#).is_none());
    }
}
