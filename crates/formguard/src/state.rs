//! Application state and shared resources.

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;

use formguard_common::FormDefinition;

use crate::clock::{Clock, SystemClock};
use crate::config::AppConfig;
use crate::delivery::{Delivery, LogDelivery};
use crate::guard::FormGuard;
use crate::messages::Messages;
use crate::protocol::Lifecycle;
use crate::store::{MemorySessionStore, RedisSessionStore, SessionStore};
use crate::validation::{DnsResolver, FieldValidator, HickoryResolver};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: AppConfig,

    /// Form protocol service
    pub guard: Arc<FormGuard>,

    /// Receiver of confirmed submissions
    pub delivery: Arc<dyn Delivery>,
}

impl AppState {
    /// Create application state, connecting to Redis when configured
    pub async fn new(config: AppConfig, definition: FormDefinition) -> Result<Self> {
        let store: Arc<dyn SessionStore> = match &config.redis_url {
            Some(url) => {
                let store = RedisSessionStore::connect(url, config.session_ttl_secs)
                    .await
                    .context("Failed to connect to Redis")?;
                tracing::info!(redis_url = %url, "Using Redis session store");
                Arc::new(store)
            }
            None => {
                tracing::warn!("No redis_url configured, sessions are kept in memory");
                Arc::new(MemorySessionStore::with_ttl(Duration::from_secs(
                    config.session_ttl_secs,
                )))
            }
        };

        let dns = HickoryResolver::from_system_conf().context("Failed to create DNS resolver")?;

        Ok(Self::from_parts(
            config,
            definition,
            store,
            Arc::new(dns),
            Arc::new(SystemClock),
            Arc::new(LogDelivery),
        ))
    }

    /// Assemble state from explicit capabilities
    pub fn from_parts(
        config: AppConfig,
        definition: FormDefinition,
        store: Arc<dyn SessionStore>,
        dns: Arc<dyn DnsResolver>,
        clock: Arc<dyn Clock>,
        delivery: Arc<dyn Delivery>,
    ) -> Self {
        let messages = Arc::new(
            Messages::default()
                .with_overrides(
                    &config.protocol.form_error_messages,
                    &config.protocol.field_error_messages,
                )
                .with_definition(&definition),
        );

        let validator = FieldValidator::new(messages.clone(), dns, config.dns.timeout());
        let challenge_pool = config
            .protocol
            .challenge_pool
            .iter()
            .filter(|c| !c.is_empty())
            .cloned()
            .collect();
        let lifecycle = Lifecycle::new(
            config.protocol.window(),
            challenge_pool,
            messages,
            validator,
            clock,
        );

        let guard = Arc::new(FormGuard::new(Arc::new(definition), lifecycle, store));

        Self {
            config,
            guard,
            delivery,
        }
    }
}
