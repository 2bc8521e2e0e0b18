//! Hand-off of confirmed submissions.

use async_trait::async_trait;

use formguard_common::FormGuardError;

use crate::protocol::FormSession;

/// Receives the data of a confirmed submission
#[async_trait]
pub trait Delivery: Send + Sync {
    async fn deliver(&self, session: &FormSession) -> Result<(), FormGuardError>;
}

/// Writes submissions to the structured log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogDelivery;

#[async_trait]
impl Delivery for LogDelivery {
    async fn deliver(&self, session: &FormSession) -> Result<(), FormGuardError> {
        let fields = serde_json::to_string(&session.summary())?;
        let extra = session.extra_data();
        tracing::info!(
            form = %session.form_name,
            fields = %fields,
            extra = %extra.trim_end(),
            "Form submission delivered"
        );
        Ok(())
    }
}
