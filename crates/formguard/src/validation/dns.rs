//! Mail domain lookups for the `email` rule.
//!
//! Each lookup is bounded by a timeout; a timeout counts as "no record"
//! so a slow resolver can only make validation fail, never hang it.

use async_trait::async_trait;
use hickory_resolver::TokioAsyncResolver;
use std::collections::HashSet;
use std::time::Duration;

use formguard_common::FormGuardError;

/// DNS capability used by the validation engine
#[async_trait]
pub trait DnsResolver: Send + Sync {
    /// Domain publishes at least one MX record
    async fn has_mx(&self, domain: &str) -> bool;

    /// Domain resolves to at least one address
    async fn has_address(&self, domain: &str) -> bool;
}

/// Resolver backed by the system DNS configuration
pub struct HickoryResolver {
    inner: TokioAsyncResolver,
}

impl HickoryResolver {
    pub fn from_system_conf() -> Result<Self, FormGuardError> {
        let inner = TokioAsyncResolver::tokio_from_system_conf()
            .map_err(|e| FormGuardError::Dns(e.to_string()))?;
        Ok(Self { inner })
    }
}

/// Absolute name so search domains are never appended
fn fqdn(domain: &str) -> String {
    format!("{}.", domain.trim_end_matches('.'))
}

#[async_trait]
impl DnsResolver for HickoryResolver {
    async fn has_mx(&self, domain: &str) -> bool {
        match self.inner.mx_lookup(fqdn(domain)).await {
            Ok(lookup) => lookup.iter().next().is_some(),
            Err(e) => {
                tracing::debug!(domain = %domain, error = %e, "MX lookup failed");
                false
            }
        }
    }

    async fn has_address(&self, domain: &str) -> bool {
        match self.inner.lookup_ip(fqdn(domain)).await {
            Ok(lookup) => lookup.iter().next().is_some(),
            Err(e) => {
                tracing::debug!(domain = %domain, error = %e, "Address lookup failed");
                false
            }
        }
    }
}

/// Fixed answers, for tests and offline runs
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    mx: HashSet<String>,
    address: HashSet<String>,
    delay: Option<Duration>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mx(mut self, domain: &str) -> Self {
        self.mx.insert(domain.to_ascii_lowercase());
        self
    }

    pub fn with_address(mut self, domain: &str) -> Self {
        self.address.insert(domain.to_ascii_lowercase());
        self
    }

    /// Answer only after sleeping, to exercise lookup timeouts
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl DnsResolver for StaticResolver {
    async fn has_mx(&self, domain: &str) -> bool {
        self.pause().await;
        self.mx.contains(&domain.to_ascii_lowercase())
    }

    async fn has_address(&self, domain: &str) -> bool {
        self.pause().await;
        self.address.contains(&domain.to_ascii_lowercase())
    }
}

/// True when the domain has an MX record or, failing that, an address.
pub async fn domain_accepts_mail(resolver: &dyn DnsResolver, domain: &str, timeout: Duration) -> bool {
    match tokio::time::timeout(timeout, resolver.has_mx(domain)).await {
        Ok(true) => return true,
        Ok(false) => {}
        Err(_) => tracing::warn!(domain = %domain, "MX lookup timed out"),
    }

    match tokio::time::timeout(timeout, resolver.has_address(domain)).await {
        Ok(found) => found,
        Err(_) => {
            tracing::warn!(domain = %domain, "Address lookup timed out");
            false
        }
    }
}
