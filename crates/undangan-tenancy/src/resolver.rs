//! Host and preview-path resolution to a customer.

use tracing::debug;
use undangan_core::domain::{normalize_host, strip_base_domain};
use undangan_core::error::UndanganResult;
use undangan_core::models::customer::Customer;
use undangan_core::repository::CustomerRepository;

use crate::config::TenancyConfig;

/// Maps an incoming host (or preview owner token) to the customer that
/// owns it.
///
/// `Ok(None)` means nothing matched; `Err` is reserved for storage
/// failures so callers can tell a 404 from a 500.
pub struct DomainResolver<R: CustomerRepository> {
    customers: R,
    config: TenancyConfig,
}

impl<R: CustomerRepository> DomainResolver<R> {
    pub fn new(customers: R, config: TenancyConfig) -> Self {
        Self { customers, config }
    }

    /// Resolve a `Host` header value.
    ///
    /// An exact match on the stored domain wins. Otherwise, a host below
    /// the base domain is retried as its bare subdomain, which finds
    /// customers whose domain was stored as just the slug.
    pub async fn resolve(&self, host: &str) -> UndanganResult<Option<Customer>> {
        let host = normalize_host(host);
        if host.is_empty() {
            return Ok(None);
        }

        if let Some(customer) = self.customers.find_by_domain(&host).await? {
            return Ok(Some(customer));
        }

        let Some(base) = self.config.base_domain() else {
            debug!(%host, "no customer for host");
            return Ok(None);
        };
        let Some(bare) = strip_base_domain(&host, base) else {
            debug!(%host, "no customer for host");
            return Ok(None);
        };

        let found = self.customers.find_by_domain(bare).await?;
        if found.is_none() {
            debug!(%host, "no customer for host");
        }
        Ok(found)
    }

    /// Resolve the owner segment of a preview path. A dotless token that
    /// misses is retried under the base domain.
    pub async fn resolve_explicit(&self, owner: &str) -> UndanganResult<Option<Customer>> {
        let token = owner.trim().to_ascii_lowercase();
        if token.is_empty() {
            return Ok(None);
        }

        if let Some(customer) = self.customers.find_by_domain(&token).await? {
            return Ok(Some(customer));
        }

        match self.config.base_domain() {
            Some(base) if !token.contains('.') => {
                self.customers
                    .find_by_domain(&format!("{token}.{base}"))
                    .await
            }
            _ => Ok(None),
        }
    }
}
