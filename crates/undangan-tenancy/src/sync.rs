//! Keeps a customer's domain in step with its invitation slugs.
//!
//! Both rules are conditional writes. A write that loses a race, or that
//! would collide with another customer's domain, leaves the row alone
//! and is reported as "unchanged" rather than as an error.

use tracing::{debug, info, warn};
use undangan_core::domain::{build_customer_domain, slug_domain_forms};
use undangan_core::error::{UndanganError, UndanganResult};
use undangan_core::repository::CustomerRepository;
use uuid::Uuid;

use crate::config::TenancyConfig;

pub struct DomainSynchronizer<R: CustomerRepository> {
    customers: R,
    config: TenancyConfig,
}

impl<R: CustomerRepository> DomainSynchronizer<R> {
    pub fn new(customers: R, config: TenancyConfig) -> Self {
        Self { customers, config }
    }

    /// Publish-time claim: give a customer without a domain the one
    /// derived from `slug`. Returns whether the domain was written.
    pub async fn claim_on_publish(&self, customer_id: Uuid, slug: &str) -> UndanganResult<bool> {
        let slug = slug.trim();
        if slug.is_empty() {
            return Ok(false);
        }

        let customer = match self.customers.get_by_id(customer_id).await {
            Ok(c) => c,
            Err(e) if e.is_not_found() => return Ok(false),
            Err(e) => return Err(e),
        };
        if customer.domain().is_some() {
            return Ok(false);
        }

        let domain = build_customer_domain(slug, self.config.base_domain());
        let claimed = absorb_conflict(
            self.customers.set_domain_if_empty(customer_id, &domain).await,
            customer_id,
            &domain,
        )?;
        if claimed {
            info!(%customer_id, %domain, "customer domain claimed on publish");
        }
        Ok(claimed)
    }

    /// Slug rename: follow the new slug only when the current domain is
    /// still the one derived from the old slug, keeping its bare or
    /// qualified form. Custom domains are never touched.
    pub async fn propagate_rename(
        &self,
        customer_id: Uuid,
        old_slug: &str,
        new_slug: &str,
    ) -> UndanganResult<bool> {
        let (old_slug, new_slug) = (old_slug.trim(), new_slug.trim());
        if old_slug.is_empty() || new_slug.is_empty() || old_slug == new_slug {
            return Ok(false);
        }

        let customer = match self.customers.get_by_id(customer_id).await {
            Ok(c) => c,
            Err(e) if e.is_not_found() => return Ok(false),
            Err(e) => return Err(e),
        };
        let Some(current) = customer.domain().map(str::to_string) else {
            return Ok(false);
        };

        let base = self.config.base_domain();
        let old_forms = slug_domain_forms(old_slug, base);
        let new_forms = slug_domain_forms(new_slug, base);
        let Some(form) = old_forms.iter().position(|d| *d == current) else {
            debug!(%customer_id, "customer domain is custom, rename not propagated");
            return Ok(false);
        };
        let domain = &new_forms[form];

        let replaced = absorb_conflict(
            self.customers.replace_domain(customer_id, &current, domain).await,
            customer_id,
            domain,
        )?;
        if replaced {
            info!(%customer_id, from = %current, to = %domain, "customer domain follows slug");
        }
        Ok(replaced)
    }
}

fn absorb_conflict(
    result: UndanganResult<bool>,
    customer_id: Uuid,
    domain: &str,
) -> UndanganResult<bool> {
    match result {
        Err(UndanganError::AlreadyExists { key, .. }) if key == "domain" => {
            warn!(%customer_id, %domain, "domain already taken by another customer");
            Ok(false)
        }
        other => other,
    }
}
