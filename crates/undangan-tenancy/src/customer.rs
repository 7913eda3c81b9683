//! Operator-side customer management: listing, payment status and
//! explicit domain assignment.

use tracing::info;
use undangan_core::domain::normalize_host;
use undangan_core::error::{UndanganError, UndanganResult};
use undangan_core::models::customer::{Customer, CustomerStatus, UpdateCustomer};
use undangan_core::repository::{CustomerRepository, Pagination};
use uuid::Uuid;

pub struct AdminCustomerService<C: CustomerRepository> {
    customers: C,
}

impl<C: CustomerRepository> AdminCustomerService<C> {
    pub fn new(customers: C) -> Self {
        Self { customers }
    }

    /// Newest customers first. `limit` is clamped like list paging.
    pub async fn list(&self, limit: u64) -> UndanganResult<Vec<Customer>> {
        self.customers
            .list(Pagination::clamped(0, limit).limit)
            .await
    }

    pub async fn get(&self, id: Uuid) -> UndanganResult<Customer> {
        self.customers.get_by_id(id).await
    }

    /// Marking a customer `paid` opens the admin invitation gate.
    pub async fn set_status(&self, id: Uuid, status: CustomerStatus) -> UndanganResult<Customer> {
        let customer = self
            .customers
            .update(
                id,
                UpdateCustomer {
                    status: Some(status),
                    ..Default::default()
                },
            )
            .await?;
        info!(customer_id = %id, %status, "customer status changed");
        Ok(customer)
    }

    /// Assign a domain outright, bypassing the publish and rename rules.
    ///
    /// The value is normalized like a Host header. A blank value clears
    /// the domain. A domain held by another customer is
    /// [`UndanganError::AlreadyExists`] on `domain`.
    pub async fn set_domain(&self, id: Uuid, domain: Option<&str>) -> UndanganResult<Customer> {
        let domain = domain.map(normalize_host).filter(|d| !d.is_empty());
        if let Some(d) = &domain {
            if d.chars().any(|c| c.is_whitespace() || c == '/') {
                return Err(UndanganError::Validation {
                    message: format!("invalid domain: {d}"),
                });
            }
        }

        let customer = self
            .customers
            .update(
                id,
                UpdateCustomer {
                    domain: Some(domain.clone()),
                    ..Default::default()
                },
            )
            .await?;
        match &domain {
            Some(d) => info!(customer_id = %id, domain = %d, "customer domain assigned"),
            None => info!(customer_id = %id, "customer domain cleared"),
        }
        Ok(customer)
    }
}
