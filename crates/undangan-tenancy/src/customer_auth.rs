//! Customer login.

use std::sync::OnceLock;

use tracing::{debug, info};
use undangan_auth::password;
use undangan_core::error::{UndanganError, UndanganResult};
use undangan_core::models::customer::Customer;
use undangan_core::models::invitation::{Invitation, InvitationFilter};
use undangan_core::repository::{CustomerRepository, InvitationRepository, Pagination};

use crate::config::TenancyConfig;

const TIMING_DECOY_PASSWORD: &str = "undangan-customer-decoy";

/// A successful customer login: the customer and the invitation the
/// dashboard opens on, which is the most recently created one.
#[derive(Debug, Clone)]
pub struct CustomerLogin {
    pub customer: Customer,
    pub invitation: Invitation,
}

pub struct CustomerAuthService<C: CustomerRepository, I: InvitationRepository> {
    customers: C,
    invitations: I,
    config: TenancyConfig,
    decoy_hash: OnceLock<String>,
}

impl<C: CustomerRepository, I: InvitationRepository> CustomerAuthService<C, I> {
    pub fn new(customers: C, invitations: I, config: TenancyConfig) -> Self {
        Self {
            customers,
            invitations,
            config,
            decoy_hash: OnceLock::new(),
        }
    }

    fn decoy_hash(&self) -> UndanganResult<&str> {
        if let Some(hash) = self.decoy_hash.get() {
            return Ok(hash);
        }
        let hash = password::hash_password(
            TIMING_DECOY_PASSWORD,
            self.config.pepper.as_deref(),
            self.config.hash_cost.as_ref(),
        )?;
        Ok(self.decoy_hash.get_or_init(|| hash))
    }

    /// Verify customer credentials. Unknown email and wrong password are
    /// both [`UndanganError::InvalidCredentials`]; a customer without any
    /// invitation is [`UndanganError::NotFound`].
    pub async fn login(&self, email: &str, plain_password: &str) -> UndanganResult<CustomerLogin> {
        let email = email.trim().to_lowercase();
        let plain_password = plain_password.trim();
        let pepper = self.config.pepper.as_deref();

        let customer = match self.customers.get_by_email(&email).await {
            Ok(c) => c,
            Err(e) if e.is_not_found() => {
                password::verify_password(plain_password, self.decoy_hash()?, pepper)?;
                debug!("customer login rejected");
                return Err(UndanganError::InvalidCredentials);
            }
            Err(e) => return Err(e),
        };

        if !password::verify_password(plain_password, &customer.password_hash, pepper)? {
            debug!(customer_id = %customer.id, "customer login rejected");
            return Err(UndanganError::InvalidCredentials);
        }

        let latest = self
            .invitations
            .list(
                InvitationFilter::for_customer(customer.id),
                Pagination::clamped(0, 1),
            )
            .await?;
        let invitation = latest
            .items
            .into_iter()
            .next()
            .ok_or_else(|| UndanganError::NotFound {
                entity: "invitation".into(),
                id: format!("customer={}", customer.id),
            })?;

        info!(customer_id = %customer.id, "customer logged in");
        Ok(CustomerLogin {
            customer,
            invitation,
        })
    }
}
