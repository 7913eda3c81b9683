//! Atomic customer + first invitation creation.

use surrealdb::{Connection, Surreal};
use tracing::debug;
use undangan_core::error::UndanganResult;
use undangan_core::models::customer::{CreateCustomer, Customer};
use undangan_core::models::invitation::{CreateInvitation, Invitation, normalize_content};
use undangan_core::repository::{CustomerRepository, InvitationRepository, RegistrationStore};
use uuid::Uuid;

use super::customer::normalize_domain;
use super::{SurrealCustomerRepository, SurrealInvitationRepository};
use crate::error::DbError;

const REGISTER_TX: &str = "\
BEGIN TRANSACTION;
CREATE type::record('customer', $customer_id) SET \
    full_name = $full_name, \
    email = $email, \
    password_hash = $password_hash, \
    domain = $domain, \
    status = $status;
CREATE type::record('invitation', $invitation_id) SET \
    customer_id = $customer_id, \
    slug = $slug, \
    title = $title, \
    search_name = $search_name, \
    event_date = $event_date, \
    theme_key = $theme_key, \
    is_published = $is_published, \
    content = $content;
COMMIT TRANSACTION;
";

/// Writes a customer and its first invitation in one transaction.
#[derive(Clone)]
pub struct SurrealRegistrationStore<C: Connection> {
    db: Surreal<C>,
    customers: SurrealCustomerRepository<C>,
    invitations: SurrealInvitationRepository<C>,
}

impl<C: Connection> SurrealRegistrationStore<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self {
            customers: SurrealCustomerRepository::new(db.clone()),
            invitations: SurrealInvitationRepository::new(db.clone()),
            db,
        }
    }

    /// A rolled-back transaction may only report a generic failure, so
    /// fall back to probing the unique keys that could have collided.
    async fn classify_failure(
        &self,
        err: surrealdb::Error,
        email: &str,
        domain: Option<&str>,
    ) -> UndanganResult<DbError> {
        let classified = DbError::from_statement(err);
        if matches!(classified, DbError::Conflict { .. }) {
            return Ok(classified);
        }

        match self.customers.get_by_email(email).await {
            Ok(_) => {
                return Ok(DbError::Conflict {
                    entity: "customer".into(),
                    key: "email".into(),
                });
            }
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e),
        }
        if let Some(domain) = domain {
            if self.customers.exists_by_domain(domain).await? {
                return Ok(DbError::Conflict {
                    entity: "customer".into(),
                    key: "domain".into(),
                });
            }
        }
        Ok(classified)
    }
}

impl<C: Connection> RegistrationStore for SurrealRegistrationStore<C> {
    async fn create_customer_with_invitation(
        &self,
        customer_id: Uuid,
        customer: CreateCustomer,
        invitation: CreateInvitation,
    ) -> UndanganResult<(Customer, Invitation)> {
        if invitation.customer_id != customer_id {
            return Err(DbError::Query(format!(
                "invitation owner {} does not match customer {customer_id}",
                invitation.customer_id
            ))
            .into());
        }

        let invitation_id = Uuid::new_v4();
        let email = customer.email.trim().to_lowercase();
        let domain = normalize_domain(customer.domain);

        let result = self
            .db
            .query(REGISTER_TX)
            .bind(("customer_id", customer_id.to_string()))
            .bind(("full_name", customer.full_name))
            .bind(("email", email.clone()))
            .bind(("password_hash", customer.password_hash))
            .bind(("domain", domain.clone()))
            .bind(("status", customer.status.as_str().to_string()))
            .bind(("invitation_id", invitation_id.to_string()))
            .bind(("slug", invitation.slug))
            .bind(("title", invitation.title))
            .bind(("search_name", invitation.search_name))
            .bind(("event_date", invitation.event_date))
            .bind(("theme_key", invitation.theme_key))
            .bind(("is_published", invitation.is_published))
            .bind(("content", normalize_content(invitation.content)))
            .await
            .map_err(DbError::from)?;

        if let Err(err) = result.check() {
            let classified = self.classify_failure(err, &email, domain.as_deref()).await?;
            debug!(%customer_id, error = %classified, "registration transaction rolled back");
            return Err(classified.into());
        }

        let customer = self.customers.get_by_id(customer_id).await?;
        let invitation = self.invitations.get_by_id(invitation_id).await?;
        Ok((customer, invitation))
    }
}
