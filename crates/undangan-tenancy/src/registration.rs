//! Self-service sign-up: a customer and its first invitation.

use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::{info, warn};
use undangan_auth::password;
use undangan_core::domain::build_customer_domain;
use undangan_core::error::{UndanganError, UndanganResult};
use undangan_core::models::customer::{CreateCustomer, CustomerStatus};
use undangan_core::models::invitation::{CreateInvitation, DEFAULT_THEME_KEY, search_key};
use undangan_core::repository::{CustomerRepository, RegistrationStore};
use undangan_core::slug::{first_slug, next_free_slug};
use uuid::Uuid;

use crate::config::TenancyConfig;

#[derive(Debug, Clone, Default)]
pub struct RegisterInput {
    pub full_name: String,
    pub email: String,
    pub password: String,
    /// Requested slug; falls back to the title, then the full name.
    pub slug: Option<String>,
    pub title: String,
    pub event_date: Option<DateTime<Utc>>,
    pub theme_key: Option<String>,
    pub content: Option<serde_json::Value>,
}

#[derive(Debug, Clone)]
pub struct Registration {
    pub customer_id: Uuid,
    pub invitation_id: Uuid,
    pub slug: String,
    pub domain: String,
}

pub struct RegistrationService<R: CustomerRepository, S: RegistrationStore> {
    customers: R,
    store: S,
    config: TenancyConfig,
}

impl<R: CustomerRepository, S: RegistrationStore> RegistrationService<R, S> {
    pub fn new(customers: R, store: S, config: TenancyConfig) -> Self {
        Self {
            customers,
            store,
            config,
        }
    }

    /// Register a customer. The slug doubles as the customer's domain, so
    /// uniqueness is checked against every customer's domain.
    ///
    /// A candidate lost to a concurrent commit counts as taken: allocation
    /// resumes at the next suffix within the same probe budget.
    pub async fn register(&self, input: RegisterInput) -> UndanganResult<Registration> {
        let full_name = input.full_name.trim().to_string();
        let email = input.email.trim().to_lowercase();
        let plain_password = input.password.trim();
        if full_name.is_empty() || email.is_empty() || plain_password.is_empty() {
            return Err(UndanganError::Validation {
                message: "full name, email and password are required".into(),
            });
        }

        let password_hash = password::hash_password(
            plain_password,
            self.config.pepper.as_deref(),
            self.config.hash_cost.as_ref(),
        )?;

        let title = input.title.trim().to_string();
        let theme_key = input
            .theme_key
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_THEME_KEY)
            .to_string();
        let search_name = search_key(if title.is_empty() { &full_name } else { &title });
        let content = registration_content(input.content, &full_name);
        let base_slug = first_slug([
            input.slug.as_deref().unwrap_or(""),
            title.as_str(),
            full_name.as_str(),
        ]);
        let base_domain = self.config.base_domain();

        let mut start = 0;
        loop {
            let (position, slug) = next_free_slug(&base_slug, start, move |candidate| async move {
                self.customers
                    .exists_by_domain(&build_customer_domain(&candidate, base_domain))
                    .await
            })
            .await?;
            let domain = build_customer_domain(&slug, base_domain);

            let customer_id = Uuid::new_v4();
            let result = self
                .store
                .create_customer_with_invitation(
                    customer_id,
                    CreateCustomer {
                        full_name: full_name.clone(),
                        email: email.clone(),
                        password_hash: password_hash.clone(),
                        domain: Some(domain.clone()),
                        status: CustomerStatus::Pending,
                    },
                    CreateInvitation {
                        customer_id,
                        slug: slug.clone(),
                        title: title.clone(),
                        search_name: search_name.clone(),
                        event_date: input.event_date,
                        theme_key: theme_key.clone(),
                        is_published: false,
                        content: Some(content.clone()),
                    },
                )
                .await;

            match result {
                Ok((customer, invitation)) => {
                    info!(
                        customer_id = %customer.id,
                        invitation_id = %invitation.id,
                        %slug,
                        %domain,
                        "customer registered"
                    );
                    return Ok(Registration {
                        customer_id: customer.id,
                        invitation_id: invitation.id,
                        slug,
                        domain,
                    });
                }
                Err(e) if e.is_conflict_on("domain") => {
                    warn!(%domain, position, "domain taken at commit, trying the next suffix");
                    start = position + 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Supplied content, or a starter document naming the groom after the
/// registering customer.
fn registration_content(content: Option<serde_json::Value>, full_name: &str) -> serde_json::Value {
    match content {
        Some(serde_json::Value::Null) | None => {}
        Some(serde_json::Value::Object(map)) if map.is_empty() => {}
        Some(value) => return value,
    }

    let first_name = full_name.split_whitespace().next().unwrap_or_default();
    json!({
        "couple": {
            "groomName": first_name,
            "groomFullName": full_name,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starter_content_uses_first_name() {
        let content = registration_content(None, "Budi Santoso");
        assert_eq!(content["couple"]["groomName"], "Budi");
        assert_eq!(content["couple"]["groomFullName"], "Budi Santoso");
        assert_eq!(registration_content(Some(json!({})), "Budi")["couple"]["groomName"], "Budi");
    }

    #[test]
    fn supplied_content_is_kept() {
        let supplied = json!({"theme": {"color": "gold"}});
        assert_eq!(registration_content(Some(supplied.clone()), "Budi"), supplied);
    }
}
