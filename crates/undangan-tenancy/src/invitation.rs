//! Invitation management for operators (admin) and for customers
//! editing their own invitations.
//!
//! Slugs are unique per customer. Every write that changes a slug or
//! publishes an invitation runs the domain synchronizer afterwards.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::info;
use undangan_core::error::{UndanganError, UndanganResult};
use undangan_core::models::customer::Customer;
use undangan_core::models::invitation::{
    CreateInvitation, DEFAULT_THEME_KEY, Invitation, InvitationFilter, InvitationWithCustomer,
    UpdateInvitation, normalize_content, search_key,
};
use undangan_core::repository::{
    CustomerRepository, InvitationRepository, PaginatedResult, Pagination,
};
use undangan_core::slug::{ensure_unique_slug, first_slug, slugify};
use uuid::Uuid;

use crate::config::TenancyConfig;
use crate::sync::DomainSynchronizer;

/// Operator input for a new invitation.
#[derive(Debug, Clone, Default)]
pub struct NewInvitation {
    pub customer_id: Uuid,
    /// Requested slug; the title is used when this slugifies to nothing.
    pub slug: Option<String>,
    pub title: String,
    /// Defaults to the title.
    pub search_name: Option<String>,
    pub event_date: Option<DateTime<Utc>>,
    pub theme_key: Option<String>,
    pub is_published: bool,
    pub content: Option<serde_json::Value>,
}

/// Slug allocation and post-write domain sync shared by both services.
struct InvitationWriter<C: CustomerRepository, I: InvitationRepository> {
    invitations: I,
    sync: DomainSynchronizer<C>,
}

impl<C: CustomerRepository, I: InvitationRepository> InvitationWriter<C, I> {
    async fn allocate_slug(&self, customer_id: Uuid, base: &str) -> UndanganResult<String> {
        let invitations = &self.invitations;
        ensure_unique_slug(base, move |candidate| async move {
            invitations
                .exists_by_customer_and_slug(customer_id, &candidate)
                .await
        })
        .await
    }

    async fn update(
        &self,
        current: Invitation,
        mut input: UpdateInvitation,
    ) -> UndanganResult<Invitation> {
        input.slug = match input.slug.as_deref().map(slugify) {
            Some(slug) if !slug.is_empty() && slug != current.slug => {
                Some(self.allocate_slug(current.customer_id, &slug).await?)
            }
            _ => None,
        };
        input.title = input.title.map(|t| t.trim().to_string());
        input.search_name = match (input.search_name.take(), &input.title) {
            (Some(name), _) => Some(search_key(&name)),
            (None, Some(title)) => Some(search_key(title)),
            (None, None) => None,
        };
        input.theme_key = input
            .theme_key
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());

        let renamed = input.slug.is_some();
        let updated = self.invitations.update(current.id, input).await?;

        if renamed {
            self.sync
                .propagate_rename(updated.customer_id, &current.slug, &updated.slug)
                .await?;
        }
        if updated.is_published {
            self.sync
                .claim_on_publish(updated.customer_id, &updated.slug)
                .await?;
        }

        Ok(updated)
    }
}

// ---------------------------------------------------------------------------
// Admin
// ---------------------------------------------------------------------------

/// Operator-side invitation management.
pub struct AdminInvitationService<C: CustomerRepository, I: InvitationRepository> {
    customers: C,
    writer: InvitationWriter<C, I>,
}

impl<C, I> AdminInvitationService<C, I>
where
    C: CustomerRepository + Clone,
    I: InvitationRepository,
{
    pub fn new(customers: C, invitations: I, config: TenancyConfig) -> Self {
        Self {
            writer: InvitationWriter {
                invitations,
                sync: DomainSynchronizer::new(customers.clone(), config),
            },
            customers,
        }
    }

    /// Create an invitation for a paying customer.
    pub async fn create(&self, input: NewInvitation) -> UndanganResult<Invitation> {
        let customer = self.customers.get_by_id(input.customer_id).await?;
        if !customer.status.is_paid() {
            return Err(UndanganError::CustomerNotPaid {
                customer_id: customer.id.to_string(),
            });
        }

        let title = input.title.trim().to_string();
        let base = first_slug([input.slug.as_deref().unwrap_or(""), title.as_str()]);
        let slug = self.writer.allocate_slug(customer.id, &base).await?;
        let search_name = search_key(input.search_name.as_deref().unwrap_or(&title));
        let theme_key = input
            .theme_key
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_THEME_KEY)
            .to_string();

        let invitation = self
            .writer
            .invitations
            .create(CreateInvitation {
                customer_id: customer.id,
                slug,
                title,
                search_name,
                event_date: input.event_date,
                theme_key,
                is_published: input.is_published,
                content: Some(normalize_content(input.content)),
            })
            .await?;

        info!(
            invitation_id = %invitation.id,
            customer_id = %customer.id,
            slug = %invitation.slug,
            "invitation created"
        );

        if invitation.is_published {
            self.writer
                .sync
                .claim_on_publish(customer.id, &invitation.slug)
                .await?;
        }

        Ok(invitation)
    }

    pub async fn update(&self, id: Uuid, input: UpdateInvitation) -> UndanganResult<Invitation> {
        let current = self.writer.invitations.get_by_id(id).await?;
        self.writer.update(current, input).await
    }

    pub async fn get(&self, id: Uuid) -> UndanganResult<Invitation> {
        self.writer.invitations.get_by_id(id).await
    }

    /// Newest first. `limit` is clamped to 1..=100, zero meaning 20.
    pub async fn list(
        &self,
        filter: InvitationFilter,
        offset: u64,
        limit: u64,
    ) -> UndanganResult<PaginatedResult<Invitation>> {
        self.writer
            .invitations
            .list(filter, Pagination::clamped(offset, limit))
            .await
    }

    /// [`list`](Self::list) with each owner's name and domain attached.
    /// Invitations whose owner is gone keep an empty name.
    pub async fn list_with_customer(
        &self,
        filter: InvitationFilter,
        offset: u64,
        limit: u64,
    ) -> UndanganResult<PaginatedResult<InvitationWithCustomer>> {
        let page = self.list(filter, offset, limit).await?;

        let mut owners: HashMap<Uuid, Option<Customer>> = HashMap::new();
        let mut items = Vec::with_capacity(page.items.len());
        for invitation in page.items {
            if !owners.contains_key(&invitation.customer_id) {
                let owner = match self.customers.get_by_id(invitation.customer_id).await {
                    Ok(c) => Some(c),
                    Err(e) if e.is_not_found() => None,
                    Err(e) => return Err(e),
                };
                owners.insert(invitation.customer_id, owner);
            }
            let owner = owners.get(&invitation.customer_id).and_then(Option::as_ref);
            items.push(InvitationWithCustomer {
                customer_name: owner.map(|c| c.full_name.clone()).unwrap_or_default(),
                customer_domain: owner.and_then(|c| c.domain().map(str::to_string)),
                invitation,
            });
        }

        Ok(PaginatedResult {
            items,
            total: page.total,
            offset: page.offset,
            limit: page.limit,
        })
    }

    pub async fn delete(&self, id: Uuid) -> UndanganResult<()> {
        self.writer.invitations.delete(id).await?;
        info!(invitation_id = %id, "invitation deleted");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Customer
// ---------------------------------------------------------------------------

/// Customer-side access to the customer's own invitations.
pub struct CustomerInvitationService<C: CustomerRepository, I: InvitationRepository> {
    writer: InvitationWriter<C, I>,
}

impl<C, I> CustomerInvitationService<C, I>
where
    C: CustomerRepository,
    I: InvitationRepository,
{
    pub fn new(customers: C, invitations: I, config: TenancyConfig) -> Self {
        Self {
            writer: InvitationWriter {
                invitations,
                sync: DomainSynchronizer::new(customers, config),
            },
        }
    }

    /// Another customer's invitation is reported as not found.
    pub async fn get(&self, customer_id: Uuid, id: Uuid) -> UndanganResult<Invitation> {
        let invitation = self.writer.invitations.get_by_id(id).await?;
        if invitation.customer_id != customer_id {
            return Err(UndanganError::NotFound {
                entity: "invitation".into(),
                id: id.to_string(),
            });
        }
        Ok(invitation)
    }

    /// The customer's invitations, newest first.
    pub async fn list(
        &self,
        customer_id: Uuid,
        offset: u64,
        limit: u64,
    ) -> UndanganResult<PaginatedResult<Invitation>> {
        self.writer
            .invitations
            .list(
                InvitationFilter::for_customer(customer_id),
                Pagination::clamped(offset, limit),
            )
            .await
    }

    pub async fn update(
        &self,
        customer_id: Uuid,
        id: Uuid,
        input: UpdateInvitation,
    ) -> UndanganResult<Invitation> {
        let current = self.get(customer_id, id).await?;
        self.writer.update(current, input).await
    }

    /// Content of a published invitation for the public page. `None` when
    /// the slug is unknown or not published.
    pub async fn published_content(
        &self,
        customer_id: Uuid,
        slug: &str,
    ) -> UndanganResult<Option<serde_json::Value>> {
        let slug = slug.trim();
        if slug.is_empty() {
            return Ok(None);
        }
        Ok(self
            .writer
            .invitations
            .find_published(customer_id, slug)
            .await?
            .map(|inv| normalize_content(Some(inv.content))))
    }
}
