//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Lookups named `get_*` fail with
//! [`UndanganError::NotFound`](crate::error::UndanganError::NotFound);
//! lookups named `find_*` return `None` instead, for callers where absence
//! is an expected outcome. Conditional writes report whether a row changed.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::UndanganResult;
use crate::models::{
    customer::{CreateCustomer, Customer, UpdateCustomer},
    invitation::{CreateInvitation, Invitation, InvitationFilter, UpdateInvitation},
    session::{CreateSession, Session},
    user::{CreateUser, User},
};

/// Pagination parameters for list queries.
#[derive(Debug, Clone)]
pub struct Pagination {
    pub offset: u64,
    pub limit: u64,
}

impl Pagination {
    pub const DEFAULT_LIMIT: u64 = 20;
    pub const MAX_LIMIT: u64 = 100;

    /// Clamp caller-supplied values: a zero limit becomes the default,
    /// anything above the maximum is capped.
    pub fn clamped(offset: u64, limit: u64) -> Self {
        let limit = match limit {
            0 => Self::DEFAULT_LIMIT,
            l => l.min(Self::MAX_LIMIT),
        };
        Self { offset, limit }
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: Self::DEFAULT_LIMIT,
        }
    }
}

/// A paginated result set.
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

// ---------------------------------------------------------------------------
// Customers & invitations
// ---------------------------------------------------------------------------

pub trait CustomerRepository: Send + Sync {
    fn create(&self, input: CreateCustomer) -> impl Future<Output = UndanganResult<Customer>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = UndanganResult<Customer>> + Send;
    fn get_by_email(&self, email: &str) -> impl Future<Output = UndanganResult<Customer>> + Send;
    /// Exact match on the stored domain.
    fn find_by_domain(
        &self,
        domain: &str,
    ) -> impl Future<Output = UndanganResult<Option<Customer>>> + Send;
    fn exists_by_domain(&self, domain: &str) -> impl Future<Output = UndanganResult<bool>> + Send;
    /// Newest first, at most `limit` rows.
    fn list(&self, limit: u64) -> impl Future<Output = UndanganResult<Vec<Customer>>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateCustomer,
    ) -> impl Future<Output = UndanganResult<Customer>> + Send;
    /// Set the domain only while it is still unset.
    fn set_domain_if_empty(
        &self,
        id: Uuid,
        domain: &str,
    ) -> impl Future<Output = UndanganResult<bool>> + Send;
    /// Replace the domain only while it still equals `expected`.
    fn replace_domain(
        &self,
        id: Uuid,
        expected: &str,
        domain: &str,
    ) -> impl Future<Output = UndanganResult<bool>> + Send;
}

pub trait InvitationRepository: Send + Sync {
    fn create(
        &self,
        input: CreateInvitation,
    ) -> impl Future<Output = UndanganResult<Invitation>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = UndanganResult<Invitation>> + Send;
    fn find_published(
        &self,
        customer_id: Uuid,
        slug: &str,
    ) -> impl Future<Output = UndanganResult<Option<Invitation>>> + Send;
    fn exists_by_customer_and_slug(
        &self,
        customer_id: Uuid,
        slug: &str,
    ) -> impl Future<Output = UndanganResult<bool>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateInvitation,
    ) -> impl Future<Output = UndanganResult<Invitation>> + Send;
    fn delete(&self, id: Uuid) -> impl Future<Output = UndanganResult<()>> + Send;
    /// Newest first. `total` counts every match, not just the page.
    fn list(
        &self,
        filter: InvitationFilter,
        pagination: Pagination,
    ) -> impl Future<Output = UndanganResult<PaginatedResult<Invitation>>> + Send;
}

/// Atomic creation of a customer together with its first invitation.
pub trait RegistrationStore: Send + Sync {
    /// Insert both rows in one transaction under `customer_id`.
    /// `invitation.customer_id` must equal `customer_id`. A uniqueness
    /// violation rolls back both rows and surfaces as
    /// [`UndanganError::AlreadyExists`](crate::error::UndanganError::AlreadyExists).
    fn create_customer_with_invitation(
        &self,
        customer_id: Uuid,
        customer: CreateCustomer,
        invitation: CreateInvitation,
    ) -> impl Future<Output = UndanganResult<(Customer, Invitation)>> + Send;
}

// ---------------------------------------------------------------------------
// Admin principals & refresh sessions
// ---------------------------------------------------------------------------

pub trait UserRepository: Send + Sync {
    fn create(&self, input: CreateUser) -> impl Future<Output = UndanganResult<User>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = UndanganResult<User>> + Send;
    fn get_by_email(&self, email: &str) -> impl Future<Output = UndanganResult<User>> + Send;
}

/// Sole writer of refresh-session rows.
pub trait SessionRepository: Send + Sync {
    fn create(&self, input: CreateSession) -> impl Future<Output = UndanganResult<Session>> + Send;
    fn get_by_token_hash(
        &self,
        token_hash: &str,
    ) -> impl Future<Output = UndanganResult<Session>> + Send;
    /// Move the expiry of an unrevoked session.
    fn touch(
        &self,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> impl Future<Output = UndanganResult<bool>> + Send;
    /// Revoke a single session. Already-revoked sessions are left alone.
    fn revoke(
        &self,
        token_hash: &str,
        at: DateTime<Utc>,
    ) -> impl Future<Output = UndanganResult<bool>> + Send;
    /// Revoke every live session of a user; returns how many changed.
    fn revoke_user_sessions(
        &self,
        user_id: Uuid,
        at: DateTime<Utc>,
    ) -> impl Future<Output = UndanganResult<u64>> + Send;
    /// Delete sessions that are expired at `now` or revoked.
    fn cleanup(&self, now: DateTime<Utc>) -> impl Future<Output = UndanganResult<u64>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_is_clamped() {
        let p = Pagination::clamped(5, 0);
        assert_eq!((p.offset, p.limit), (5, 20));
        assert_eq!(Pagination::clamped(0, 500).limit, 100);
        assert_eq!(Pagination::clamped(0, 7).limit, 7);
    }
}
