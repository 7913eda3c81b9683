//! SurrealDB repository implementations.

mod customer;
mod invitation;
mod registration;
mod session;
mod user;

pub use customer::SurrealCustomerRepository;
pub use invitation::SurrealInvitationRepository;
pub use registration::SurrealRegistrationStore;
pub use session::SurrealSessionRepository;
pub use user::SurrealUserRepository;

use surrealdb_types::SurrealValue;

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

impl CountRow {
    fn total(rows: &[CountRow]) -> u64 {
        rows.first().map(|r| r.total).unwrap_or(0)
    }
}
