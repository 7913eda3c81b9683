//! Undangan Tenancy — everything that binds a customer to the strings it
//! is reachable by: host resolution, domain synchronization, registration,
//! invitation and customer management, and customer login.

pub mod config;
pub mod customer;
pub mod customer_auth;
pub mod invitation;
pub mod registration;
pub mod resolver;
pub mod sync;

pub use config::TenancyConfig;
pub use customer::AdminCustomerService;
pub use customer_auth::{CustomerAuthService, CustomerLogin};
pub use invitation::{AdminInvitationService, CustomerInvitationService, NewInvitation};
pub use registration::{RegisterInput, Registration, RegistrationService};
pub use resolver::DomainResolver;
pub use sync::DomainSynchronizer;
