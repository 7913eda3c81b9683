//! Domain models for Undangan.

pub mod customer;
pub mod invitation;
pub mod session;
pub mod user;
