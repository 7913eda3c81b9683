//! Undangan Core — domain models, error taxonomy, repository traits and
//! the pure slug/domain helpers shared by every other crate.

pub mod clock;
pub mod domain;
pub mod error;
pub mod models;
pub mod repository;
pub mod slug;
