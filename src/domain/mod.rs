//! Domain layer types and invariants.

pub mod entities;
pub mod error;
pub mod follows;
pub mod slug;
pub mod text;
