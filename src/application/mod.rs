//! Application services: feeds, authoring, follows, accounts and the guards
//! that sit between HTTP handlers and the repositories.

pub mod access;
pub mod auth;
pub mod error;
pub mod feed;
pub mod follows;
pub mod forms;
pub mod groups;
pub mod pagination;
pub mod posts;
pub mod repos;
pub mod routes;
