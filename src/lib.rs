//! Yatube: a blogging service with groups, comments and author subscriptions.
//!
//! Layers, innermost first: `domain` (records and pure rules), `application`
//! (services over repository traits), `infra` (Postgres, filesystem, HTTP),
//! `presentation` (askama views) and `cache` (the per-URL response cache).

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
pub mod presentation;
