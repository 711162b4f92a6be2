//! # herald-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Serve the **admin JSON API**: event catalog, event emission, rule CRUD,
//!   template upsert and listing, paginated automation logs
//! - Map HTTP requests into application service calls (driving adapter)
//! - Map [`HeraldError`](herald_domain::error::HeraldError) into status codes
//!
//! ## Dependency rule
//! Depends on `herald-app` (for port traits and services) and `herald-domain`
//! (for domain types used in request/response mapping). Never leaks axum types
//! into the domain.

pub mod api;
pub mod error;
pub mod router;
pub mod state;
