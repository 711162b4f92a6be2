//! # herald-domain
//!
//! Pure domain model for the herald notification automation engine.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define the **Event Catalog** (registered event names and their variables)
//! - Define **Domain Events** (one occurrence of a catalogued event)
//! - Define **Automation Rules** (event type → condition tree → ordered actions)
//! - Evaluate **Conditions** against an event payload
//! - Define **Templates** and render them with `{{path}}` interpolation
//! - Define the channel **Notifications** handed to senders
//! - Define the **Automation Log** (audit record of one rule firing)
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod catalog;
pub mod event;
pub mod log;
pub mod notification;
pub mod payload;
pub mod rule;
pub mod template;
