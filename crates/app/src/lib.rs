//! # herald-app
//!
//! Application layer — use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `RuleRepository` — CRUD for automation rules and their actions
//!   - `TemplateRepository` — lookup & upsert of channel templates
//!   - `LogStore` — append & page through automation logs
//!   - `EmailSender`, `PushSender`, `ChatSender`, `WebhookSender` — delivery channels
//! - Define **driving/inbound ports** as use-case structs/traits:
//!   - `EventEmitter` — fire-and-forget event emission
//!   - `RuleService`, `TemplateService`, `LogService` — administration
//!   - `RuleEngine` — evaluate rules, dispatch actions, record logs
//! - Provide **in-process infrastructure** (event bus, worker pool, rule cache)
//!   that doesn't need IO
//! - Orchestrate domain objects without knowing *how* persistence or delivery works
//!
//! ## Dependency rule
//! Depends on `herald-domain` only (plus `tokio` for channels, tasks and timers).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod dispatcher;
pub mod event_bus;
pub mod execution_logger;
pub mod ports;
pub mod rule_cache;
pub mod rule_engine;
pub mod services;
pub mod worker;

#[cfg(test)]
mod testing;
