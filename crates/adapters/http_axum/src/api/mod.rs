//! JSON REST API handler modules.

#[allow(clippy::missing_errors_doc)]
pub mod events;
#[allow(clippy::missing_errors_doc)]
pub mod logs;
#[allow(clippy::missing_errors_doc)]
pub mod rules;
#[allow(clippy::missing_errors_doc)]
pub mod templates;

use axum::Router;
use axum::routing::{get, post, put};

use herald_app::ports::{EventEmitter, LogStore, RuleRepository, TemplateRepository};

use crate::state::AppState;

/// Build the `/api` sub-router.
pub fn routes<R, T, L, E>() -> Router<AppState<R, T, L, E>>
where
    R: RuleRepository + Send + Sync + 'static,
    T: TemplateRepository + Send + Sync + 'static,
    L: LogStore + Send + Sync + 'static,
    E: EventEmitter + Send + Sync + 'static,
{
    Router::new()
        // Event catalog
        .route("/events", get(events::list::<R, T, L, E>))
        .route("/events/{name}", get(events::get::<R, T, L, E>))
        .route("/events/{name}/emit", post(events::emit::<R, T, L, E>))
        // Rules
        .route(
            "/rules",
            get(rules::list::<R, T, L, E>).post(rules::create::<R, T, L, E>),
        )
        .route(
            "/rules/{id}",
            get(rules::get::<R, T, L, E>)
                .put(rules::update::<R, T, L, E>)
                .delete(rules::delete::<R, T, L, E>),
        )
        .route(
            "/rules/{id}/actions",
            put(rules::replace_actions::<R, T, L, E>),
        )
        .route("/rules/{id}/toggle", post(rules::toggle::<R, T, L, E>))
        // Templates
        .route(
            "/templates",
            get(templates::list::<R, T, L, E>).put(templates::upsert::<R, T, L, E>),
        )
        // Automation logs
        .route("/logs", get(logs::list::<R, T, L, E>))
}
