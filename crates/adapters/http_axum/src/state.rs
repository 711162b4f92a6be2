//! Shared application state for axum handlers.

use std::sync::Arc;

use herald_app::ports::{EventEmitter, LogStore, RuleRepository, TemplateRepository};
use herald_app::services::log_service::LogService;
use herald_app::services::rule_service::RuleService;
use herald_app::services::template_service::TemplateService;
use herald_domain::catalog::EventCatalog;

/// Application state shared across all axum handlers.
///
/// Generic over the rule repository, template repository, log store and
/// event emitter to avoid dynamic dispatch. `Clone` is implemented manually
/// so the underlying types themselves do not need to be `Clone`; only the
/// `Arc` wrappers are cloned.
pub struct AppState<R, T, L, E> {
    /// Rule CRUD service.
    pub rule_service: Arc<RuleService<R>>,
    /// Template administration service.
    pub template_service: Arc<TemplateService<T>>,
    /// Audit log reader.
    pub log_service: Arc<LogService<L>>,
    /// Entry point for emitting domain events.
    pub emitter: Arc<E>,
    /// Registered event types.
    pub catalog: Arc<EventCatalog>,
}

impl<R, T, L, E> Clone for AppState<R, T, L, E> {
    fn clone(&self) -> Self {
        Self {
            rule_service: Arc::clone(&self.rule_service),
            template_service: Arc::clone(&self.template_service),
            log_service: Arc::clone(&self.log_service),
            emitter: Arc::clone(&self.emitter),
            catalog: Arc::clone(&self.catalog),
        }
    }
}

impl<R, T, L, E> AppState<R, T, L, E>
where
    R: RuleRepository + Send + Sync + 'static,
    T: TemplateRepository + Send + Sync + 'static,
    L: LogStore + Send + Sync + 'static,
    E: EventEmitter + Send + Sync + 'static,
{
    /// Create a new application state from service instances.
    pub fn new(
        rule_service: RuleService<R>,
        template_service: TemplateService<T>,
        log_service: LogService<L>,
        emitter: E,
        catalog: Arc<EventCatalog>,
    ) -> Self {
        Self {
            rule_service: Arc::new(rule_service),
            template_service: Arc::new(template_service),
            log_service: Arc::new(log_service),
            emitter: Arc::new(emitter),
            catalog,
        }
    }
}
