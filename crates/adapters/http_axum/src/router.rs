//! Axum router assembly.

use axum::Router;
use axum::routing::get;
use tower_http::trace::TraceLayer;

use herald_app::ports::{EventEmitter, LogStore, RuleRepository, TemplateRepository};

use crate::state::AppState;

/// Build the top-level axum [`Router`].
///
/// Nests the API routes under `/api` and adds a [`TraceLayer`] that logs
/// each HTTP request/response using the `tracing` ecosystem.
pub fn build<R, T, L, E>(state: AppState<R, T, L, E>) -> Router
where
    R: RuleRepository + Send + Sync + 'static,
    T: TemplateRepository + Send + Sync + 'static,
    L: LogStore + Send + Sync + 'static,
    E: EventEmitter + Send + Sync + 'static,
{
    Router::new()
        .route("/health", get(health_check))
        .nest("/api", crate::api::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::{Arc, Mutex};

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::response::Response;
    use tower::ServiceExt;

    use herald_adapter_storage_sqlite_sqlx::{
        Config, SqliteLogStore, SqliteRuleRepository, SqliteTemplateRepository,
    };
    use herald_app::rule_cache::RuleCache;
    use herald_app::services::log_service::LogService;
    use herald_app::services::rule_service::RuleService;
    use herald_app::services::template_service::TemplateService;
    use herald_domain::catalog::EventCatalog;
    use herald_domain::id::EventId;

    use super::*;

    /// Records emitted events instead of queueing them.
    #[derive(Default)]
    pub struct RecordingEmitter {
        pub emitted: Mutex<Vec<(String, serde_json::Value)>>,
        pub reject: bool,
    }

    impl EventEmitter for RecordingEmitter {
        fn emit(&self, event_type: &str, payload: serde_json::Value) -> Option<EventId> {
            if self.reject {
                return None;
            }
            self.emitted
                .lock()
                .unwrap()
                .push((event_type.to_string(), payload));
            Some(EventId::new())
        }
    }

    pub type TestState = AppState<
        SqliteRuleRepository,
        SqliteTemplateRepository,
        SqliteLogStore,
        RecordingEmitter,
    >;

    pub async fn test_state_with(emitter: RecordingEmitter) -> TestState {
        let db = Config::new("sqlite::memory:").build().await.unwrap();
        let pool = db.pool().clone();
        let catalog = Arc::new(EventCatalog::builtin());
        let rules = Arc::new(RuleCache::new(SqliteRuleRepository::new(pool.clone())));

        AppState::new(
            RuleService::new(rules, Arc::clone(&catalog)),
            TemplateService::new(SqliteTemplateRepository::new(pool.clone())),
            LogService::new(SqliteLogStore::new(pool)),
            emitter,
            catalog,
        )
    }

    pub async fn test_state() -> TestState {
        test_state_with(RecordingEmitter::default()).await
    }

    pub async fn send(
        app: Router,
        method: &str,
        uri: &str,
        body: Option<serde_json::Value>,
    ) -> Response {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        app.oneshot(request).await.unwrap()
    }

    pub async fn json_body(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn should_return_ok_when_health_check_called() {
        let app = build(test_state().await);

        let response = send(app, "GET", "/health", None).await;

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn should_return_not_found_for_unknown_route() {
        let app = build(test_state().await);

        let response = send(app, "GET", "/api/devices", None).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
