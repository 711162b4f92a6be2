//! JSON REST handlers for the event catalog and event emission.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use herald_app::ports::{EventEmitter, LogStore, RuleRepository, TemplateRepository};
use herald_domain::catalog::EventSchema;
use herald_domain::error::{HeraldError, NotFoundError};
use herald_domain::id::EventId;

use crate::error::ApiError;
use crate::state::AppState;

/// Possible responses from the list endpoint.
pub enum ListResponse {
    Ok(Json<Vec<EventSchema>>),
}

impl IntoResponse for ListResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the get endpoint.
pub enum GetResponse {
    Ok(Json<EventSchema>),
}

impl IntoResponse for GetResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

#[derive(Serialize)]
pub struct Accepted {
    pub event_id: EventId,
}

#[derive(Serialize)]
struct Dropped {
    error: &'static str,
}

/// Possible responses from the emit endpoint.
pub enum EmitResponse {
    /// Queued for the rule engine.
    Accepted(Json<Accepted>),
    /// The queue is full or shutting down.
    Dropped,
}

impl IntoResponse for EmitResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Accepted(json) => (StatusCode::ACCEPTED, json).into_response(),
            Self::Dropped => (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(Dropped {
                    error: "event queue is not accepting events",
                }),
            )
                .into_response(),
        }
    }
}

/// `GET /api/events` — list the event catalog.
pub async fn list<R, T, L, E>(State(state): State<AppState<R, T, L, E>>) -> ListResponse
where
    R: RuleRepository + Send + Sync + 'static,
    T: TemplateRepository + Send + Sync + 'static,
    L: LogStore + Send + Sync + 'static,
    E: EventEmitter + Send + Sync + 'static,
{
    ListResponse::Ok(Json(state.catalog.iter().cloned().collect()))
}

/// `GET /api/events/:name` — get one event schema.
pub async fn get<R, T, L, E>(
    State(state): State<AppState<R, T, L, E>>,
    Path(name): Path<String>,
) -> Result<GetResponse, ApiError>
where
    R: RuleRepository + Send + Sync + 'static,
    T: TemplateRepository + Send + Sync + 'static,
    L: LogStore + Send + Sync + 'static,
    E: EventEmitter + Send + Sync + 'static,
{
    let schema = state
        .catalog
        .get(&name)
        .cloned()
        .ok_or_else(|| unknown_event(name))?;
    Ok(GetResponse::Ok(Json(schema)))
}

/// `POST /api/events/:name/emit` — publish an event, fire-and-forget.
///
/// The body is the event payload.
pub async fn emit<R, T, L, E>(
    State(state): State<AppState<R, T, L, E>>,
    Path(name): Path<String>,
    Json(payload): Json<serde_json::Value>,
) -> Result<EmitResponse, ApiError>
where
    R: RuleRepository + Send + Sync + 'static,
    T: TemplateRepository + Send + Sync + 'static,
    L: LogStore + Send + Sync + 'static,
    E: EventEmitter + Send + Sync + 'static,
{
    if !state.catalog.contains(&name) {
        return Err(unknown_event(name));
    }
    Ok(match state.emitter.emit(&name, payload) {
        Some(event_id) => EmitResponse::Accepted(Json(Accepted { event_id })),
        None => EmitResponse::Dropped,
    })
}

fn unknown_event(name: String) -> ApiError {
    ApiError::from(HeraldError::from(NotFoundError {
        entity: "Event type",
        id: name,
    }))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::router::build;
    use crate::router::tests::{RecordingEmitter, json_body, send, test_state, test_state_with};

    #[tokio::test]
    async fn should_list_builtin_catalog() {
        let app = build(test_state().await);

        let response = send(app, "GET", "/api/events", None).await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        let names: Vec<_> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["name"].as_str().unwrap().to_string())
            .collect();
        assert!(names.contains(&"lesson_plan.usage_limit".to_string()));
    }

    #[tokio::test]
    async fn should_return_404_for_unknown_event_schema() {
        let app = build(test_state().await);

        let response = send(app, "GET", "/api/events/user.deleted", None).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn should_accept_emitted_event() {
        let state = test_state().await;
        let emitter = std::sync::Arc::clone(&state.emitter);
        let app = build(state);

        let response = send(
            app,
            "POST",
            "/api/events/user.signup/emit",
            Some(json!({"user": {"name": "Ana"}})),
        )
        .await;

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert!(json_body(response).await["event_id"].is_string());
        let emitted = emitter.emitted.lock().unwrap();
        assert_eq!(emitted.len(), 1);
        assert_eq!(emitted[0].0, "user.signup");
        assert_eq!(emitted[0].1["user"]["name"], "Ana");
    }

    #[tokio::test]
    async fn should_refuse_to_emit_unregistered_event() {
        let state = test_state().await;
        let emitter = std::sync::Arc::clone(&state.emitter);
        let app = build(state);

        let response = send(app, "POST", "/api/events/user.deleted/emit", Some(json!({}))).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(emitter.emitted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn should_report_dropped_event() {
        let emitter = RecordingEmitter {
            reject: true,
            ..RecordingEmitter::default()
        };
        let app = build(test_state_with(emitter).await);

        let response = send(app, "POST", "/api/events/user.signup/emit", Some(json!({}))).await;

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
