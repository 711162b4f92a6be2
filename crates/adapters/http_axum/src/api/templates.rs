//! JSON REST handlers for channel templates.

use axum::Json;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use herald_app::ports::{EventEmitter, LogStore, RuleRepository, TemplateRepository};
use herald_domain::rule::ActionKind;
use herald_domain::template::Template;
use herald_domain::time::now;

use crate::error::ApiError;
use crate::state::AppState;

fn default_active() -> bool {
    true
}

/// Request body for creating or replacing a template.
///
/// `(channel, slug, event_type)` identifies the template.
#[derive(Deserialize)]
pub struct UpsertTemplateRequest {
    pub slug: String,
    pub channel: ActionKind,
    pub event_type: String,
    #[serde(default)]
    pub subject: String,
    pub body: String,
    pub icon: Option<String>,
    pub url: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

impl From<UpsertTemplateRequest> for Template {
    fn from(req: UpsertTemplateRequest) -> Self {
        Self {
            slug: req.slug,
            channel: req.channel,
            event_type: req.event_type,
            subject: req.subject,
            body: req.body,
            icon: req.icon,
            url: req.url,
            is_active: req.is_active,
            updated_at: now(),
        }
    }
}

/// Possible responses from the list endpoint.
pub enum ListResponse {
    Ok(Json<Vec<Template>>),
}

impl IntoResponse for ListResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the upsert endpoint.
pub enum UpsertResponse {
    Ok(Json<Template>),
}

impl IntoResponse for UpsertResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// `GET /api/templates` — list all templates.
pub async fn list<R, T, L, E>(
    State(state): State<AppState<R, T, L, E>>,
) -> Result<ListResponse, ApiError>
where
    R: RuleRepository + Send + Sync + 'static,
    T: TemplateRepository + Send + Sync + 'static,
    L: LogStore + Send + Sync + 'static,
    E: EventEmitter + Send + Sync + 'static,
{
    let templates = state.template_service.list_templates().await?;
    Ok(ListResponse::Ok(Json(templates)))
}

/// `PUT /api/templates` — create or replace a template.
pub async fn upsert<R, T, L, E>(
    State(state): State<AppState<R, T, L, E>>,
    Json(req): Json<UpsertTemplateRequest>,
) -> Result<UpsertResponse, ApiError>
where
    R: RuleRepository + Send + Sync + 'static,
    T: TemplateRepository + Send + Sync + 'static,
    L: LogStore + Send + Sync + 'static,
    E: EventEmitter + Send + Sync + 'static,
{
    let template = state.template_service.upsert_template(req.into()).await?;
    Ok(UpsertResponse::Ok(Json(template)))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::router::build;
    use crate::router::tests::{json_body, send, test_state};

    #[tokio::test]
    async fn should_upsert_then_list_templates() {
        let state = test_state().await;
        let template = json!({
            "slug": "limit-reached",
            "channel": "email",
            "event_type": "lesson_plan.usage_limit",
            "subject": "Limite atingido",
            "body": "<p>Olá {{user.name}}</p>"
        });

        let response = send(build(state.clone()), "PUT", "/api/templates", Some(template)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["is_active"], true);

        let response = send(build(state), "GET", "/api/templates", None).await;
        let listed = json_body(response).await;
        assert_eq!(listed.as_array().unwrap().len(), 1);
        assert_eq!(listed[0]["slug"], "limit-reached");
    }

    #[tokio::test]
    async fn should_reject_blank_template_body() {
        let template = json!({
            "slug": "limit-reached",
            "channel": "push",
            "event_type": "lesson_plan.usage_limit",
            "body": "  "
        });

        let response = send(build(test_state().await), "PUT", "/api/templates", Some(template)).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn should_reject_unknown_channel() {
        let template = json!({
            "slug": "limit-reached",
            "channel": "carrier-pigeon",
            "event_type": "lesson_plan.usage_limit",
            "body": "coo"
        });

        let response = send(build(test_state().await), "PUT", "/api/templates", Some(template)).await;

        assert!(response.status().is_client_error());
    }
}
