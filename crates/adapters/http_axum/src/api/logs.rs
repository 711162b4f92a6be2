//! JSON REST handler for the automation audit log.

use std::str::FromStr;

use axum::Json;
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use herald_app::ports::{EventEmitter, LogStore, RuleRepository, TemplateRepository};
use herald_domain::id::RuleId;
use herald_domain::log::{AutomationLog, Page, PageRequest};

use crate::error::ApiError;
use crate::state::AppState;

/// Query string of `GET /api/logs`.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub rule_id: Option<String>,
}

/// Possible responses from the list endpoint.
pub enum ListResponse {
    Ok(Json<Page<AutomationLog>>),
}

impl IntoResponse for ListResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// `GET /api/logs` — newest-first page of automation logs.
pub async fn list<R, T, L, E>(
    State(state): State<AppState<R, T, L, E>>,
    Query(query): Query<ListQuery>,
) -> Result<ListResponse, ApiError>
where
    R: RuleRepository + Send + Sync + 'static,
    T: TemplateRepository + Send + Sync + 'static,
    L: LogStore + Send + Sync + 'static,
    E: EventEmitter + Send + Sync + 'static,
{
    let request = PageRequest::new(
        query.page.unwrap_or(1),
        query.per_page.unwrap_or(PageRequest::DEFAULT_PER_PAGE),
    );
    let rule_id = query
        .rule_id
        .as_deref()
        .map(|raw| RuleId::from_str(raw).map_err(|_| ApiError::invalid_id(raw)))
        .transpose()?;

    let page = state.log_service.list_logs(request, rule_id).await?;
    Ok(ListResponse::Ok(Json(page)))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use crate::router::build;
    use crate::router::tests::{json_body, send, test_state};

    #[tokio::test]
    async fn should_return_empty_first_page() {
        let response = send(build(test_state().await), "GET", "/api/logs", None).await;

        assert_eq!(response.status(), StatusCode::OK);
        let page = json_body(response).await;
        assert_eq!(page["page"], 1);
        assert_eq!(page["per_page"], 20);
        assert_eq!(page["total"], 0);
        assert_eq!(page["items"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn should_clamp_page_size() {
        let response = send(
            build(test_state().await),
            "GET",
            "/api/logs?page=0&per_page=5000",
            None,
        )
        .await;

        let page = json_body(response).await;
        assert_eq!(page["page"], 1);
        assert_eq!(page["per_page"], 100);
    }

    #[tokio::test]
    async fn should_reject_malformed_rule_filter() {
        let response = send(
            build(test_state().await),
            "GET",
            "/api/logs?rule_id=abc",
            None,
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
