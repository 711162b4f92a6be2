//! JSON REST handlers for automation rules.

use std::str::FromStr;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use herald_app::ports::{EventEmitter, LogStore, RuleRepository, TemplateRepository};
use herald_domain::id::RuleId;
use herald_domain::rule::{ActionConfig, AutomationRule, ConditionExpr};

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for creating a rule.
#[derive(Deserialize)]
pub struct CreateRuleRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub event_type: String,
    pub is_active: Option<bool>,
    pub conditions: Option<ConditionExpr>,
    #[serde(default)]
    pub actions: Vec<ActionConfig>,
}

/// Request body for a full rule update.
#[derive(Deserialize)]
pub struct UpdateRuleRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub event_type: String,
    pub is_active: bool,
    pub conditions: Option<ConditionExpr>,
    #[serde(default)]
    pub actions: Vec<ActionConfig>,
}

/// Possible responses from the list endpoint.
pub enum ListResponse {
    Ok(Json<Vec<AutomationRule>>),
}

impl IntoResponse for ListResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from endpoints returning a single rule.
pub enum GetResponse {
    Ok(Json<AutomationRule>),
}

impl IntoResponse for GetResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the create endpoint.
pub enum CreateResponse {
    Created(Json<AutomationRule>),
}

impl IntoResponse for CreateResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Created(json) => (StatusCode::CREATED, json).into_response(),
        }
    }
}

/// Possible responses from the delete endpoint.
pub enum DeleteResponse {
    NoContent,
}

impl IntoResponse for DeleteResponse {
    fn into_response(self) -> Response {
        match self {
            Self::NoContent => StatusCode::NO_CONTENT.into_response(),
        }
    }
}

fn parse_id(raw: &str) -> Result<RuleId, ApiError> {
    RuleId::from_str(raw).map_err(|_| ApiError::invalid_id(raw))
}

/// `GET /api/rules` — list all rules.
pub async fn list<R, T, L, E>(
    State(state): State<AppState<R, T, L, E>>,
) -> Result<ListResponse, ApiError>
where
    R: RuleRepository + Send + Sync + 'static,
    T: TemplateRepository + Send + Sync + 'static,
    L: LogStore + Send + Sync + 'static,
    E: EventEmitter + Send + Sync + 'static,
{
    let rules = state.rule_service.list_rules().await?;
    Ok(ListResponse::Ok(Json(rules)))
}

/// `GET /api/rules/:id` — get rule by ID.
pub async fn get<R, T, L, E>(
    State(state): State<AppState<R, T, L, E>>,
    Path(id): Path<String>,
) -> Result<GetResponse, ApiError>
where
    R: RuleRepository + Send + Sync + 'static,
    T: TemplateRepository + Send + Sync + 'static,
    L: LogStore + Send + Sync + 'static,
    E: EventEmitter + Send + Sync + 'static,
{
    let rule = state.rule_service.get_rule(parse_id(&id)?).await?;
    Ok(GetResponse::Ok(Json(rule)))
}

/// `POST /api/rules` — create a new rule.
pub async fn create<R, T, L, E>(
    State(state): State<AppState<R, T, L, E>>,
    Json(req): Json<CreateRuleRequest>,
) -> Result<CreateResponse, ApiError>
where
    R: RuleRepository + Send + Sync + 'static,
    T: TemplateRepository + Send + Sync + 'static,
    L: LogStore + Send + Sync + 'static,
    E: EventEmitter + Send + Sync + 'static,
{
    let mut builder = AutomationRule::builder()
        .name(req.name)
        .description(req.description)
        .event_type(req.event_type);

    if let Some(is_active) = req.is_active {
        builder = builder.active(is_active);
    }
    if let Some(conditions) = req.conditions {
        builder = builder.conditions(conditions);
    }
    for action in req.actions {
        builder = builder.action(action);
    }

    let rule = builder.build()?;
    let created = state.rule_service.create_rule(rule).await?;
    Ok(CreateResponse::Created(Json(created)))
}

/// `PUT /api/rules/:id` — replace every field of an existing rule.
pub async fn update<R, T, L, E>(
    State(state): State<AppState<R, T, L, E>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateRuleRequest>,
) -> Result<GetResponse, ApiError>
where
    R: RuleRepository + Send + Sync + 'static,
    T: TemplateRepository + Send + Sync + 'static,
    L: LogStore + Send + Sync + 'static,
    E: EventEmitter + Send + Sync + 'static,
{
    let mut builder = AutomationRule::builder()
        .id(parse_id(&id)?)
        .name(req.name)
        .description(req.description)
        .event_type(req.event_type)
        .active(req.is_active);

    if let Some(conditions) = req.conditions {
        builder = builder.conditions(conditions);
    }
    for action in req.actions {
        builder = builder.action(action);
    }

    let rule = builder.build()?;
    let updated = state.rule_service.update_rule(rule).await?;
    Ok(GetResponse::Ok(Json(updated)))
}

/// `PUT /api/rules/:id/actions` — atomically replace the action list.
pub async fn replace_actions<R, T, L, E>(
    State(state): State<AppState<R, T, L, E>>,
    Path(id): Path<String>,
    Json(actions): Json<Vec<ActionConfig>>,
) -> Result<GetResponse, ApiError>
where
    R: RuleRepository + Send + Sync + 'static,
    T: TemplateRepository + Send + Sync + 'static,
    L: LogStore + Send + Sync + 'static,
    E: EventEmitter + Send + Sync + 'static,
{
    let rule = state
        .rule_service
        .replace_actions(parse_id(&id)?, actions)
        .await?;
    Ok(GetResponse::Ok(Json(rule)))
}

/// `POST /api/rules/:id/toggle` — flip `is_active`.
pub async fn toggle<R, T, L, E>(
    State(state): State<AppState<R, T, L, E>>,
    Path(id): Path<String>,
) -> Result<GetResponse, ApiError>
where
    R: RuleRepository + Send + Sync + 'static,
    T: TemplateRepository + Send + Sync + 'static,
    L: LogStore + Send + Sync + 'static,
    E: EventEmitter + Send + Sync + 'static,
{
    let rule = state.rule_service.toggle_rule(parse_id(&id)?).await?;
    Ok(GetResponse::Ok(Json(rule)))
}

/// `DELETE /api/rules/:id` — delete a rule and its logs.
pub async fn delete<R, T, L, E>(
    State(state): State<AppState<R, T, L, E>>,
    Path(id): Path<String>,
) -> Result<DeleteResponse, ApiError>
where
    R: RuleRepository + Send + Sync + 'static,
    T: TemplateRepository + Send + Sync + 'static,
    L: LogStore + Send + Sync + 'static,
    E: EventEmitter + Send + Sync + 'static,
{
    state.rule_service.delete_rule(parse_id(&id)?).await?;
    Ok(DeleteResponse::NoContent)
}
