use std::collections::HashMap;

use axum::{
    extract::{Query, State},
    Json,
};
use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::user::UserIdentity;
use crate::state::AppState;
use crate::tenant::context::TenantSnapshot;
use crate::tenant::resolver::DetectionHints;

#[derive(Deserialize)]
pub struct InitializeRequest {
    pub url: Option<String>,
    #[serde(default)]
    pub params: HashMap<String, String>,
}

#[derive(Deserialize)]
pub struct SwitchRequest {
    pub identifier: String,
    pub user: Option<UserIdentity>,
}

#[derive(Deserialize)]
pub struct PermissionCheckRequest {
    pub permission: Option<String>,
    pub any: Option<Vec<String>>,
    pub all: Option<Vec<String>>,
}

#[derive(Deserialize)]
pub struct AccessQuery {
    pub resource: String,
    pub action: String,
}

#[derive(Serialize)]
pub struct PermissionCheckResponse {
    pub allowed: bool,
}

/// GET /api/v1/tenant
pub async fn handle_get_tenant(State(state): State<AppState>) -> Json<TenantSnapshot> {
    Json(state.manager.snapshot())
}

/// POST /api/v1/tenant/initialize
pub async fn handle_initialize(
    State(state): State<AppState>,
    Json(req): Json<InitializeRequest>,
) -> Result<Json<TenantSnapshot>, AppError> {
    let navigation_url = req
        .url
        .as_deref()
        .map(Url::parse)
        .transpose()
        .map_err(|e| AppError::Validation(format!("Invalid navigation url: {e}")))?;
    let hints = DetectionHints {
        navigation_url,
        params: req.params,
    };
    Ok(Json(state.manager.initialize(&hints).await?))
}

/// POST /api/v1/tenant/switch
pub async fn handle_switch(
    State(state): State<AppState>,
    Json(req): Json<SwitchRequest>,
) -> Result<Json<TenantSnapshot>, AppError> {
    let snapshot = match req.user {
        Some(user) => {
            state
                .manager
                .switch_tenant_as(&req.identifier, Some(user))
                .await?
        }
        None => state.manager.switch_tenant(&req.identifier).await?,
    };
    Ok(Json(snapshot))
}

/// POST /api/v1/tenant/refresh
pub async fn handle_refresh(
    State(state): State<AppState>,
) -> Result<Json<TenantSnapshot>, AppError> {
    Ok(Json(state.manager.refresh_tenant().await?))
}

/// POST /api/v1/tenant/clear
pub async fn handle_clear(State(state): State<AppState>) -> Json<TenantSnapshot> {
    Json(state.manager.clear_context())
}

/// POST /api/v1/tenant/permissions/check
/// Exactly one of `permission`, `any`, `all` must be given.
pub async fn handle_check_permissions(
    State(state): State<AppState>,
    Json(req): Json<PermissionCheckRequest>,
) -> Result<Json<PermissionCheckResponse>, AppError> {
    let allowed = match (req.permission, req.any, req.all) {
        (Some(p), None, None) => state.manager.has_permission(&p),
        (None, Some(any), None) => state.manager.has_any_permission(&any),
        (None, None, Some(all)) => state.manager.has_all_permissions(&all),
        _ => {
            return Err(AppError::Validation(
                "Provide exactly one of `permission`, `any`, `all`".to_string(),
            ))
        }
    };
    Ok(Json(PermissionCheckResponse { allowed }))
}

/// GET /api/v1/tenant/access?resource=..&action=..
pub async fn handle_can_access(
    State(state): State<AppState>,
    Query(query): Query<AccessQuery>,
) -> Json<PermissionCheckResponse> {
    Json(PermissionCheckResponse {
        allowed: state.manager.can_access(&query.resource, &query.action),
    })
}
