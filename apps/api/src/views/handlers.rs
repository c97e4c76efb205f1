use std::collections::BTreeMap;

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::AppError;
use crate::models::tenant::{Branding, SecurityPolicy};
use crate::state::AppState;
use crate::tenant::context::TenantSnapshot;
use crate::tenant::TenantError;
use crate::views::limits::LimitsSummary;
use crate::views::monitoring::HealthSnapshot;

#[derive(Serialize)]
pub struct FeaturesResponse {
    pub enabled: Vec<String>,
    pub flags: BTreeMap<String, bool>,
}

#[derive(Deserialize)]
pub struct FeaturesUpdate {
    pub features: BTreeMap<String, bool>,
}

#[derive(Deserialize)]
pub struct BrandingUpdate {
    pub branding: Branding,
}

#[derive(Deserialize)]
pub struct SecurityUpdate {
    pub security: SecurityPolicy,
}

#[derive(Deserialize)]
pub struct SettingsUpdate {
    pub settings: BTreeMap<String, Value>,
}

fn require_tenant(state: &AppState) -> Result<(), AppError> {
    match state.manager.active_slug() {
        Some(_) => Ok(()),
        None => Err(TenantError::NoActiveTenant.into()),
    }
}

/// GET /api/v1/tenant/features
pub async fn handle_get_features(
    State(state): State<AppState>,
) -> Result<Json<FeaturesResponse>, AppError> {
    require_tenant(&state)?;
    let features = &state.views.features;
    Ok(Json(FeaturesResponse {
        enabled: features.enabled_features(),
        flags: features.feature_flags(),
    }))
}

/// PUT /api/v1/tenant/features
pub async fn handle_update_features(
    State(state): State<AppState>,
    Json(req): Json<FeaturesUpdate>,
) -> Result<Json<TenantSnapshot>, AppError> {
    Ok(Json(state.views.features.update_features(&req.features).await?))
}

/// GET /api/v1/tenant/branding
pub async fn handle_get_branding(
    State(state): State<AppState>,
) -> Result<Json<Branding>, AppError> {
    let branding = state
        .views
        .branding
        .branding()
        .ok_or(TenantError::NoActiveTenant)?;
    Ok(Json(branding))
}

/// PUT /api/v1/tenant/branding
pub async fn handle_update_branding(
    State(state): State<AppState>,
    Json(req): Json<BrandingUpdate>,
) -> Result<Json<TenantSnapshot>, AppError> {
    Ok(Json(state.views.branding.update_branding(&req.branding).await?))
}

/// GET /api/v1/tenant/security
pub async fn handle_get_security(
    State(state): State<AppState>,
) -> Result<Json<SecurityPolicy>, AppError> {
    let security = state
        .views
        .security
        .security()
        .ok_or(TenantError::NoActiveTenant)?;
    Ok(Json(security))
}

/// PUT /api/v1/tenant/security
pub async fn handle_update_security(
    State(state): State<AppState>,
    Json(req): Json<SecurityUpdate>,
) -> Result<Json<TenantSnapshot>, AppError> {
    Ok(Json(state.views.security.update_security(&req.security).await?))
}

/// PUT /api/v1/tenant/settings
pub async fn handle_update_settings(
    State(state): State<AppState>,
    Json(req): Json<SettingsUpdate>,
) -> Result<Json<TenantSnapshot>, AppError> {
    Ok(Json(state.views.settings.update_settings(&req.settings).await?))
}

/// GET /api/v1/tenant/limits
/// Fetches fresh usage first; if that fails the last known usage is used.
pub async fn handle_get_limits(
    State(state): State<AppState>,
) -> Result<Json<LimitsSummary>, AppError> {
    let limits = &state.views.limits;
    if let Err(e) = limits.refresh_usage().await {
        match e {
            TenantError::NoActiveTenant => return Err(TenantError::NoActiveTenant.into()),
            other => tracing::warn!(error = %other, "Usage fetch failed; serving last known usage"),
        }
    }
    Ok(Json(limits.summary()))
}

/// GET /api/v1/tenant/analytics
pub async fn handle_get_analytics(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    Ok(Json(state.views.monitoring.fetch_analytics().await?))
}

/// GET /api/v1/tenant/health
pub async fn handle_get_health(
    State(state): State<AppState>,
) -> Result<Json<HealthSnapshot>, AppError> {
    Ok(Json(state.views.monitoring.fetch_health().await?))
}
