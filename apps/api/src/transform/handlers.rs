use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::errors::AppError;
use crate::state::AppState;
use crate::tenant::TenantError;
use crate::transform::rules::RuleSelection;
use crate::transform::slices::{
    transform_behavior, transform_props, transform_security, transform_styles,
};
use crate::transform::Descriptor;

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum TransformKind {
    #[default]
    Component,
    Styles,
    Props,
    Behavior,
    Security,
}

impl TransformKind {
    fn as_str(self) -> &'static str {
        match self {
            TransformKind::Component => "component",
            TransformKind::Styles => "styles",
            TransformKind::Props => "props",
            TransformKind::Behavior => "behavior",
            TransformKind::Security => "security",
        }
    }
}

#[derive(Deserialize)]
pub struct TransformRequest {
    pub component: Descriptor,
    #[serde(default)]
    pub rules: RuleSelection,
    #[serde(default)]
    pub kind: TransformKind,
    /// Try the server-side variant first; the local engine is the fallback.
    #[serde(default)]
    pub remote: bool,
}

#[derive(Serialize)]
pub struct TransformResponse {
    pub component: Descriptor,
    pub source: &'static str,
}

/// POST /api/v1/transform
pub async fn handle_transform(
    State(state): State<AppState>,
    Json(req): Json<TransformRequest>,
) -> Result<Json<TransformResponse>, AppError> {
    let mut config = state
        .manager
        .current_tenant()
        .ok_or(TenantError::NoActiveTenant)?;
    if let Some(usage) = state.views.limits.current_usage().await {
        config.usage = Some(usage);
    }

    if req.remote {
        match state
            .backend
            .transform_remote(&config.slug, &req.component, req.kind.as_str())
            .await
        {
            Ok(component) => {
                return Ok(Json(TransformResponse {
                    component,
                    source: "remote",
                }))
            }
            Err(e) => warn!(
                tenant = %config.slug,
                error = %e,
                "Remote transformation failed; using local engine"
            ),
        }
    }

    let component = match req.kind {
        TransformKind::Component => {
            state
                .engine
                .transform_component(&req.component, &config, &req.rules)
        }
        TransformKind::Styles => transform_styles(&req.component, &config),
        TransformKind::Props => transform_props(&req.component, &config),
        TransformKind::Behavior => transform_behavior(&req.component, &config),
        TransformKind::Security => transform_security(&req.component, &config),
    };

    Ok(Json(TransformResponse {
        component,
        source: "local",
    }))
}

/// DELETE /api/v1/transform/cache
pub async fn handle_clear_cache(State(state): State<AppState>) -> StatusCode {
    state.engine.clear_cache();
    StatusCode::NO_CONTENT
}
