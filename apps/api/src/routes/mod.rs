pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;
use crate::tenant::handlers as tenant;
use crate::transform::handlers as transform;
use crate::views::handlers as views;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Active tenant context
        .route("/api/v1/tenant", get(tenant::handle_get_tenant))
        .route("/api/v1/tenant/initialize", post(tenant::handle_initialize))
        .route("/api/v1/tenant/switch", post(tenant::handle_switch))
        .route("/api/v1/tenant/refresh", post(tenant::handle_refresh))
        .route("/api/v1/tenant/clear", post(tenant::handle_clear))
        .route(
            "/api/v1/tenant/permissions/check",
            post(tenant::handle_check_permissions),
        )
        .route("/api/v1/tenant/access", get(tenant::handle_can_access))
        // Transformation
        .route("/api/v1/transform", post(transform::handle_transform))
        .route(
            "/api/v1/transform/cache",
            axum::routing::delete(transform::handle_clear_cache),
        )
        // Management views
        .route(
            "/api/v1/tenant/features",
            get(views::handle_get_features).put(views::handle_update_features),
        )
        .route(
            "/api/v1/tenant/branding",
            get(views::handle_get_branding).put(views::handle_update_branding),
        )
        .route(
            "/api/v1/tenant/security",
            get(views::handle_get_security).put(views::handle_update_security),
        )
        .route(
            "/api/v1/tenant/settings",
            axum::routing::put(views::handle_update_settings),
        )
        .route("/api/v1/tenant/limits", get(views::handle_get_limits))
        .route("/api/v1/tenant/analytics", get(views::handle_get_analytics))
        .route("/api/v1/tenant/health", get(views::handle_get_health))
        .with_state(state)
}
