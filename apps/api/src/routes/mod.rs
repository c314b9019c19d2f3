pub mod admin;
pub mod analytics;
pub mod applications;
pub mod health;
pub mod subscription;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::auth::identity_layer;
use crate::state::AppState;
use crate::subscription::gates;

pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/api/v1/subscription", get(subscription::usage))
        .route("/api/v1/applications", get(applications::list))
        .route(
            "/api/v1/applications",
            post(applications::create).route_layer(middleware::from_fn_with_state(
                state.clone(),
                gates::application_quota_gate,
            )),
        )
        .route(
            "/api/v1/applications/bulk",
            post(applications::bulk_create).route_layer(middleware::from_fn_with_state(
                state.clone(),
                gates::bulk_apply_gate,
            )),
        )
        .route(
            "/api/v1/analytics/summary",
            get(analytics::summary).route_layer(middleware::from_fn_with_state(
                state.clone(),
                gates::analytics_gate,
            )),
        )
        .route(
            "/api/v1/admin/users",
            get(admin::list_users).route_layer(middleware::from_fn_with_state(
                state.clone(),
                crate::admin::require_admin,
            )),
        )
        .layer(middleware::from_fn(identity_layer));

    Router::new()
        .route("/health", get(health::health_handler))
        .merge(api)
        .with_state(state)
}
