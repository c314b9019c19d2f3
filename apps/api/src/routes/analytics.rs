use axum::{extract::State, Json};
use serde::Serialize;
use sqlx::FromRow;

use crate::auth::Identity;
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Serialize, FromRow)]
pub struct StatusCount {
    pub status: String,
    pub count: i64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSummary {
    pub total_applications: i64,
    pub by_status: Vec<StatusCount>,
}

/// GET /api/v1/analytics/summary
/// Runs behind the analytics feature gate.
pub async fn summary(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<AnalyticsSummary>, AppError> {
    let by_status: Vec<StatusCount> = sqlx::query_as(
        "SELECT status, COUNT(*) AS count FROM applications \
         WHERE user_id = $1 GROUP BY status ORDER BY status",
    )
    .bind(identity.user_id)
    .fetch_all(&state.db)
    .await?;

    let total_applications = by_status.iter().map(|s| s.count).sum();
    Ok(Json(AnalyticsSummary {
        total_applications,
        by_status,
    }))
}
