use axum::{extract::State, Json};
use chrono::Utc;
use serde::Serialize;

use crate::auth::Identity;
use crate::errors::AppError;
use crate::state::AppState;
use crate::subscription::quota::{self, QuotaStatus};
use crate::subscription::tiers::{Tier, TierLimits};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionResponse {
    pub tier: Tier,
    pub limits: TierLimits,
    pub quota: QuotaStatus,
}

/// GET /api/v1/subscription
/// The caller's tier, its full limit record, and live quota standing.
pub async fn usage(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<SubscriptionResponse>, AppError> {
    let user = quota::fetch_user(&state.db, identity.user_id).await?;
    let tier = user.tier();
    let quota = quota::check_quota(&state.db, identity.user_id, Utc::now()).await?;

    Ok(Json(SubscriptionResponse {
        tier,
        limits: tier.limits(),
        quota,
    }))
}
