//! Request gates for feature and quota enforcement.
//!
//! Gates run as route layers ahead of protected handlers. Deny paths build
//! the structured payloads the front end renders upgrade dialogs from, and
//! touch no counters. The quota gate's allow path attaches the computed
//! status to the request for downstream display; incrementing is left to
//! the handler, once the protected action has actually succeeded.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use chrono::Utc;

use crate::auth::Identity;
use crate::errors::{AppError, FeatureDenial, QuotaDenial};
use crate::state::AppState;
use crate::subscription::quota::{self, QuotaStatus};
use crate::subscription::tiers::{has_feature_access, required_tier, Feature, Tier};

async fn feature_gate(
    state: AppState,
    feature: Feature,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let identity = req
        .extensions()
        .get::<Identity>()
        .cloned()
        .ok_or(AppError::Unauthorized)?;

    let user = quota::fetch_user(&state.db, identity.user_id).await?;
    let tier = user.tier();
    if has_feature_access(tier, feature) {
        return Ok(next.run(req).await);
    }
    Err(AppError::SubscriptionRequired(Box::new(feature_denial(
        feature, tier,
    ))))
}

/// Builds the SUBSCRIPTION_REQUIRED payload for a denied feature.
pub fn feature_denial(feature: Feature, current_tier: Tier) -> FeatureDenial {
    let required = required_tier(feature);
    FeatureDenial {
        error: "Subscription upgrade required".to_string(),
        code: "SUBSCRIPTION_REQUIRED",
        feature: feature.display_name().to_string(),
        description: feature.description().to_string(),
        required_tier: required,
        current_tier,
        message: format!(
            "{} is available on the {} plan. You are currently on the {} plan.",
            feature.display_name(),
            required.display_name(),
            current_tier.display_name()
        ),
    }
}

/// Builds the APPLICATION_LIMIT_REACHED payload for an exhausted quota.
pub fn quota_denial(status: &QuotaStatus) -> QuotaDenial {
    QuotaDenial {
        error: "Monthly application limit reached".to_string(),
        code: "APPLICATION_LIMIT_REACHED",
        limit: status.limit,
        remaining: 0,
        reset_date: status.reset_date,
        message: format!(
            "You have used all {} applications for this month. Upgrade to the Pro plan for unlimited applications.",
            status.limit
        ),
        required_tier: Tier::Pro,
    }
}

/// Gate for application submission. Checks the caller's remaining monthly
/// quota and attaches the status for downstream handlers; the counter is
/// not consumed here.
pub async fn application_quota_gate(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let identity = req
        .extensions()
        .get::<Identity>()
        .cloned()
        .ok_or(AppError::Unauthorized)?;

    let status = quota::check_quota(&state.db, identity.user_id, Utc::now()).await?;
    if !status.allowed {
        return Err(AppError::QuotaExceeded(Box::new(quota_denial(&status))));
    }
    req.extensions_mut().insert(status);
    Ok(next.run(req).await)
}

pub async fn bulk_apply_gate(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    feature_gate(state, Feature::BulkApply, req, next).await
}

pub async fn analytics_gate(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    feature_gate(state, Feature::AnalyticsAccess, req, next).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_feature_denial_payload_shape() {
        let denial = feature_denial(Feature::AiResumeBuilder, Tier::Free);
        let value = serde_json::to_value(&denial).unwrap();
        let obj = value.as_object().unwrap();

        assert_eq!(obj["code"], "SUBSCRIPTION_REQUIRED");
        assert_eq!(obj["requiredTier"], "pro");
        assert_eq!(obj["currentTier"], "free");
        assert_eq!(obj["feature"], "AI Resume Builder");
        for key in [
            "error",
            "code",
            "feature",
            "description",
            "requiredTier",
            "currentTier",
            "message",
        ] {
            assert!(obj.contains_key(key), "missing key {key}");
        }
        assert_eq!(obj.len(), 7);
    }

    #[test]
    fn test_feature_denial_message_names_plans() {
        let denial = feature_denial(Feature::AnalyticsAccess, Tier::Pro);
        assert!(denial.message.contains("Enterprise"));
        assert!(denial.message.contains("Pro"));
    }

    #[test]
    fn test_quota_denial_payload_shape() {
        let reset = Utc.with_ymd_and_hms(2026, 8, 1, 0, 0, 0).unwrap();
        let status = QuotaStatus {
            allowed: false,
            remaining: 0,
            limit: 5,
            reset_date: Some(reset),
        };
        let value = serde_json::to_value(quota_denial(&status)).unwrap();
        let obj = value.as_object().unwrap();

        assert_eq!(obj["code"], "APPLICATION_LIMIT_REACHED");
        assert_eq!(obj["limit"], 5);
        assert_eq!(obj["remaining"], 0);
        assert_eq!(obj["requiredTier"], "pro");
        assert!(!obj["resetDate"].is_null());
        for key in [
            "error",
            "code",
            "limit",
            "remaining",
            "resetDate",
            "message",
            "requiredTier",
        ] {
            assert!(obj.contains_key(key), "missing key {key}");
        }
        assert_eq!(obj.len(), 7);
    }

    #[test]
    fn test_quota_denial_message_mentions_limit() {
        let status = QuotaStatus {
            allowed: false,
            remaining: 0,
            limit: 5,
            reset_date: None,
        };
        assert!(quota_denial(&status).message.contains('5'));
    }
}
