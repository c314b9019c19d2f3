#![allow(dead_code)]

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use crate::subscription::tiers::Tier;

/// Rejection payload for a feature the caller's tier does not include.
///
/// The front end switches on `code` to pick the upgrade dialog, so the
/// field names here are part of the wire contract.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureDenial {
    pub error: String,
    pub code: &'static str,
    pub feature: String,
    pub description: String,
    pub required_tier: Tier,
    pub current_tier: Tier,
    pub message: String,
}

/// Rejection payload for an exhausted monthly application quota.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaDenial {
    pub error: String,
    pub code: &'static str,
    pub limit: i64,
    pub remaining: i64,
    pub reset_date: Option<DateTime<Utc>>,
    pub message: String,
    pub required_tier: Tier,
}

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden,

    #[error("Subscription upgrade required")]
    SubscriptionRequired(Box<FeatureDenial>),

    #[error("Application limit reached")]
    QuotaExceeded(Box<QuotaDenial>),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            // The two gate denials carry their own flat payload shape.
            AppError::SubscriptionRequired(denial) => {
                return (StatusCode::FORBIDDEN, Json(*denial)).into_response();
            }
            AppError::QuotaExceeded(denial) => {
                return (StatusCode::FORBIDDEN, Json(*denial)).into_response();
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Authentication required".to_string(),
            ),
            AppError::Forbidden => (
                StatusCode::FORBIDDEN,
                "FORBIDDEN",
                "Access denied".to_string(),
            ),
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
