use axum::{extract::State, http::StatusCode, Extension, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use crate::auth::Identity;
use crate::errors::AppError;
use crate::models::application::Application;
use crate::state::AppState;
use crate::subscription::quota::{self, QuotaStatus};

#[derive(Debug, Deserialize)]
pub struct CreateApplicationRequest {
    pub job_title: String,
    pub company: String,
}

impl CreateApplicationRequest {
    fn validate(&self) -> Result<(), AppError> {
        if self.job_title.trim().is_empty() {
            return Err(AppError::Validation("job_title must not be empty".to_string()));
        }
        if self.company.trim().is_empty() {
            return Err(AppError::Validation("company must not be empty".to_string()));
        }
        Ok(())
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateApplicationResponse {
    pub application: Application,
    pub quota: QuotaStatus,
}

/// POST /api/v1/applications
/// Runs behind the quota gate; the counter is consumed only after the
/// insert succeeds.
pub async fn create(
    State(state): State<AppState>,
    identity: Identity,
    Extension(gate_status): Extension<QuotaStatus>,
    Json(req): Json<CreateApplicationRequest>,
) -> Result<(StatusCode, Json<CreateApplicationResponse>), AppError> {
    req.validate()?;
    debug!(
        "User {} submitting application ({} remaining before submit)",
        identity.user_id, gate_status.remaining
    );

    let application = insert_application(&state.db, identity.user_id, &req).await?;
    let quota = quota::record_application(&state.db, identity.user_id, Utc::now()).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateApplicationResponse { application, quota }),
    ))
}

/// GET /api/v1/applications
pub async fn list(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<Vec<Application>>, AppError> {
    Ok(Json(
        sqlx::query_as::<_, Application>(
            "SELECT * FROM applications WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(identity.user_id)
        .fetch_all(&state.db)
        .await?,
    ))
}

#[derive(Debug, Deserialize)]
pub struct BulkApplyRequest {
    pub applications: Vec<CreateApplicationRequest>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkApplyResponse {
    pub created: Vec<Application>,
    pub skipped: usize,
    pub quota: QuotaStatus,
}

/// POST /api/v1/applications/bulk
/// Runs behind the bulk-apply feature gate. Each item still consumes one
/// unit of quota; the batch stops at the first item the quota rejects and
/// reports the rest as skipped.
pub async fn bulk_create(
    State(state): State<AppState>,
    identity: Identity,
    Json(req): Json<BulkApplyRequest>,
) -> Result<Json<BulkApplyResponse>, AppError> {
    if req.applications.is_empty() {
        return Err(AppError::Validation(
            "applications must not be empty".to_string(),
        ));
    }
    for item in &req.applications {
        item.validate()?;
    }

    let mut created = Vec::new();
    let mut quota = quota::check_quota(&state.db, identity.user_id, Utc::now()).await?;
    for item in &req.applications {
        if !quota.allowed {
            break;
        }
        let application = insert_application(&state.db, identity.user_id, item).await?;
        quota = quota::record_application(&state.db, identity.user_id, Utc::now()).await?;
        created.push(application);
    }

    let skipped = req.applications.len() - created.len();
    Ok(Json(BulkApplyResponse {
        created,
        skipped,
        quota,
    }))
}

async fn insert_application(
    pool: &PgPool,
    user_id: Uuid,
    req: &CreateApplicationRequest,
) -> Result<Application, AppError> {
    Ok(sqlx::query_as::<_, Application>(
        "INSERT INTO applications (id, user_id, job_title, company, status) \
         VALUES ($1, $2, $3, $4, 'submitted') \
         RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(req.job_title.trim())
    .bind(req.company.trim())
    .fetch_one(pool)
    .await?)
}
