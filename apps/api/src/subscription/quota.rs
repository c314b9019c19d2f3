//! Monthly application quota tracking.
//!
//! Counters roll over per calendar month (UTC): a reset date in an earlier
//! month marks the counter stale. Both the stale-period reset and the
//! increment run as single conditional UPDATEs, so two concurrent
//! submissions can neither under-count nor double-reset, and the increment
//! cannot push a counter past its limit.

use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::user::User;
use crate::subscription::tiers::{monthly_application_limit, UNLIMITED};

/// Point-in-time view of a user's monthly application allowance.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaStatus {
    pub allowed: bool,
    pub remaining: i64,
    pub limit: i64,
    pub reset_date: Option<DateTime<Utc>>,
}

impl QuotaStatus {
    pub fn unlimited() -> Self {
        Self {
            allowed: true,
            remaining: UNLIMITED,
            limit: UNLIMITED,
            reset_date: None,
        }
    }
}

/// True when both timestamps fall in the same calendar month (UTC).
pub fn same_period(a: DateTime<Utc>, b: DateTime<Utc>) -> bool {
    a.year() == b.year() && a.month() == b.month()
}

fn status_for(count: i64, limit: i64, reset_date: DateTime<Utc>) -> QuotaStatus {
    QuotaStatus {
        allowed: count < limit,
        remaining: (limit - count).max(0),
        limit,
        reset_date: Some(reset_date),
    }
}

/// Loads a user row, mapping a missing row to a 404-shaped error.
pub async fn fetch_user(pool: &PgPool, user_id: Uuid) -> Result<User, AppError> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {user_id} not found")))
}

const STALE_PERIOD: &str = "date_trunc('month', application_count_reset_date AT TIME ZONE 'UTC') \
     IS DISTINCT FROM date_trunc('month', ($2::timestamptz) AT TIME ZONE 'UTC')";

/// Reads a user's quota standing without consuming any of it.
///
/// A stale counter is zeroed (and its reset date moved to `now`) in one
/// conditional UPDATE, so concurrent readers settle on the same row state.
/// Unlimited tiers never touch the counter at all.
pub async fn check_quota(
    pool: &PgPool,
    user_id: Uuid,
    now: DateTime<Utc>,
) -> Result<QuotaStatus, AppError> {
    let user = fetch_user(pool, user_id).await?;
    let limit = monthly_application_limit(user.tier());
    if limit == UNLIMITED {
        return Ok(QuotaStatus::unlimited());
    }

    if same_period(user.application_count_reset_date, now) {
        return Ok(status_for(
            user.monthly_application_count,
            limit,
            user.application_count_reset_date,
        ));
    }

    debug!("Resetting stale application counter for user {user_id}");
    let sql = format!(
        "UPDATE users \
         SET monthly_application_count = 0, application_count_reset_date = $2 \
         WHERE id = $1 AND {STALE_PERIOD} \
         RETURNING monthly_application_count, application_count_reset_date"
    );
    let row: Option<(i64, DateTime<Utc>)> = sqlx::query_as(&sql)
        .bind(user_id)
        .bind(now)
        .fetch_optional(pool)
        .await?;

    // A concurrent request may have reset the row first; either way the
    // stored period is now current.
    let (count, reset_date) = match row {
        Some(r) => r,
        None => {
            let user = fetch_user(pool, user_id).await?;
            (
                user.monthly_application_count,
                user.application_count_reset_date,
            )
        }
    };
    Ok(status_for(count, limit, reset_date))
}

/// Consumes one unit of quota after a successful submission.
///
/// The period comparison, reset, and increment happen in one conditional
/// UPDATE: a stale counter restarts at 1, a current counter increments only
/// while under the limit, and unlimited tiers always increment. A missed
/// update with an existing user row means a concurrent submission consumed
/// the last unit first.
pub async fn record_application(
    pool: &PgPool,
    user_id: Uuid,
    now: DateTime<Utc>,
) -> Result<QuotaStatus, AppError> {
    let user = fetch_user(pool, user_id).await?;
    let limit = monthly_application_limit(user.tier());

    let sql = format!(
        "UPDATE users \
         SET monthly_application_count = CASE \
                 WHEN {STALE_PERIOD} THEN 1 \
                 ELSE monthly_application_count + 1 \
             END, \
             application_count_reset_date = CASE \
                 WHEN {STALE_PERIOD} THEN $2 \
                 ELSE application_count_reset_date \
             END \
         WHERE id = $1 \
           AND ($3 = -1 OR monthly_application_count < $3 OR {STALE_PERIOD}) \
         RETURNING monthly_application_count, application_count_reset_date"
    );
    let row: Option<(i64, DateTime<Utc>)> = sqlx::query_as(&sql)
        .bind(user_id)
        .bind(now)
        .bind(limit)
        .fetch_optional(pool)
        .await?;

    match row {
        Some((count, reset_date)) => {
            debug!("User {user_id} application count now {count}");
            if limit == UNLIMITED {
                Ok(QuotaStatus::unlimited())
            } else {
                Ok(status_for(count, limit, reset_date))
            }
        }
        None => Ok(QuotaStatus {
            allowed: false,
            remaining: 0,
            limit,
            reset_date: Some(user.application_count_reset_date),
        }),
    }
}
