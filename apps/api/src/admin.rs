//! Admin privilege resolution.
//!
//! Admin is a derived fact, not a stored boolean. The cheap checks run
//! first: the startup-parsed admin email list, then the admin email
//! pattern. Only when both miss are the three stores probed concurrently
//! under a bounded wait: the stored role column, the role-assignment
//! table, and the identity provider's metadata. Any single source granting
//! access is sufficient.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use sqlx::PgPool;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{timeout, Instant};
use tracing::warn;
use uuid::Uuid;

use crate::auth::Identity;
use crate::config::Config;
use crate::directory::{profile_grants_admin, Directory};
use crate::errors::AppError;
use crate::state::AppState;

/// Bounded wait for the concurrent store probes.
const PROBE_DEADLINE: Duration = Duration::from_secs(2);
/// One short extra attempt per unfinished probe after the deadline.
const PROBE_GRACE: Duration = Duration::from_millis(250);

/// Result of one admin source check. An error is not a denial: a failing
/// store must not veto a grant from another source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutcome {
    Granted,
    Denied,
    Error,
}

/// Case-insensitive membership in the configured admin email list.
pub fn email_in_admin_list(config: &Config, email: &str) -> bool {
    let email = email.trim().to_lowercase();
    config.admin_emails.iter().any(|e| e == &email)
}

pub fn email_matches_admin_pattern(config: &Config, email: &str) -> bool {
    config
        .admin_email_pattern
        .as_ref()
        .map(|p| p.is_match(email.trim()))
        .unwrap_or(false)
}

/// Resolves admin privilege for a caller. Terminal on the first grant, so
/// a listed email never waits on the database or the identity provider.
pub async fn is_admin(state: &AppState, identity: &Identity) -> bool {
    if email_in_admin_list(&state.config, &identity.email) {
        return true;
    }
    if email_matches_admin_pattern(&state.config, &identity.email) {
        return true;
    }

    let handles = vec![
        tokio::spawn(stored_role_check(state.db.clone(), identity.user_id)),
        tokio::spawn(role_assignment_check(state.db.clone(), identity.user_id)),
        tokio::spawn(directory_metadata_check(
            state.directory.clone(),
            identity.user_id,
        )),
    ];

    collect_outcomes(handles, PROBE_DEADLINE, PROBE_GRACE)
        .await
        .contains(&CheckOutcome::Granted)
}

/// Route layer for admin-only endpoints: 401 without identity, 403 when no
/// source grants admin. The denial body stays generic so callers learn
/// nothing about the authorization scheme.
pub async fn require_admin(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let identity = req
        .extensions()
        .get::<Identity>()
        .cloned()
        .ok_or(AppError::Unauthorized)?;

    if is_admin(&state, &identity).await {
        return Ok(next.run(req).await);
    }
    warn!("Admin access denied for user {}", identity.user_id);
    Err(AppError::Forbidden)
}

async fn stored_role_check(pool: PgPool, user_id: Uuid) -> CheckOutcome {
    let role: Result<Option<Option<String>>, sqlx::Error> =
        sqlx::query_scalar("SELECT role FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&pool)
            .await;
    match role {
        Ok(Some(Some(role))) if role == "admin" => CheckOutcome::Granted,
        Ok(_) => CheckOutcome::Denied,
        Err(e) => {
            warn!("Stored-role admin check failed: {e}");
            CheckOutcome::Error
        }
    }
}

async fn role_assignment_check(pool: PgPool, user_id: Uuid) -> CheckOutcome {
    let exists: Result<Option<i32>, sqlx::Error> =
        sqlx::query_scalar("SELECT 1 FROM user_roles WHERE user_id = $1 AND role = 'admin' LIMIT 1")
            .bind(user_id)
            .fetch_optional(&pool)
            .await;
    match exists {
        Ok(Some(_)) => CheckOutcome::Granted,
        Ok(None) => CheckOutcome::Denied,
        Err(e) => {
            warn!("Role-assignment admin check failed: {e}");
            CheckOutcome::Error
        }
    }
}

async fn directory_metadata_check(directory: Arc<dyn Directory>, user_id: Uuid) -> CheckOutcome {
    match directory.profile(user_id).await {
        Ok(profile) if profile_grants_admin(&profile) => CheckOutcome::Granted,
        Ok(_) => CheckOutcome::Denied,
        Err(e) => {
            warn!("Directory admin check failed: {e}");
            CheckOutcome::Error
        }
    }
}

/// Awaits spawned checks up to `deadline`, then gives each unfinished
/// check one `grace`-bounded attempt at a partial result before aborting
/// it. Checks that panic or run out of time count as errors.
async fn collect_outcomes(
    handles: Vec<JoinHandle<CheckOutcome>>,
    deadline: Duration,
    grace: Duration,
) -> Vec<CheckOutcome> {
    let cutoff = Instant::now() + deadline;
    let mut outcomes = Vec::with_capacity(handles.len());
    for mut handle in handles {
        let remaining = cutoff.saturating_duration_since(Instant::now());
        let outcome = match timeout(remaining, &mut handle).await {
            Ok(res) => join_outcome(res),
            Err(_) => match timeout(grace, &mut handle).await {
                Ok(res) => join_outcome(res),
                Err(_) => {
                    handle.abort();
                    CheckOutcome::Error
                }
            },
        };
        outcomes.push(outcome);
    }
    outcomes
}

fn join_outcome(res: Result<CheckOutcome, JoinError>) -> CheckOutcome {
    match res {
        Ok(outcome) => outcome,
        Err(e) => {
            warn!("Admin check task failed: {e}");
            CheckOutcome::Error
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::{DirectoryError, DirectoryProfile};
    use async_trait::async_trait;
    use regex::Regex;
    use serde_json::json;

    fn make_config(admin_emails: Vec<&str>, pattern: Option<&str>) -> Config {
        Config {
            database_url: "postgres://localhost/unused".to_string(),
            directory_api_url: "http://localhost:9".to_string(),
            directory_api_key: "test-key".to_string(),
            admin_emails: admin_emails.into_iter().map(String::from).collect(),
            admin_email_pattern: pattern.map(|p| Regex::new(p).unwrap()),
            port: 0,
            rust_log: "info".to_string(),
        }
    }

    struct StubDirectory(DirectoryProfile);

    #[async_trait]
    impl Directory for StubDirectory {
        async fn profile(&self, _user_id: Uuid) -> Result<DirectoryProfile, DirectoryError> {
            Ok(self.0.clone())
        }
    }

    struct FailingDirectory;

    #[async_trait]
    impl Directory for FailingDirectory {
        async fn profile(&self, _user_id: Uuid) -> Result<DirectoryProfile, DirectoryError> {
            Err(DirectoryError::Status(503))
        }
    }

    struct PanickingDirectory;

    #[async_trait]
    impl Directory for PanickingDirectory {
        async fn profile(&self, _user_id: Uuid) -> Result<DirectoryProfile, DirectoryError> {
            unreachable!("directory must not be consulted");
        }
    }

    #[test]
    fn test_email_list_is_case_insensitive() {
        let config = make_config(vec!["ops@jobbridge.com"], None);
        assert!(email_in_admin_list(&config, "Ops@JobBridge.com"));
        assert!(email_in_admin_list(&config, " ops@jobbridge.com "));
        assert!(!email_in_admin_list(&config, "user@jobbridge.com"));
    }

    #[test]
    fn test_pattern_grants_matching_email() {
        let config = make_config(vec![], Some(r".*@jobbridge-admin\.com$"));
        assert!(email_matches_admin_pattern(&config, "ops@jobbridge-admin.com"));
        assert!(!email_matches_admin_pattern(&config, "ops@jobbridge.com"));
    }

    #[test]
    fn test_unset_pattern_never_matches() {
        let config = make_config(vec![], None);
        assert!(!email_matches_admin_pattern(&config, "anyone@anywhere.com"));
    }

    #[tokio::test]
    async fn test_listed_email_short_circuits_before_probes() {
        // The pool points nowhere and the directory panics on use: a listed
        // email must be admitted without either being consulted.
        let state = AppState {
            db: sqlx::postgres::PgPoolOptions::new()
                .connect_lazy("postgres://localhost/unused")
                .unwrap(),
            config: make_config(vec!["ops@jobbridge.com"], None),
            directory: Arc::new(PanickingDirectory),
        };
        let identity = Identity {
            user_id: Uuid::new_v4(),
            email: "ops@jobbridge.com".to_string(),
        };
        assert!(is_admin(&state, &identity).await);
    }

    #[tokio::test]
    async fn test_directory_check_grants_on_admin_metadata() {
        let directory: Arc<dyn Directory> = Arc::new(StubDirectory(DirectoryProfile {
            app_metadata: json!({ "role": "admin" }),
            user_metadata: serde_json::Value::Null,
        }));
        let outcome = directory_metadata_check(directory, Uuid::new_v4()).await;
        assert_eq!(outcome, CheckOutcome::Granted);
    }

    #[tokio::test]
    async fn test_directory_check_denies_plain_profile() {
        let directory: Arc<dyn Directory> =
            Arc::new(StubDirectory(DirectoryProfile::default()));
        let outcome = directory_metadata_check(directory, Uuid::new_v4()).await;
        assert_eq!(outcome, CheckOutcome::Denied);
    }

    #[tokio::test]
    async fn test_directory_check_maps_failure_to_error() {
        let directory: Arc<dyn Directory> = Arc::new(FailingDirectory);
        let outcome = directory_metadata_check(directory, Uuid::new_v4()).await;
        assert_eq!(outcome, CheckOutcome::Error);
    }

    #[tokio::test(start_paused = true)]
    async fn test_collect_outcomes_keeps_fast_results() {
        let handles = vec![
            tokio::spawn(async { CheckOutcome::Granted }),
            tokio::spawn(async { CheckOutcome::Denied }),
        ];
        let outcomes = collect_outcomes(handles, PROBE_DEADLINE, PROBE_GRACE).await;
        assert_eq!(outcomes, vec![CheckOutcome::Granted, CheckOutcome::Denied]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_collect_outcomes_times_out_slow_check() {
        let handles = vec![
            tokio::spawn(async { CheckOutcome::Granted }),
            tokio::spawn(async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                CheckOutcome::Granted
            }),
        ];
        let outcomes = collect_outcomes(handles, PROBE_DEADLINE, PROBE_GRACE).await;
        assert_eq!(outcomes, vec![CheckOutcome::Granted, CheckOutcome::Error]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_collect_outcomes_grace_collects_straggler() {
        // Finishes just past the deadline but inside the grace window.
        let handles = vec![tokio::spawn(async {
            tokio::time::sleep(PROBE_DEADLINE + Duration::from_millis(100)).await;
            CheckOutcome::Granted
        })];
        let outcomes = collect_outcomes(handles, PROBE_DEADLINE, PROBE_GRACE).await;
        assert_eq!(outcomes, vec![CheckOutcome::Granted]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_collect_outcomes_treats_panic_as_error() {
        let handles: Vec<JoinHandle<CheckOutcome>> =
            vec![tokio::spawn(async { panic!("boom") })];
        let outcomes = collect_outcomes(handles, PROBE_DEADLINE, PROBE_GRACE).await;
        assert_eq!(outcomes, vec![CheckOutcome::Error]);
    }
}
