//! Identity-provider directory client.
//!
//! The admin resolver's metadata probe reads per-user metadata from the
//! identity provider. All provider traffic goes through this module.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Provider returned status {0}")]
    Status(u16),
}

/// Per-user metadata objects as stored by the identity provider. Both are
/// free-form JSON; absent objects deserialize as null.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DirectoryProfile {
    #[serde(default)]
    pub app_metadata: Value,
    #[serde(default)]
    pub user_metadata: Value,
}

/// Metadata lookup seam. `AppState` carries an `Arc<dyn Directory>` so the
/// admin probe can run against a stub in tests.
#[async_trait]
pub trait Directory: Send + Sync {
    async fn profile(&self, user_id: Uuid) -> Result<DirectoryProfile, DirectoryError>;
}

/// REST-backed directory client.
#[derive(Clone)]
pub struct HttpDirectory {
    client: Client,
    base_url: String,
    api_key: String,
}

impl HttpDirectory {
    pub fn new(base_url: String, api_key: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .expect("Failed to build HTTP client"),
            base_url,
            api_key,
        }
    }
}

#[async_trait]
impl Directory for HttpDirectory {
    async fn profile(&self, user_id: Uuid) -> Result<DirectoryProfile, DirectoryError> {
        let url = format!(
            "{}/v1/users/{}",
            self.base_url.trim_end_matches('/'),
            user_id
        );
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DirectoryError::Status(status.as_u16()));
        }
        Ok(response.json().await?)
    }
}

/// True when either metadata object marks the user as an admin, via a
/// `role` of "admin" or an `isAdmin` flag.
pub fn profile_grants_admin(profile: &DirectoryProfile) -> bool {
    metadata_grants_admin(&profile.app_metadata) || metadata_grants_admin(&profile.user_metadata)
}

fn metadata_grants_admin(metadata: &Value) -> bool {
    metadata.get("role").and_then(Value::as_str) == Some("admin")
        || metadata.get("isAdmin").and_then(Value::as_bool) == Some(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_admin_role_in_app_metadata_grants() {
        let profile = DirectoryProfile {
            app_metadata: json!({ "role": "admin" }),
            user_metadata: Value::Null,
        };
        assert!(profile_grants_admin(&profile));
    }

    #[test]
    fn test_is_admin_flag_in_user_metadata_grants() {
        let profile = DirectoryProfile {
            app_metadata: Value::Null,
            user_metadata: json!({ "isAdmin": true }),
        };
        assert!(profile_grants_admin(&profile));
    }

    #[test]
    fn test_non_admin_metadata_denies() {
        let profile = DirectoryProfile {
            app_metadata: json!({ "role": "member" }),
            user_metadata: json!({ "isAdmin": false }),
        };
        assert!(!profile_grants_admin(&profile));
    }

    #[test]
    fn test_empty_profile_denies() {
        assert!(!profile_grants_admin(&DirectoryProfile::default()));
    }

    #[test]
    fn test_wrong_types_deny() {
        let profile = DirectoryProfile {
            app_metadata: json!({ "role": 1 }),
            user_metadata: json!({ "isAdmin": "yes" }),
        };
        assert!(!profile_grants_admin(&profile));
    }

    #[test]
    fn test_profile_deserializes_with_missing_fields() {
        let profile: DirectoryProfile = serde_json::from_str("{}").unwrap();
        assert!(profile.app_metadata.is_null());
        assert!(profile.user_metadata.is_null());
    }
}
