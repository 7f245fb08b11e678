//! Client Configuration
//!
//! Which database to talk to, where it lives, and the write policy for
//! `update`/`delete` on missing documents.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::{FirestoreError, FirestoreResult};
use crate::path::{DatabaseId, DEFAULT_DATABASE};
use crate::reference::WritePolicy;

/// Production REST endpoint
pub const PRODUCTION_BASE_URL: &str = "https://firestore.googleapis.com/v1";

/// Environment variable naming a local emulator (`host:port`)
pub const EMULATOR_HOST_ENV: &str = "FIRESTORE_EMULATOR_HOST";

/// Environment variables consulted for the project id, in order
pub const PROJECT_ID_ENVS: [&str; 2] = ["FIREBASE_PROJECT_ID", "GCLOUD_PROJECT"];

/// Client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub project_id: String,

    /// Database id (default: "(default)")
    #[serde(default = "default_database_id")]
    pub database_id: String,

    /// Emulator address such as "localhost:8080"; requests go there over
    /// plain HTTP when set
    #[serde(default)]
    pub emulator_host: Option<String>,

    /// Explicit REST base URL, overriding both production and emulator
    #[serde(default)]
    pub base_url: Option<String>,

    /// `update` on a missing document fails with NotFound (default: true)
    #[serde(default = "default_update_must_exist")]
    pub update_must_exist: bool,

    /// `delete` on a missing document fails with NotFound (default: false)
    #[serde(default)]
    pub delete_must_exist: bool,

    /// Per-request HTTP timeout in milliseconds (default: 60000)
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_database_id() -> String {
    DEFAULT_DATABASE.to_string()
}

fn default_update_must_exist() -> bool {
    true
}

fn default_request_timeout_ms() -> u64 {
    60_000
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            project_id: String::new(),
            database_id: default_database_id(),
            emulator_host: None,
            base_url: None,
            update_must_exist: default_update_must_exist(),
            delete_must_exist: false,
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl ClientConfig {
    /// Config for a project's default database
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            ..Default::default()
        }
    }

    /// Point the client at an emulator
    pub fn with_emulator(mut self, host: impl Into<String>) -> Self {
        self.emulator_host = Some(host.into());
        self
    }

    pub fn with_database(mut self, database_id: impl Into<String>) -> Self {
        self.database_id = database_id.into();
        self
    }

    /// Read `FIRESTORE_EMULATOR_HOST` and the project id from the process
    /// environment
    pub fn from_env() -> FirestoreResult<Self> {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    /// Like `from_env`, with an explicit variable lookup
    pub fn from_env_with<F>(lookup: F) -> FirestoreResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let project_id = PROJECT_ID_ENVS
            .iter()
            .find_map(|key| lookup(key).filter(|v| !v.is_empty()))
            .ok_or_else(|| {
                FirestoreError::usage(format!(
                    "no project id: set one of {}",
                    PROJECT_ID_ENVS.join(", ")
                ))
            })?;

        let mut config = Self::new(project_id);
        config.emulator_host = lookup(EMULATOR_HOST_ENV).filter(|v| !v.is_empty());
        Ok(config)
    }

    /// Fail early on settings no request could succeed with
    pub fn validate(&self) -> FirestoreResult<()> {
        if self.project_id.is_empty() {
            return Err(FirestoreError::usage("project_id must not be empty"));
        }
        if self.database_id.is_empty() {
            return Err(FirestoreError::usage("database_id must not be empty"));
        }
        Ok(())
    }

    pub fn database(&self) -> DatabaseId {
        DatabaseId::new(self.project_id.clone(), self.database_id.clone())
    }

    /// REST base URL requests are issued under
    pub fn base_url(&self) -> String {
        match (&self.base_url, &self.emulator_host) {
            (Some(url), _) => url.trim_end_matches('/').to_string(),
            (None, Some(host)) => format!("http://{}/v1", host),
            (None, None) => PRODUCTION_BASE_URL.to_string(),
        }
    }

    pub fn is_emulator(&self) -> bool {
        self.emulator_host.is_some()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn write_policy(&self) -> WritePolicy {
        WritePolicy {
            update_must_exist: self.update_must_exist,
            delete_must_exist: self.delete_must_exist,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::new("demo");
        assert_eq!(config.database_id, "(default)");
        assert!(config.update_must_exist);
        assert!(!config.delete_must_exist);
        assert_eq!(config.base_url(), "https://firestore.googleapis.com/v1");
        assert_eq!(config.request_timeout(), Duration::from_secs(60));
    }

    #[test]
    fn test_emulator_base_url() {
        let config = ClientConfig::new("demo").with_emulator("localhost:8080");
        assert!(config.is_emulator());
        assert_eq!(config.base_url(), "http://localhost:8080/v1");
    }

    #[test]
    fn test_explicit_base_url_wins() {
        let mut config = ClientConfig::new("demo").with_emulator("localhost:8080");
        config.base_url = Some("http://proxy/v1/".to_string());
        assert_eq!(config.base_url(), "http://proxy/v1");
    }

    #[test]
    fn test_deserialize_fills_defaults() {
        let config: ClientConfig =
            serde_json::from_str(r#"{"project_id": "demo", "update_must_exist": false}"#).unwrap();
        assert_eq!(config.database_id, "(default)");
        assert!(!config.update_must_exist);
        assert_eq!(config.request_timeout_ms, 60_000);
    }

    #[test]
    fn test_from_env_with() {
        let vars: HashMap<&str, &str> = [
            ("GCLOUD_PROJECT", "fallback"),
            ("FIRESTORE_EMULATOR_HOST", "127.0.0.1:8080"),
        ]
        .into_iter()
        .collect();

        let config =
            ClientConfig::from_env_with(|key| vars.get(key).map(|v| v.to_string())).unwrap();
        assert_eq!(config.project_id, "fallback");
        assert_eq!(config.emulator_host.as_deref(), Some("127.0.0.1:8080"));
    }

    #[test]
    fn test_from_env_requires_project() {
        let result = ClientConfig::from_env_with(|_| None);
        assert!(matches!(result, Err(FirestoreError::Usage(_))));
    }

    #[test]
    fn test_validate() {
        assert!(ClientConfig::default().validate().is_err());
        assert!(ClientConfig::new("demo").validate().is_ok());
    }
}
