//! Environment-driven configuration for the session layer.

/// Configuration for the session manager's collaborators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Base URL of the authentication service.
    pub api_base_url: String,
    /// Directory name under the OS data dir for the persisted session.
    pub storage_namespace: String,
}

impl SessionConfig {
    /// Read configuration from `SLATECRM_API_URL` / `SLATECRM_STORAGE_NS`,
    /// falling back to logged dev defaults.
    pub fn from_env() -> Self {
        let api_base_url = std::env::var("SLATECRM_API_URL").unwrap_or_else(|_| {
            tracing::warn!("SLATECRM_API_URL not set; using dev default");
            "http://localhost:8080".to_string()
        });
        let storage_namespace =
            std::env::var("SLATECRM_STORAGE_NS").unwrap_or_else(|_| "slatecrm".to_string());

        Self {
            api_base_url,
            storage_namespace,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8080".to_string(),
            storage_namespace: "slatecrm".to_string(),
        }
    }
}
