//! Auth API collaborator.
//!
//! The manager only sees the [`AuthApi`] trait; the HTTP implementation talks
//! to the authentication service's two endpoints. Tests substitute in-process
//! doubles.

use std::collections::{BTreeSet, HashMap, HashSet};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use slatecrm_core::{EntityKind, RecordId, UserId};

/// Preliminary user identity returned by login.
///
/// Roles are *not* trusted from this payload; the authoritative set always
/// comes from the dedicated roles endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPayload {
    pub id: UserId,
    pub display_name: String,
    #[serde(default)]
    pub owned_entity_ids: HashMap<EntityKind, BTreeSet<RecordId>>,
    #[serde(default)]
    pub team_member_ids: HashSet<UserId>,
}

/// Successful login response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoginOutcome {
    pub token: String,
    pub user: UserPayload,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthApiError {
    /// 401/403 — the token is invalid or expired.
    #[error("unauthorized")]
    Unauthorized,

    /// Any other non-2xx response.
    #[error("unexpected status: {0}")]
    Status(u16),

    /// Transport failure (DNS, refused connection, timeout).
    #[error("network: {0}")]
    Network(String),
}

/// Abstract contract against the external authentication service.
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// `POST /auth/login` with credentials.
    async fn login(&self, identifier: &str, password: &str)
        -> Result<LoginOutcome, AuthApiError>;

    /// `GET /auth/roles` with a bearer token.
    async fn fetch_roles(&self, token: &str) -> Result<Vec<String>, AuthApiError>;
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    identifier: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct RolesResponse {
    #[serde(default)]
    roles: Vec<String>,
}

/// reqwest-backed implementation of [`AuthApi`].
#[derive(Debug, Clone)]
pub struct HttpAuthApi {
    base_url: String,
    client: reqwest::Client,
}

impl HttpAuthApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

#[async_trait]
impl AuthApi for HttpAuthApi {
    async fn login(
        &self,
        identifier: &str,
        password: &str,
    ) -> Result<LoginOutcome, AuthApiError> {
        let response = self
            .client
            .post(self.url("/auth/login"))
            .json(&LoginRequest {
                identifier,
                password,
            })
            .send()
            .await
            .map_err(|e| AuthApiError::Network(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED
            || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(AuthApiError::Unauthorized);
        }
        if !status.is_success() {
            return Err(AuthApiError::Status(status.as_u16()));
        }

        response
            .json::<LoginOutcome>()
            .await
            .map_err(|e| AuthApiError::Network(e.to_string()))
    }

    async fn fetch_roles(&self, token: &str) -> Result<Vec<String>, AuthApiError> {
        let response = self
            .client
            .get(self.url("/auth/roles"))
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| AuthApiError::Network(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED
            || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(AuthApiError::Unauthorized);
        }
        if !status.is_success() {
            return Err(AuthApiError::Status(status.as_u16()));
        }

        let body = response
            .json::<RolesResponse>()
            .await
            .map_err(|e| AuthApiError::Network(e.to_string()))?;
        Ok(body.roles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_payload_tolerates_missing_optional_fields() {
        let json = r#"{
            "token": "tok",
            "user": { "id": 3, "displayName": "Mira Okafor" }
        }"#;
        let outcome: LoginOutcome = serde_json::from_str(json).unwrap();
        assert_eq!(outcome.user.display_name, "Mira Okafor");
        assert!(outcome.user.owned_entity_ids.is_empty());
        assert!(outcome.user.team_member_ids.is_empty());
    }

    #[test]
    fn url_join_handles_trailing_slash() {
        let api = HttpAuthApi::new("https://crm.example.com/");
        assert_eq!(api.url("/auth/roles"), "https://crm.example.com/auth/roles");
    }
}
