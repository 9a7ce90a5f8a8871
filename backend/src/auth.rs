//! Client for the hosted authentication collaborator.
//!
//! The application does not implement authentication itself: credentials,
//! sessions, and the profile table (user id → email, role) live in the
//! hosted identity provider. This module wraps its REST API behind the
//! [`AuthProvider`] trait; the expense core only ever asks "is there a
//! user" and "what is its role".

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::Deserialize;
use serde_json::json;

use shared::{SessionResponse, UserProfile, UserRole};

use crate::error::{AppError, AppResult};

const TOKEN_PATH: &str = "/auth/v1/token";
const SIGNUP_PATH: &str = "/auth/v1/signup";
const LOGOUT_PATH: &str = "/auth/v1/logout";
const USER_PATH: &str = "/auth/v1/user";
const PROFILES_PATH: &str = "/rest/v1/profiles";

/// Operations the identity provider exposes to this application.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Register a new account. New accounts start with role `user`.
    async fn sign_up(&self, email: &str, password: &str) -> AppResult<UserProfile>;

    /// Exchange credentials for an access token and the user's profile.
    async fn sign_in(&self, email: &str, password: &str) -> AppResult<SessionResponse>;

    /// Invalidate the session behind the token.
    async fn sign_out(&self, token: &str) -> AppResult<()>;

    /// Resolve the token to the signed-in user's profile.
    async fn current_user(&self, token: &str) -> AppResult<UserProfile>;

    /// All profile rows. The provider enforces row-level access; the
    /// application additionally gates this behind the admin role.
    async fn list_profiles(&self, token: &str) -> AppResult<Vec<UserProfile>>;

    /// Set the role on a user's profile row.
    async fn update_role(&self, token: &str, user_id: &str, role: UserRole)
        -> AppResult<UserProfile>;

    /// Change the email on a user's profile row.
    async fn update_email(&self, token: &str, user_id: &str, email: &str)
        -> AppResult<UserProfile>;
}

/// Identity fields the auth endpoints return; the role lives on the
/// profile row, not here.
#[derive(Debug, Deserialize)]
struct AuthUser {
    id: String,
    email: String,
    #[serde(default)]
    created_at: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    user: AuthUser,
}

/// HTTP client for the hosted identity provider.
pub struct RemoteAuthProvider {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl RemoteAuthProvider {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> AppResult<Self> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn headers(&self, token: Option<&str>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Ok(key) = HeaderValue::from_str(&self.api_key) {
            headers.insert("apikey", key);
        }
        let bearer = token.unwrap_or(&self.api_key);
        if let Ok(value) = HeaderValue::from_str(&format!("Bearer {bearer}")) {
            headers.insert(AUTHORIZATION, value);
        }
        headers
    }

    async fn expect_json<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> AppResult<T> {
        let status = response.status();
        if status.is_success() {
            response
                .json()
                .await
                .map_err(|e| AppError::unavailable(format!("undecodable auth payload: {e}")))
        } else if status.as_u16() == 401 || status.as_u16() == 403 || status.as_u16() == 400 {
            Err(AppError::Unauthorized)
        } else {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            Err(AppError::unavailable(format!(
                "identity provider returned {status}: {message}"
            )))
        }
    }

    /// Fetch the profile row for a user id.
    async fn fetch_profile(&self, token: &str, user_id: &str) -> AppResult<UserProfile> {
        let response = self
            .http
            .get(self.url(PROFILES_PATH))
            .headers(self.headers(Some(token)))
            .query(&[("id", format!("eq.{user_id}"))])
            .send()
            .await?;

        let mut profiles: Vec<UserProfile> = Self::expect_json(response).await?;
        profiles
            .pop()
            .ok_or_else(|| AppError::not_found(format!("profile {user_id}")))
    }
}

#[async_trait]
impl AuthProvider for RemoteAuthProvider {
    async fn sign_up(&self, email: &str, password: &str) -> AppResult<UserProfile> {
        let response = self
            .http
            .post(self.url(SIGNUP_PATH))
            .headers(self.headers(None))
            .json(&json!({
                "email": email,
                "password": password,
                "data": { "role": "user" },
            }))
            .send()
            .await?;

        let user: AuthUser = Self::expect_json(response).await?;
        Ok(UserProfile {
            id: user.id,
            email: user.email,
            role: UserRole::User,
            created_at: user.created_at,
        })
    }

    async fn sign_in(&self, email: &str, password: &str) -> AppResult<SessionResponse> {
        let response = self
            .http
            .post(format!("{}?grant_type=password", self.url(TOKEN_PATH)))
            .headers(self.headers(None))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;

        let token: TokenResponse = Self::expect_json(response).await?;
        let user = self.fetch_profile(&token.access_token, &token.user.id).await?;
        Ok(SessionResponse {
            access_token: token.access_token,
            user,
        })
    }

    async fn sign_out(&self, token: &str) -> AppResult<()> {
        let response = self
            .http
            .post(self.url(LOGOUT_PATH))
            .headers(self.headers(Some(token)))
            .send()
            .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(AppError::Unauthorized)
        }
    }

    async fn current_user(&self, token: &str) -> AppResult<UserProfile> {
        let response = self
            .http
            .get(self.url(USER_PATH))
            .headers(self.headers(Some(token)))
            .send()
            .await?;

        let user: AuthUser = Self::expect_json(response).await?;
        self.fetch_profile(token, &user.id).await
    }

    async fn list_profiles(&self, token: &str) -> AppResult<Vec<UserProfile>> {
        let response = self
            .http
            .get(self.url(PROFILES_PATH))
            .headers(self.headers(Some(token)))
            .send()
            .await?;

        Self::expect_json(response).await
    }

    async fn update_role(
        &self,
        token: &str,
        user_id: &str,
        role: UserRole,
    ) -> AppResult<UserProfile> {
        let response = self
            .http
            .patch(self.url(PROFILES_PATH))
            .headers(self.headers(Some(token)))
            .header("Prefer", "return=representation")
            .query(&[("id", format!("eq.{user_id}"))])
            .json(&json!({ "role": role }))
            .send()
            .await?;

        let mut profiles: Vec<UserProfile> = Self::expect_json(response).await?;
        profiles
            .pop()
            .ok_or_else(|| AppError::not_found(format!("profile {user_id}")))
    }

    async fn update_email(
        &self,
        token: &str,
        user_id: &str,
        email: &str,
    ) -> AppResult<UserProfile> {
        let response = self
            .http
            .patch(self.url(PROFILES_PATH))
            .headers(self.headers(Some(token)))
            .header("Prefer", "return=representation")
            .query(&[("id", format!("eq.{user_id}"))])
            .json(&json!({ "email": email }))
            .send()
            .await?;

        let mut profiles: Vec<UserProfile> = Self::expect_json(response).await?;
        profiles
            .pop()
            .ok_or_else(|| AppError::not_found(format!("profile {user_id}")))
    }
}

/// Static provider for tests: a fixed token-to-profile table with no
/// network involved.
#[cfg(test)]
pub mod testing {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct StaticAuthProvider {
        sessions: Mutex<HashMap<String, UserProfile>>,
    }

    impl StaticAuthProvider {
        pub fn new() -> Self {
            Self::default()
        }

        /// Register a token that resolves to the given profile.
        pub fn with_session(self, token: &str, profile: UserProfile) -> Self {
            self.sessions
                .lock()
                .unwrap()
                .insert(token.to_string(), profile);
            self
        }

        pub fn admin(id: &str, email: &str) -> UserProfile {
            UserProfile {
                id: id.to_string(),
                email: email.to_string(),
                role: UserRole::Admin,
                created_at: "2024-01-01T00:00:00Z".to_string(),
            }
        }

        pub fn user(id: &str, email: &str) -> UserProfile {
            UserProfile {
                id: id.to_string(),
                email: email.to_string(),
                role: UserRole::User,
                created_at: "2024-01-01T00:00:00Z".to_string(),
            }
        }
    }

    #[async_trait]
    impl AuthProvider for StaticAuthProvider {
        async fn sign_up(&self, email: &str, _password: &str) -> AppResult<UserProfile> {
            Ok(StaticAuthProvider::user("new-user", email))
        }

        async fn sign_in(&self, email: &str, _password: &str) -> AppResult<SessionResponse> {
            let sessions = self.sessions.lock().unwrap();
            sessions
                .iter()
                .find(|(_, profile)| profile.email == email)
                .map(|(token, profile)| SessionResponse {
                    access_token: token.clone(),
                    user: profile.clone(),
                })
                .ok_or(AppError::Unauthorized)
        }

        async fn sign_out(&self, _token: &str) -> AppResult<()> {
            Ok(())
        }

        async fn current_user(&self, token: &str) -> AppResult<UserProfile> {
            self.sessions
                .lock()
                .unwrap()
                .get(token)
                .cloned()
                .ok_or(AppError::Unauthorized)
        }

        async fn list_profiles(&self, _token: &str) -> AppResult<Vec<UserProfile>> {
            let mut profiles: Vec<UserProfile> =
                self.sessions.lock().unwrap().values().cloned().collect();
            profiles.sort_by(|a, b| a.id.cmp(&b.id));
            Ok(profiles)
        }

        async fn update_role(
            &self,
            _token: &str,
            user_id: &str,
            role: UserRole,
        ) -> AppResult<UserProfile> {
            let mut sessions = self.sessions.lock().unwrap();
            let profile = sessions
                .values_mut()
                .find(|profile| profile.id == user_id)
                .ok_or_else(|| AppError::not_found(format!("profile {user_id}")))?;
            profile.role = role;
            Ok(profile.clone())
        }

        async fn update_email(
            &self,
            _token: &str,
            user_id: &str,
            email: &str,
        ) -> AppResult<UserProfile> {
            let mut sessions = self.sessions.lock().unwrap();
            let profile = sessions
                .values_mut()
                .find(|profile| profile.id == user_id)
                .ok_or_else(|| AppError::not_found(format!("profile {user_id}")))?;
            profile.email = email.to_string();
            Ok(profile.clone())
        }
    }
}
