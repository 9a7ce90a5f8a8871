//! Session and role gating over the auth collaborator.

use std::sync::Arc;

use tracing::info;

use shared::{SessionResponse, UserProfile, UserRole};

use crate::auth::AuthProvider;
use crate::error::{AppError, AppResult};

/// Thin service over the identity provider: resolves tokens to profiles
/// and gates admin-only operations on the profile role.
#[derive(Clone)]
pub struct AuthService {
    provider: Arc<dyn AuthProvider>,
}

impl AuthService {
    pub fn new(provider: Arc<dyn AuthProvider>) -> Self {
        Self { provider }
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> AppResult<UserProfile> {
        let profile = self.provider.sign_up(email, password).await?;
        info!("registered user {}", profile.email);
        Ok(profile)
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> AppResult<SessionResponse> {
        self.provider.sign_in(email, password).await
    }

    pub async fn sign_out(&self, token: &str) -> AppResult<()> {
        self.provider.sign_out(token).await
    }

    /// Resolve the bearer token to a profile; a missing token short-circuits
    /// without hitting the provider.
    pub async fn require_user(&self, token: Option<&str>) -> AppResult<UserProfile> {
        let token = token.ok_or(AppError::Unauthorized)?;
        self.provider.current_user(token).await
    }

    /// Like [`require_user`](Self::require_user), but the profile role must
    /// be admin.
    pub async fn require_admin(&self, token: Option<&str>) -> AppResult<UserProfile> {
        let user = self.require_user(token).await?;
        if !user.is_admin() {
            return Err(AppError::Forbidden);
        }
        Ok(user)
    }

    /// All user profiles, admin only.
    pub async fn list_users(&self, token: Option<&str>) -> AppResult<Vec<UserProfile>> {
        let token = token.ok_or(AppError::Unauthorized)?;
        self.require_admin(Some(token)).await?;
        self.provider.list_profiles(token).await
    }

    /// Set a user's role, admin only.
    pub async fn set_role(
        &self,
        token: Option<&str>,
        user_id: &str,
        role: UserRole,
    ) -> AppResult<UserProfile> {
        let token = token.ok_or(AppError::Unauthorized)?;
        let admin = self.require_admin(Some(token)).await?;
        let updated = self.provider.update_role(token, user_id, role).await?;
        info!(
            "admin {} set role of {} to {}",
            admin.email, updated.email, updated.role
        );
        Ok(updated)
    }

    /// Change the signed-in user's own email.
    pub async fn update_email(&self, token: Option<&str>, email: &str) -> AppResult<UserProfile> {
        let token = token.ok_or(AppError::Unauthorized)?;
        let user = self.require_user(Some(token)).await?;
        self.provider.update_email(token, &user.id, email).await
    }
}
