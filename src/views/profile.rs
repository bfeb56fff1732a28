use std::sync::{Arc, Mutex, PoisonError};

use tracing::error;

use crate::api::TaskdeckApi;
use crate::app::AppContext;
use crate::error::ClientError;
use crate::models::{FieldErrors, ProfileUpdate, UserProfile};
use crate::notify::{Notice, Notifier};
use crate::session::Session;

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, Default)]
pub struct PasswordChange {
    pub new_password: String,
    pub confirm_password: String,
}

impl PasswordChange {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        if self.new_password != self.confirm_password {
            errors.push("password", "Passwords do not match");
        } else if self.new_password.chars().count() < MIN_PASSWORD_LEN {
            errors.push("password", "Password must be at least 6 characters");
        }
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Account settings of the signed-in user.
pub struct ProfileView {
    api: TaskdeckApi,
    session: Arc<Session>,
    notifier: Arc<dyn Notifier>,
    profile: Mutex<Option<UserProfile>>,
}

impl ProfileView {
    pub fn new(ctx: &AppContext) -> Self {
        Self {
            api: ctx.api.clone(),
            session: ctx.session.clone(),
            notifier: ctx.notifier.clone(),
            profile: Mutex::new(None),
        }
    }

    pub fn profile(&self) -> Option<UserProfile> {
        self.lock().clone()
    }

    pub async fn load(&self) -> Result<UserProfile, ClientError> {
        let identity = self.session.require_identity()?;
        let profile = self
            .api
            .find_user(&identity.username)
            .await
            .inspect_err(|e| error!("Failed to fetch user data: {}", e))?;
        *self.lock() = Some(profile.clone());
        Ok(profile)
    }

    /// Saves username/email changes and keeps the session username in step.
    pub async fn update(&self, update: ProfileUpdate) -> Result<UserProfile, ClientError> {
        let current = self.current().await?;
        if update.is_empty() {
            return Ok(current);
        }

        let echoed = self
            .api
            .update_user(&current.email, &update)
            .await
            .inspect_err(|e| error!("Failed to update profile: {}", e))?;

        let updated = echoed.unwrap_or_else(|| UserProfile {
            id: current.id,
            username: update.username.clone().unwrap_or(current.username.clone()),
            email: update.email.clone().unwrap_or(current.email.clone()),
        });
        if let Some(username) = update.username.as_deref().filter(|u| !u.trim().is_empty()) {
            self.session.set_username(username)?;
        }
        *self.lock() = Some(updated.clone());
        self.notifier.notify(Notice::success("Profile updated successfully"));
        Ok(updated)
    }

    pub async fn change_password(&self, change: &PasswordChange) -> Result<(), ClientError> {
        change.validate().map_err(ClientError::Validation)?;
        let current = self.current().await?;

        let update = ProfileUpdate {
            password: Some(change.new_password.clone()),
            ..ProfileUpdate::default()
        };
        match self.api.update_user(&current.email, &update).await {
            Ok(_) => {
                self.notifier.notify(Notice::success("Password changed successfully"));
                Ok(())
            }
            Err(e) => {
                error!("Failed to change password: {}", e);
                self.notifier
                    .notify(Notice::error("Failed to change password. Please try again."));
                Err(e)
            }
        }
    }

    pub fn logout(&self) -> Result<(), ClientError> {
        *self.lock() = None;
        self.session.sign_out()
    }

    async fn current(&self) -> Result<UserProfile, ClientError> {
        match self.profile() {
            Some(profile) => Ok(profile),
            None => self.load().await,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<UserProfile>> {
        self.profile.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
