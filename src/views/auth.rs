use std::sync::Arc;

use tracing::{error, info, warn};

use crate::api::TaskdeckApi;
use crate::api::dto::{LoginRequest, SignupRequest, StatusEnvelope};
use crate::app::AppContext;
use crate::error::ClientError;
use crate::models::{FieldErrors, Identity};
use crate::notify::{Notice, NoticeLevel, Notifier};
use crate::session::Session;

/// Route a successful login lands on.
pub const DASHBOARD_ROUTE: &str = "/dashboard";

pub struct AuthService {
    api: TaskdeckApi,
    session: Arc<Session>,
    notifier: Arc<dyn Notifier>,
}

impl AuthService {
    pub fn new(ctx: &AppContext) -> Self {
        Self {
            api: ctx.api.clone(),
            session: ctx.session.clone(),
            notifier: ctx.notifier.clone(),
        }
    }

    /// Checks the credentials, then looks the user up to learn their id and
    /// stores the identity in the session.
    pub async fn login(&self, username: &str, password: &str) -> Result<Identity, ClientError> {
        let mut errors = FieldErrors::new();
        require(&mut errors, "username", username);
        require(&mut errors, "password", password);
        if !errors.is_empty() {
            return Err(ClientError::Validation(errors));
        }

        let envelope = self
            .api
            .login(&LoginRequest {
                username: username.trim().to_string(),
                password: password.to_string(),
            })
            .await
            .inspect_err(|e| error!("Login request failed: {}", e))?;

        if !envelope.is_ok() {
            warn!("Login failed for {}: {}", username, envelope.message);
            self.notifier.notify(Notice::new(
                NoticeLevel::from_status(&envelope.status),
                envelope.message.clone(),
            ));
            return Err(ClientError::Rejected(envelope.message));
        }

        let profile = self.api.find_user(username.trim()).await?;
        let identity = profile.identity();
        self.session.sign_in(identity.clone())?;
        info!("login ok, landing on {}", DASHBOARD_ROUTE);
        Ok(identity)
    }

    /// Registers a new account. The envelope is returned whatever its status
    /// so callers can show the field errors the server sent.
    pub async fn signup(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<StatusEnvelope, ClientError> {
        let mut errors = FieldErrors::new();
        require(&mut errors, "email", email);
        if !email.trim().is_empty() && !email.contains('@') {
            errors.push("email", "Email is not valid");
        }
        require(&mut errors, "username", username);
        require(&mut errors, "password", password);
        if !errors.is_empty() {
            return Err(ClientError::Validation(errors));
        }

        let envelope = self
            .api
            .signup(&SignupRequest {
                username: username.trim().to_string(),
                email: email.trim().to_string(),
                password: password.to_string(),
            })
            .await
            .inspect_err(|e| error!("Signup request failed: {}", e))?;

        if !envelope.message.is_empty() {
            let notice = if envelope.is_ok() {
                Notice::success(envelope.message.clone())
            } else {
                Notice::error(envelope.message.clone())
            };
            self.notifier.notify(notice);
        }
        Ok(envelope)
    }

    pub fn logout(&self) -> Result<(), ClientError> {
        self.session.sign_out()
    }

    pub fn current(&self) -> Option<Identity> {
        self.session.identity()
    }
}

fn require(errors: &mut FieldErrors, field: &'static str, value: &str) {
    if value.trim().is_empty() {
        errors.push(field, format!("{} is required", field));
    }
}
