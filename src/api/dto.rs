use serde::{Deserialize, Serialize};

use crate::models::UserProfile;

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// `{status, message, errors}` envelope returned by the user endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusEnvelope {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub errors: Vec<serde_json::Value>,
}

impl StatusEnvelope {
    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

/// Category creation answers with a status code inside the body as well.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateCategoryResponse {
    #[serde(default)]
    pub code: Option<u16>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FindUserResponse {
    pub content: UserProfile,
}
