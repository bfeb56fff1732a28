use std::sync::Arc;

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

use super::dto::{
    CreateCategoryResponse, FindUserResponse, LoginRequest, SignupRequest, StatusEnvelope,
};
use super::{ApiGateway, Method};
use crate::error::ClientError;
use crate::models::{Category, CategoryPayload, ProfileUpdate, Task, TaskRequest, UserProfile};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Typed endpoints of the task API on top of an [`ApiGateway`].
#[derive(Clone)]
pub struct TaskdeckApi {
    gateway: Arc<dyn ApiGateway>,
}

impl TaskdeckApi {
    pub fn new(gateway: Arc<dyn ApiGateway>) -> Self {
        Self { gateway }
    }

    pub fn is_pending(&self) -> bool {
        self.gateway.is_pending()
    }

    pub async fn list_categories(&self, username: &str) -> Result<Vec<Category>, ClientError> {
        let body = self
            .gateway
            .call(Method::Get, "/api/categories", None, &[("username", username.to_string())])
            .await?;
        decode_list(body)
    }

    /// Creates a category and returns the server's message. A duplicate name
    /// comes back as [`ClientError::Conflict`] whether the server signals it
    /// with the HTTP status or the `code` field of the body.
    pub async fn create_category(&self, username: &str, name: &str) -> Result<String, ClientError> {
        let body = self
            .gateway
            .call(
                Method::Post,
                "/api/categories",
                Some(serde_json::to_value(CategoryPayload::new(name))?),
                &[("username", username.to_string())],
            )
            .await?;
        let response: CreateCategoryResponse = decode_or_default(body)?;
        let message = response
            .message
            .unwrap_or_else(|| "Category created".to_string());
        if response.code == Some(409) {
            return Err(ClientError::Conflict(message));
        }
        Ok(message)
    }

    pub async fn rename_category(
        &self,
        username: &str,
        category_id: i64,
        name: &str,
    ) -> Result<(), ClientError> {
        self.gateway
            .call(
                Method::Put,
                &format!("/api/categories/{}", category_id),
                Some(serde_json::to_value(CategoryPayload::new(name))?),
                &[("username", username.to_string())],
            )
            .await?;
        Ok(())
    }

    pub async fn delete_category(&self, username: &str, category_id: i64) -> Result<(), ClientError> {
        self.gateway
            .call(
                Method::Delete,
                &format!("/api/categories/{}", category_id),
                None,
                &[("username", username.to_string())],
            )
            .await?;
        Ok(())
    }

    pub async fn list_tasks(&self, category_id: i64, user_id: i64) -> Result<Vec<Task>, ClientError> {
        let body = self
            .gateway
            .call(
                Method::Get,
                "/api/tasks",
                None,
                &[
                    ("categoryId", category_id.to_string()),
                    ("userId", user_id.to_string()),
                ],
            )
            .await?;
        decode_list(body)
    }

    pub async fn list_tasks_by_date(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        user_id: i64,
    ) -> Result<Vec<Task>, ClientError> {
        let body = self
            .gateway
            .call(
                Method::Get,
                "/api/tasks/filterbydate",
                None,
                &[
                    ("startDate", start.format(DATE_FORMAT).to_string()),
                    ("endDate", end.format(DATE_FORMAT).to_string()),
                    ("userId", user_id.to_string()),
                ],
            )
            .await?;
        decode_list(body)
    }

    pub async fn create_task(&self, request: &TaskRequest) -> Result<(), ClientError> {
        self.gateway
            .call(Method::Post, "/api/tasks", Some(serde_json::to_value(request)?), &[])
            .await?;
        Ok(())
    }

    pub async fn update_task(&self, task_id: i64, request: &TaskRequest) -> Result<(), ClientError> {
        self.gateway
            .call(
                Method::Put,
                &format!("/api/tasks/{}", task_id),
                Some(serde_json::to_value(request)?),
                &[],
            )
            .await?;
        Ok(())
    }

    pub async fn delete_task(&self, task_id: i64) -> Result<(), ClientError> {
        self.gateway
            .call(Method::Delete, &format!("/api/tasks/{}", task_id), None, &[])
            .await?;
        Ok(())
    }

    pub async fn login(&self, request: &LoginRequest) -> Result<StatusEnvelope, ClientError> {
        let body = self
            .gateway
            .call(Method::Post, "/api/users/login", Some(serde_json::to_value(request)?), &[])
            .await?;
        decode_or_default(body)
    }

    pub async fn signup(&self, request: &SignupRequest) -> Result<StatusEnvelope, ClientError> {
        let body = self
            .gateway
            .call(Method::Post, "/api/users/signup", Some(serde_json::to_value(request)?), &[])
            .await?;
        decode_or_default(body)
    }

    pub async fn find_user(&self, param: &str) -> Result<UserProfile, ClientError> {
        let body = self
            .gateway
            .call(Method::Get, "/api/users/find", None, &[("param", param.to_string())])
            .await?;
        let response: FindUserResponse = serde_json::from_value(body)?;
        Ok(response.content)
    }

    /// Returns the updated profile when the server echoes one back.
    pub async fn update_user(
        &self,
        email: &str,
        update: &ProfileUpdate,
    ) -> Result<Option<UserProfile>, ClientError> {
        let body = self
            .gateway
            .call(
                Method::Put,
                "/api/users/update",
                Some(serde_json::to_value(update)?),
                &[("email", email.to_string())],
            )
            .await?;
        let profile = match body.get("content") {
            Some(content) => content.clone(),
            None => body,
        };
        Ok(serde_json::from_value(profile).ok())
    }
}

/// A `null` body counts as an empty list.
fn decode_list<T: DeserializeOwned>(body: Value) -> Result<Vec<T>, ClientError> {
    if body.is_null() {
        warn!("empty list response");
        return Ok(Vec::new());
    }
    Ok(serde_json::from_value(body)?)
}

fn decode_or_default<T: DeserializeOwned + Default>(body: Value) -> Result<T, ClientError> {
    if body.is_null() {
        return Ok(T::default());
    }
    Ok(serde_json::from_value(body)?)
}
