use std::env;
use std::path::PathBuf;

use crate::error::ClientError;

const DEFAULT_STATE_PATH: &str = "taskdeck-session.json";

#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub api_url: String,
    pub state_path: PathBuf,
}

impl ClientConfig {
    pub fn new(api_url: impl Into<String>, state_path: impl Into<PathBuf>) -> Self {
        Self {
            api_url: api_url.into(),
            state_path: state_path.into(),
        }
    }

    /// Reads `TASKDECK_API_URL` and `TASKDECK_STATE_PATH`, loading a `.env`
    /// file first when one is present.
    pub fn new_from_env() -> Result<Self, ClientError> {
        dotenvy::dotenv().ok();

        let api_url = env::var("TASKDECK_API_URL")
            .map_err(|_| ClientError::Config("TASKDECK_API_URL is not set".to_string()))?;
        if api_url.trim().is_empty() {
            return Err(ClientError::Config("TASKDECK_API_URL is empty".to_string()));
        }
        let state_path = env::var("TASKDECK_STATE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_STATE_PATH));

        Ok(Self { api_url, state_path })
    }
}
