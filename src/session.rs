//! The signed-in identity, shared by every view.
//!
//! [`Session`] is the only reader and writer of the identity. Views get it
//! injected at construction and never touch the backing storage themselves.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError, RwLock};

use tracing::{debug, info};

use crate::error::ClientError;
use crate::models::Identity;

pub const KEY_USERNAME: &str = "username";
pub const KEY_USER_ID: &str = "userId";
pub const KEY_FIXED_SIDEBAR: &str = "fixedSidebar";

/// Durable key/value storage for session state.
pub trait SessionStorage: Send + Sync {
    fn load(&self) -> Result<BTreeMap<String, String>, ClientError>;
    fn save(&self, values: &BTreeMap<String, String>) -> Result<(), ClientError>;
}

/// Stores the session as a flat JSON object on disk.
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SessionStorage for FileStorage {
    fn load(&self) -> Result<BTreeMap<String, String>, ClientError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let raw = fs::read_to_string(&self.path)?;
        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        Ok(serde_json::from_str(&raw)?)
    }

    fn save(&self, values: &BTreeMap<String, String>) -> Result<(), ClientError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(values)?)?;
        debug!("session saved to {}", self.path.display());
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryStorage {
    values: Mutex<BTreeMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStorage for MemoryStorage {
    fn load(&self) -> Result<BTreeMap<String, String>, ClientError> {
        Ok(self.values.lock().unwrap_or_else(PoisonError::into_inner).clone())
    }

    fn save(&self, values: &BTreeMap<String, String>) -> Result<(), ClientError> {
        *self.values.lock().unwrap_or_else(PoisonError::into_inner) = values.clone();
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
struct SessionState {
    identity: Option<Identity>,
    fixed_sidebar: bool,
}

pub struct Session {
    storage: Box<dyn SessionStorage>,
    state: RwLock<SessionState>,
}

impl Session {
    /// Loads whatever a previous run left in `storage`. A half-written
    /// identity (username without a numeric id) is treated as signed out.
    pub fn restore(storage: impl SessionStorage + 'static) -> Result<Self, ClientError> {
        let values = storage.load()?;

        let identity = match (values.get(KEY_USERNAME), values.get(KEY_USER_ID)) {
            (Some(username), Some(id)) if !username.is_empty() => {
                id.parse::<i64>().ok().map(|id| Identity {
                    id,
                    username: username.clone(),
                })
            }
            _ => None,
        };
        let fixed_sidebar = values
            .get(KEY_FIXED_SIDEBAR)
            .map(|v| v == "true")
            .unwrap_or(false);

        Ok(Self {
            storage: Box::new(storage),
            state: RwLock::new(SessionState {
                identity,
                fixed_sidebar,
            }),
        })
    }

    pub fn in_memory() -> Self {
        Self {
            storage: Box::new(MemoryStorage::new()),
            state: RwLock::new(SessionState::default()),
        }
    }

    pub fn identity(&self) -> Option<Identity> {
        self.read().identity.clone()
    }

    pub fn require_identity(&self) -> Result<Identity, ClientError> {
        self.identity().ok_or(ClientError::NotAuthenticated)
    }

    pub fn is_authenticated(&self) -> bool {
        self.read().identity.is_some()
    }

    pub fn sign_in(&self, identity: Identity) -> Result<(), ClientError> {
        info!("signed in as {} (id {})", identity.username, identity.id);
        self.update(|state| state.identity = Some(identity))
    }

    /// Forgets the identity and the sidebar preference.
    pub fn sign_out(&self) -> Result<(), ClientError> {
        info!("signed out");
        self.update(|state| *state = SessionState::default())
    }

    /// Keeps the stored username in step with a profile edit.
    pub fn set_username(&self, username: &str) -> Result<(), ClientError> {
        self.update(|state| {
            if let Some(identity) = state.identity.as_mut() {
                identity.username = username.to_string();
            }
        })
    }

    pub fn fixed_sidebar(&self) -> bool {
        self.read().fixed_sidebar
    }

    pub fn set_fixed_sidebar(&self, fixed: bool) -> Result<(), ClientError> {
        self.update(|state| state.fixed_sidebar = fixed)
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, SessionState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn update(&self, apply: impl FnOnce(&mut SessionState)) -> Result<(), ClientError> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        apply(&mut state);
        self.storage.save(&to_values(&state))
    }
}

fn to_values(state: &SessionState) -> BTreeMap<String, String> {
    let mut values = BTreeMap::new();
    if let Some(identity) = &state.identity {
        values.insert(KEY_USERNAME.to_string(), identity.username.clone());
        values.insert(KEY_USER_ID.to_string(), identity.id.to_string());
    }
    if state.fixed_sidebar {
        values.insert(KEY_FIXED_SIDEBAR.to_string(), "true".to_string());
    }
    values
}
