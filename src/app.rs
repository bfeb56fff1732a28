use std::sync::Arc;

use crate::api::{ApiGateway, HttpGateway, TaskdeckApi};
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::models::Category;
use crate::notify::Notifier;
use crate::session::{FileStorage, Session};
use crate::signal::RefreshSignal;
use crate::views::{AuthService, CategoryRegistry, NavigationList, ProfileView, TaskCollection};

/// Shared handles every view is built from.
#[derive(Clone)]
pub struct AppContext {
    pub api: TaskdeckApi,
    pub session: Arc<Session>,
    pub signal: RefreshSignal,
    pub notifier: Arc<dyn Notifier>,
}

impl AppContext {
    pub fn new(
        gateway: Arc<dyn ApiGateway>,
        session: Arc<Session>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            api: TaskdeckApi::new(gateway),
            session,
            signal: RefreshSignal::new(),
            notifier,
        }
    }

    pub fn from_config(config: &ClientConfig, notifier: Arc<dyn Notifier>) -> Result<Self, ClientError> {
        let gateway = Arc::new(HttpGateway::new(config)?);
        let session = Arc::new(Session::restore(FileStorage::new(&config.state_path))?);
        Ok(Self::new(gateway, session, notifier))
    }

    pub fn is_loading(&self) -> bool {
        self.api.is_pending()
    }

    pub fn auth(&self) -> AuthService {
        AuthService::new(self)
    }

    pub fn categories(&self) -> CategoryRegistry {
        CategoryRegistry::new(self)
    }

    /// Mounts a navigation list; it subscribes to the refresh signal here.
    pub fn navigation(&self) -> NavigationList {
        NavigationList::mount(self)
    }

    pub fn tasks(&self, category: &Category) -> TaskCollection {
        TaskCollection::new(self, category)
    }

    pub fn profile(&self) -> ProfileView {
        ProfileView::new(self)
    }
}
