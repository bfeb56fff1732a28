use std::sync::Arc;

use tracing::{debug, error, info};

use crate::api::TaskdeckApi;
use crate::app::AppContext;
use crate::collection::{Collection, LoadOutcome};
use crate::error::ClientError;
use crate::models::Category;
use crate::session::Session;
use crate::signal::RefreshSubscription;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavEntry {
    pub id: i64,
    pub name: String,
    pub route: String,
}

impl From<&Category> for NavEntry {
    fn from(category: &Category) -> Self {
        Self {
            id: category.id,
            name: category.name.clone(),
            route: category.route(),
        }
    }
}

/// Sidebar list of categories. Reloads itself whenever another view
/// emits on the refresh signal.
pub struct NavigationList {
    api: TaskdeckApi,
    session: Arc<Session>,
    categories: Collection<Category>,
    subscription: RefreshSubscription,
}

impl NavigationList {
    pub fn mount(ctx: &AppContext) -> Self {
        Self {
            api: ctx.api.clone(),
            session: ctx.session.clone(),
            categories: Collection::new(),
            subscription: ctx.signal.subscribe(),
        }
    }

    pub fn entries(&self) -> Vec<NavEntry> {
        self.categories.snapshot().iter().map(NavEntry::from).collect()
    }

    pub fn find_by_route(&self, route: &str) -> Option<Category> {
        let route = route.to_lowercase();
        self.categories.find(|c| c.route() == route)
    }

    pub async fn load(&self) -> Result<LoadOutcome, ClientError> {
        let identity = self.session.require_identity()?;
        self.categories
            .load(self.api.list_categories(&identity.username))
            .await
            .inspect_err(|e| error!("Failed to fetch categories: {}", e))
    }

    /// Handles every refresh request already queued with a single reload.
    /// Returns how many requests were consumed.
    pub async fn pump(&mut self) -> Result<usize, ClientError> {
        let causes = self.subscription.drain();
        if causes.is_empty() {
            return Ok(0);
        }
        debug!("navigation refresh requested: {:?}", causes);
        self.load().await?;
        Ok(causes.len())
    }

    /// Reloads on each refresh request until the signal is dropped.
    pub async fn run(&mut self) {
        while let Some(cause) = self.subscription.recv().await {
            info!("reloading navigation ({})", cause);
            if let Err(e) = self.load().await {
                error!("navigation reload failed: {}", e);
            }
        }
        info!("refresh signal closed, navigation list stops listening");
    }
}
