use std::sync::Arc;

use tracing::{error, info};

use crate::api::TaskdeckApi;
use crate::app::AppContext;
use crate::collection::{Collection, LoadOutcome};
use crate::error::ClientError;
use crate::models::{Category, FieldErrors};
use crate::notify::{Notice, Notifier};
use crate::session::Session;
use crate::signal::{RefreshCause, RefreshSignal};

const NAME_REQUIRED: &str = "Category is required!";

/// State of the "new category" form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryForm {
    pub open: bool,
    pub input: String,
    pub error: Option<String>,
}

impl CategoryForm {
    pub fn opened() -> Self {
        Self {
            open: true,
            ..Self::default()
        }
    }

    pub fn with_input(input: impl Into<String>) -> Self {
        Self {
            open: true,
            input: input.into(),
            error: None,
        }
    }

    pub fn close(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    Created,
    /// The server reported the name as taken; the form stays open.
    Duplicate,
}

/// Dashboard list of the signed-in user's categories.
pub struct CategoryRegistry {
    api: TaskdeckApi,
    session: Arc<Session>,
    signal: RefreshSignal,
    notifier: Arc<dyn Notifier>,
    categories: Collection<Category>,
}

impl CategoryRegistry {
    pub fn new(ctx: &AppContext) -> Self {
        Self {
            api: ctx.api.clone(),
            session: ctx.session.clone(),
            signal: ctx.signal.clone(),
            notifier: ctx.notifier.clone(),
            categories: Collection::new(),
        }
    }

    pub fn categories(&self) -> Vec<Category> {
        self.categories.snapshot()
    }

    pub async fn load(&self) -> Result<LoadOutcome, ClientError> {
        let identity = self.session.require_identity()?;
        self.categories
            .load(self.api.list_categories(&identity.username))
            .await
            .inspect_err(|e| error!("Error fetching categories: {}", e))
    }

    pub async fn rename(&self, category_id: i64, new_name: &str) -> Result<(), ClientError> {
        let new_name = new_name.trim();
        if new_name.is_empty() {
            return Err(name_required());
        }
        let identity = self.session.require_identity()?;
        let local_name = new_name.to_string();

        let result = self
            .categories
            .mutate(
                move |items| {
                    if let Some(category) = items.iter_mut().find(|c| c.id == category_id) {
                        category.name = local_name;
                    }
                },
                self.api.rename_category(&identity.username, category_id, new_name),
                || self.resync(),
            )
            .await;

        self.signal_after(&result, RefreshCause::CategoryRenamed);
        result
    }

    pub async fn delete(&self, category_id: i64) -> Result<(), ClientError> {
        let identity = self.session.require_identity()?;

        let result = self
            .categories
            .mutate(
                move |items| items.retain(|c| c.id != category_id),
                self.api.delete_category(&identity.username, category_id),
                || self.resync(),
            )
            .await;

        self.signal_after(&result, RefreshCause::CategoryDeleted);
        result
    }

    /// Submits the creation form. A blank name never reaches the server.
    pub async fn create(&self, form: &mut CategoryForm) -> Result<CreateOutcome, ClientError> {
        let name = form.input.trim().to_string();
        if name.is_empty() {
            form.error = Some(NAME_REQUIRED.to_string());
            return Err(name_required());
        }
        let identity = self.session.require_identity()?;
        form.error = None;

        match self.api.create_category(&identity.username, &name).await {
            Ok(message) => {
                info!("category {:?} created", name);
                self.notifier.notify(Notice::success(message));
                form.close();
                self.signal.emit(RefreshCause::CategoryCreated);
                self.resync().await;
                Ok(CreateOutcome::Created)
            }
            Err(ClientError::Conflict(message)) => {
                self.notifier.notify(Notice::validation(message.clone()));
                form.error = Some(message);
                Ok(CreateOutcome::Duplicate)
            }
            Err(e) => {
                error!("Error posting category: {}", e);
                form.error = Some(e.user_message());
                self.notifier.notify(Notice::error(e.user_message()));
                Err(e)
            }
        }
    }

    async fn resync(&self) {
        if let Err(e) = self.load().await {
            error!("Failed to resync categories: {}", e);
        }
    }

    /// Dependents reload after every rename or delete, failed ones included,
    /// since the local list was just resynced from the server.
    fn signal_after(&self, result: &Result<(), ClientError>, cause: RefreshCause) {
        match result {
            Ok(()) => self.signal.emit(cause),
            Err(_) => self.signal.emit(RefreshCause::Resynced),
        }
    }
}

fn name_required() -> ClientError {
    let mut errors = FieldErrors::new();
    errors.push("category", NAME_REQUIRED);
    ClientError::Validation(errors)
}
