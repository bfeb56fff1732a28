use std::sync::{Arc, Mutex, PoisonError};

use chrono::NaiveDate;
use tracing::{error, info};

use crate::api::TaskdeckApi;
use crate::app::AppContext;
use crate::collection::{Collection, LoadOutcome};
use crate::error::ClientError;
use crate::models::{Category, FieldErrors, Task, TaskDraft, TaskRow};
use crate::session::Session;

/// The editor modal: which task is being written and what went wrong.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskEditor {
    pub open: bool,
    pub draft: TaskDraft,
    pub errors: FieldErrors,
    pub alert: Option<String>,
}

impl TaskEditor {
    pub fn new_task() -> Self {
        Self {
            open: true,
            ..Self::default()
        }
    }

    pub fn edit(task: &Task) -> Self {
        Self {
            open: true,
            draft: TaskDraft::from(task),
            ..Self::default()
        }
    }

    pub fn close(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Created,
    Updated,
}

/// Which query the collection currently reflects; reloads repeat it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskFilter {
    Category,
    DeadlineBetween(NaiveDate, NaiveDate),
}

/// Tasks of one category for the signed-in user.
pub struct TaskCollection {
    api: TaskdeckApi,
    session: Arc<Session>,
    category_id: i64,
    category_name: String,
    tasks: Collection<Task>,
    filter: Mutex<TaskFilter>,
}

impl TaskCollection {
    pub fn new(ctx: &AppContext, category: &Category) -> Self {
        Self {
            api: ctx.api.clone(),
            session: ctx.session.clone(),
            category_id: category.id,
            category_name: category.name.clone(),
            tasks: Collection::new(),
            filter: Mutex::new(TaskFilter::Category),
        }
    }

    pub fn category_id(&self) -> i64 {
        self.category_id
    }

    pub fn category_name(&self) -> &str {
        &self.category_name
    }

    pub fn tasks(&self) -> Vec<Task> {
        self.tasks.snapshot()
    }

    pub fn rows(&self) -> Vec<TaskRow> {
        self.tasks.snapshot().into_iter().map(TaskRow::from).collect()
    }

    pub fn filter(&self) -> TaskFilter {
        *self.filter.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub async fn load(&self) -> Result<LoadOutcome, ClientError> {
        let identity = self.session.require_identity()?;
        self.set_filter(TaskFilter::Category);
        self.tasks
            .load(self.api.list_tasks(self.category_id, identity.id))
            .await
            .inspect_err(|e| error!("Failed to fetch tasks: {}", e))
    }

    /// Re-queries by deadline window. Each call supersedes any earlier one
    /// still in flight.
    pub async fn load_by_date_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<LoadOutcome, ClientError> {
        let identity = self.session.require_identity()?;
        self.set_filter(TaskFilter::DeadlineBetween(start, end));
        self.tasks
            .load(self.api.list_tasks_by_date(start, end, identity.id))
            .await
            .inspect_err(|e| error!("Failed to fetch tasks by date: {}", e))
    }

    /// Repeats whichever query the collection currently shows.
    pub async fn reload(&self) -> Result<LoadOutcome, ClientError> {
        match self.filter() {
            TaskFilter::Category => self.load().await,
            TaskFilter::DeadlineBetween(start, end) => self.load_by_date_range(start, end).await,
        }
    }

    /// Validates the editor's draft, then creates or updates the task.
    ///
    /// Validation failures are written to `editor.errors` and nothing is sent.
    /// A failed call keeps the editor open with `editor.alert` set; a
    /// successful one reloads the collection and closes the editor.
    pub async fn submit(&self, editor: &mut TaskEditor) -> Result<SubmitOutcome, ClientError> {
        let identity = self.session.require_identity()?;

        // A date-range load may hold tasks of other categories.
        let mut siblings = self.tasks.snapshot();
        siblings.retain(|t| t.category_id == Some(self.category_id));
        let mut request = match editor.draft.validate(&siblings) {
            Ok(request) => request,
            Err(errors) => {
                editor.alert = errors.iter().next().map(|e| e.message.clone());
                editor.errors = errors.clone();
                return Err(ClientError::Validation(errors));
            }
        };
        editor.errors = FieldErrors::new();
        request.category_id = Some(self.category_id);

        let result = match request.id {
            Some(task_id) => self
                .api
                .update_task(task_id, &request)
                .await
                .map(|_| SubmitOutcome::Updated),
            None => {
                request.user_id = Some(identity.id);
                self.api
                    .create_task(&request)
                    .await
                    .map(|_| SubmitOutcome::Created)
            }
        };

        match result {
            Ok(outcome) => {
                info!("task {:?} saved ({:?})", request.title, outcome);
                editor.close();
                self.resync().await;
                Ok(outcome)
            }
            Err(e) => {
                error!("Failed to save task: {}", e);
                editor.alert = Some(e.user_message());
                Err(e)
            }
        }
    }

    pub async fn delete(&self, task_id: i64) -> Result<(), ClientError> {
        self.session.require_identity()?;
        self.tasks
            .mutate(
                move |items| items.retain(|t| t.id != task_id),
                self.api.delete_task(task_id),
                || self.resync(),
            )
            .await
    }

    fn set_filter(&self, filter: TaskFilter) {
        *self.filter.lock().unwrap_or_else(PoisonError::into_inner) = filter;
    }

    async fn resync(&self) {
        if let Err(e) = self.reload().await {
            error!("Failed to reload tasks: {}", e);
        }
    }
}
