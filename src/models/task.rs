use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::datetime;
use super::validation::FieldErrors;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "LOW",
            Priority::Medium => "MEDIUM",
            Priority::High => "HIGH",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Priority::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown priority: {}", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 3] = [
        TaskStatus::Pending,
        TaskStatus::InProgress,
        TaskStatus::Completed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "PENDING",
            TaskStatus::InProgress => "IN_PROGRESS",
            TaskStatus::Completed => "COMPLETED",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().replace(['-', ' '], "_");
        TaskStatus::ALL
            .into_iter()
            .find(|st| st.as_str().eq_ignore_ascii_case(&normalized))
            .ok_or_else(|| format!("unknown status: {}", s))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: i64,
    #[serde(default)]
    pub category_id: Option<i64>,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub priority: Priority,
    pub status: TaskStatus,
    #[serde(default, with = "datetime::wire_option")]
    pub deadline: Option<NaiveDateTime>,
    #[serde(default, with = "datetime::wire_option")]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default, with = "datetime::wire_option")]
    pub updated_at: Option<NaiveDateTime>,
}

/// Editor contents for a new task (`id == None`) or an edit of an existing one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskDraft {
    pub id: Option<i64>,
    pub title: String,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub status: Option<TaskStatus>,
    pub deadline: Option<NaiveDateTime>,
}

impl From<&Task> for TaskDraft {
    fn from(task: &Task) -> Self {
        Self {
            id: Some(task.id),
            title: task.title.clone(),
            description: task.description.clone(),
            priority: Some(task.priority),
            status: Some(task.status),
            deadline: task.deadline,
        }
    }
}

impl TaskDraft {
    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }

    /// Checks the draft against the tasks currently loaded for its category.
    ///
    /// Every failing field is reported, in the order title, deadline,
    /// priority, status. The duplicate-title check only applies to new tasks.
    pub fn validate(&self, loaded: &[Task]) -> Result<TaskRequest, FieldErrors> {
        let mut errors = FieldErrors::new();
        let title = self.title.trim();

        if title.is_empty() {
            errors.push("title", "Title is required.");
        } else if self.is_new() && title_taken(title, loaded) {
            errors.push("title", "A task with this title already exists.");
        }
        if self.deadline.is_none() {
            errors.push("deadline", "Deadline is required.");
        }
        if self.priority.is_none() {
            errors.push("priority", "Priority is required.");
        }
        if self.status.is_none() {
            errors.push("status", "Status is required.");
        }

        match (self.deadline, self.priority, self.status) {
            (Some(deadline), Some(priority), Some(status)) if errors.is_empty() => Ok(TaskRequest {
                id: self.id,
                title: title.to_string(),
                description: self
                    .description
                    .as_ref()
                    .map(|d| d.trim().to_string())
                    .filter(|d| !d.is_empty()),
                priority,
                status,
                deadline,
                category_id: None,
                user_id: None,
            }),
            _ => Err(errors),
        }
    }
}

fn title_taken(title: &str, loaded: &[Task]) -> bool {
    let wanted = title.to_lowercase();
    loaded.iter().any(|t| t.title.trim().to_lowercase() == wanted)
}

/// Body of `POST /api/tasks` and `PUT /api/tasks/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub priority: Priority,
    pub status: TaskStatus,
    #[serde(with = "datetime::wire")]
    pub deadline: NaiveDateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
}

/// A task plus the presentation-only fields a grid shows.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskRow {
    pub task: Task,
    /// Whole days from the last update to the deadline; negative once past due.
    pub countdown_days: Option<i64>,
    pub created: String,
    pub updated: String,
    pub deadline: String,
    pub completed: bool,
    pub overdue: bool,
}

impl From<Task> for TaskRow {
    fn from(task: Task) -> Self {
        let countdown_days = match (task.deadline, task.updated_at) {
            (Some(deadline), Some(updated)) => Some((deadline - updated).num_days()),
            _ => None,
        };
        Self {
            countdown_days,
            created: datetime::format_display(task.created_at.as_ref()),
            updated: datetime::format_display(task.updated_at.as_ref()),
            deadline: datetime::format_display(task.deadline.as_ref()),
            completed: task.status == TaskStatus::Completed,
            overdue: countdown_days.is_some_and(|d| d < 0),
            task,
        }
    }
}
