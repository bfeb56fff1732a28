pub mod category;
pub mod datetime;
pub mod identity;
pub mod task;
pub mod validation;

pub use category::{Category, CategoryPayload};
pub use identity::{Identity, ProfileUpdate, UserProfile};
pub use task::{Priority, Task, TaskDraft, TaskRequest, TaskRow, TaskStatus};
pub use validation::{FieldError, FieldErrors};
