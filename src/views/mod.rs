pub mod auth;
pub mod categories;
pub mod navigation;
pub mod profile;
pub mod tasks;

pub use auth::AuthService;
pub use categories::{CategoryForm, CategoryRegistry, CreateOutcome};
pub use navigation::{NavEntry, NavigationList};
pub use profile::{PasswordChange, ProfileView};
pub use tasks::{SubmitOutcome, TaskCollection, TaskEditor, TaskFilter};
