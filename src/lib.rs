pub mod api;
pub mod app;
pub mod collection;
pub mod config;
pub mod error;
pub mod models;
pub mod notify;
pub mod session;
pub mod signal;
pub mod views;

pub use app::AppContext;
pub use config::ClientConfig;
pub use error::ClientError;
