pub mod admin;
pub mod db;
pub mod errors;
pub mod forms;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod templates;
pub mod urls;
pub mod utils;

// Re-export commonly used types
pub use errors::{TaxiError, TaxiResult, ValidationError};
pub use routes::build_router;
pub use state::{AppConfig, AppState};
