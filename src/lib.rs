pub mod api_docs;
pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod routes;
pub mod services;

// Re-export commonly used items for easier use in tests
pub use api_docs::ApiDoc;
pub use auth::middleware::auth_middleware;
pub use db::{ensure_schema_exists, init_db};
pub use errors::ApiError;
pub use routes::app_router;
