pub mod config;
pub mod errors;
pub mod logging;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

// Re-export AppState for convenience in the binary and integration tests.
pub use state::AppState;
