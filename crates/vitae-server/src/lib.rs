//! Vitae server: HTTP API for accounts, email confirmation and CV sections.

pub mod error;
pub mod extract;
pub mod flash;
pub mod forms;
pub mod mail;
pub mod routes;
pub mod state;
pub mod sweeper;

pub use routes::build_router;
pub use state::AppState;
