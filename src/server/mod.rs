pub mod bootstrap;
pub mod config;
mod dto;
mod error;
pub mod logging;
pub mod routes;
mod stream;

pub use bootstrap::run_server;
pub use error::ApiError;
pub use routes::{build_router, AppState};
