//! HTTP surface: webhook ingestion, dashboard data and exports.

pub mod error;
pub mod export;
pub mod renderer;
pub mod routes;
pub mod state;

pub use routes::build_router;
pub use state::AppState;
