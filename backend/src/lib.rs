//! BioGraph query service: fusion orchestrator and HTTP surface.

pub mod errors;
pub mod handlers;
pub mod routes;
pub mod services;
pub mod state;

pub use errors::{QueryError, QueryResult};
pub use services::QueryOrchestrator;
pub use state::AppState;
