//! BioGraph Observability Library
//!
//! Provides the logging and request tracing used by the API server and CLIs.
//!
//! # Features
//! - Pretty or structured JSON logging selected by environment
//! - Request ID propagation through the `x-request-id` header
//! - HTTP middleware for request/response logging with slow request detection

pub mod init;
pub mod middleware;

pub use init::*;
pub use middleware::*;

// Re-export tracing for convenience
pub use tracing::{debug, error, info, warn, trace, span, Level, Instrument};
pub use tracing::instrument;
