//! HTTP API layer for vidtube.
//!
//! - **Endpoints**: the REST surface, one module per resource
//! - **Extractors**: authenticated-user extraction from request extensions
//! - **Middleware**: token authentication and shared application state
//!
//! Built on Axum 0.8 with a Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use endpoints::router;
pub use middleware::AppState;
