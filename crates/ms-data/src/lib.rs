//! Search and routing collaborator payloads
//!
//! Request builders that carry the API key, and parsers turning raw service
//! responses into annotations and routes.

pub mod polyline;
pub mod routing;
pub mod search;

use thiserror::Error;

// Re-exports
pub use routing::{parse_route_response, Costing, RouteRequest};
pub use search::{parse_search_response, SearchRequest};

/// Errors that can occur while reading collaborator payloads
#[derive(Error, Debug)]
pub enum DataError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Missing field: {0}")]
    MissingField(&'static str),

    #[error("Invalid coordinate: {0}")]
    InvalidCoordinate(String),

    #[error("Invalid encoded polyline at byte {0}")]
    InvalidPolyline(usize),
}

pub type DataResult<T> = Result<T, DataError>;
