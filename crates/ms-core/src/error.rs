//! Error types for map session operations

use thiserror::Error;

use crate::annotation::AnnotationId;

/// Errors surfaced to the host application
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MapError {
    #[error("API key not set")]
    ApiKeyNotSet,

    #[error("Annotation not found: {0}")]
    AnnotationNotFound(AnnotationId),

    #[error("No route is currently displayed")]
    RouteNotFound,

    #[error("Map engine is unavailable while the session is suspended")]
    EngineUnavailable,
}

/// Result alias used throughout the session layer
pub type MapResult<T> = Result<T, MapError>;
