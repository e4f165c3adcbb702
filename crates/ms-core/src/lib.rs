//! Core functionality for the map session layer
//!
//! This crate provides the domain types shared by the engine abstraction,
//! the collaborator payload parsers and the session state layer.

pub mod annotation;
pub mod camera;
pub mod config;
pub mod error;
pub mod events;
pub mod geo;
pub mod marker;
pub mod route;
pub mod scene;
pub mod style;

// Re-export commonly used types
pub use annotation::{Annotation, AnnotationId, SelectAction};
pub use camera::{CameraPose, CameraType};
pub use config::{apply_api_key, ApiKey, ApiKeyConsumer, Locale, SessionConfig};
pub use error::{MapError, MapResult};
pub use events::{Event, EventBus};
pub use geo::{LngLat, ScreenPoint};
pub use marker::{Geometry, LogicalMarker, MarkerHandle, MarkerKind, MarkerStyling, Paint, SystemStyle};
pub use route::{RouteLeg, RouteResult, RouteSummary};
pub use scene::{Overlay, SceneUpdate, SceneUpdateBuilder};
pub use style::{StyleCatalog, StyleId};
