//! Map session state layer
//!
//! Sits between a host application and a map rendering engine: style loading,
//! marker and annotation registries, gesture dispatch, and the teardown and
//! rebuild of the engine under memory pressure.

pub mod annotations;
pub mod events;
pub mod gestures;
pub mod loader;
pub mod location;
pub mod reclaimer;
pub mod registry;
pub mod route;
pub mod selection;
pub mod session;
pub mod snapshot;

// Re-export commonly used types
pub use annotations::{AnnotationIndex, PickTarget};
pub use events::{SessionReplayed, SessionSuspended, StyleLoaded};
pub use gestures::{Gesture, GestureDelegate, GestureDispatcher, GestureKind};
pub use loader::{LoadCompletion, LoadState, StyleLoader};
pub use location::{LocationDisplay, LocationState};
pub use reclaimer::{Lifecycle, SessionStateReclaimer};
pub use registry::{MarkerId, MarkerRegistry};
pub use route::RouteDisplay;
pub use selection::{MarkerSelection, SelectionDelegate, TileLoadDelegate};
pub use session::{LoadCallback, MapSession};
pub use snapshot::{CapturedMarker, SessionReplay, SessionSnapshot};
