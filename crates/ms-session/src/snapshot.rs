//! Captured session state
//!
//! A snapshot is taken once when the engine is discarded and consumed once
//! when a new engine finished loading its style.

use ms_core::{CameraPose, Geometry, LogicalMarker, MarkerStyling, RouteResult, StyleId};

use crate::location::LocationState;

/// An engine-side marker reduced to what is needed to draw it again
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedMarker {
    pub geometry: Geometry,
    pub styling: MarkerStyling,
}

impl CapturedMarker {
    pub fn of(marker: &LogicalMarker) -> Self {
        Self {
            geometry: marker.geometry().clone(),
            styling: marker.styling(),
        }
    }
}

/// Everything a replay consumes
#[derive(Debug)]
pub struct SessionReplay {
    pub camera: CameraPose,
    pub style: Option<StyleId>,
    /// Caller-owned markers, detached
    pub markers: Vec<LogicalMarker>,
    pub annotations: Vec<CapturedMarker>,
    pub route: Option<RouteResult>,
    pub location: LocationState,
}

/// Immutable capture of a session taken at teardown
#[derive(Debug)]
pub struct SessionSnapshot {
    camera: CameraPose,
    style: Option<StyleId>,
    markers: Vec<LogicalMarker>,
    annotations: Vec<CapturedMarker>,
    route: Option<RouteResult>,
    location: LocationState,
}

impl SessionSnapshot {
    pub(crate) fn new(replay: SessionReplay) -> Self {
        Self {
            camera: replay.camera,
            style: replay.style,
            markers: replay.markers,
            annotations: replay.annotations,
            route: replay.route,
            location: replay.location,
        }
    }

    pub fn camera(&self) -> &CameraPose {
        &self.camera
    }

    pub fn style(&self) -> Option<StyleId> {
        self.style
    }

    pub fn markers(&self) -> &[LogicalMarker] {
        &self.markers
    }

    pub fn annotations(&self) -> &[CapturedMarker] {
        &self.annotations
    }

    pub fn route(&self) -> Option<&RouteResult> {
        self.route.as_ref()
    }

    pub fn location(&self) -> LocationState {
        self.location
    }

    /// Move the captured state out for replay
    pub fn into_replay(self) -> SessionReplay {
        SessionReplay {
            camera: self.camera,
            style: self.style,
            markers: self.markers,
            annotations: self.annotations,
            route: self.route,
            location: self.location,
        }
    }
}
