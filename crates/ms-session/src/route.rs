//! Route polyline display

use ms_core::{Geometry, LogicalMarker, MapError, MapResult, RouteResult, SystemStyle};
use ms_render::MapEngine;

use crate::registry::{MarkerId, MarkerRegistry};

/// Owns the single route line on the map
#[derive(Debug, Default)]
pub struct RouteDisplay {
    route: Option<RouteResult>,
    marker: Option<MarkerId>,
}

impl RouteDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draw the first leg of `route`, replacing any route already shown
    pub fn display(&mut self, engine: &mut dyn MapEngine, registry: &mut MarkerRegistry, route: &RouteResult) {
        let Some(leg) = route.first_leg() else {
            tracing::warn!("Ignoring route without legs");
            return;
        };

        if let Some(previous) = self.marker.take() {
            tracing::debug!("Replacing displayed route");
            registry.remove(engine, previous);
        }

        let marker = LogicalMarker::system(Geometry::Polyline(leg.coordinates.clone()), SystemStyle::RouteLine);
        self.marker = Some(registry.add(engine, marker));
        self.route = Some(route.clone());
    }

    /// Remove the displayed route
    pub fn remove(&mut self, engine: &mut dyn MapEngine, registry: &mut MarkerRegistry) -> MapResult<RouteResult> {
        let route = self.route.take().ok_or(MapError::RouteNotFound)?;
        if let Some(marker) = self.marker.take() {
            registry.remove(engine, marker);
        }
        Ok(route)
    }

    pub fn current(&self) -> Option<&RouteResult> {
        self.route.as_ref()
    }

    pub fn marker(&self) -> Option<MarkerId> {
        self.marker
    }

    /// Forget the marker after the engine went away, handing back the route
    pub fn detach(&mut self) -> Option<RouteResult> {
        self.marker = None;
        self.route.take()
    }
}
