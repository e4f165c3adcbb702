use serde::{Deserialize, Serialize};

use crate::geo::LngLat;

/// One leg of a route, between two consecutive locations
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RouteLeg {
    pub coordinates: Vec<LngLat>,
}

/// Totals reported by the routing service
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RouteSummary {
    pub length_km: f64,
    pub time_seconds: f64,
}

/// A route produced by the routing collaborator
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RouteResult {
    pub legs: Vec<RouteLeg>,
    #[serde(default)]
    pub summary: Option<RouteSummary>,
}

impl RouteResult {
    pub fn new(legs: Vec<RouteLeg>) -> Self {
        Self { legs, summary: None }
    }

    /// The leg drawn on the map
    pub fn first_leg(&self) -> Option<&RouteLeg> {
        self.legs.first()
    }
}
