//! Current-location display and follow mode

use ms_core::{Geometry, LngLat, LogicalMarker, SystemStyle};
use ms_render::MapEngine;

use crate::registry::{MarkerId, MarkerRegistry};

/// Location state worth keeping across an engine teardown
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationState {
    pub enabled: bool,
    pub last_location: Option<LngLat>,
}

/// Current-location marker, follow mode and the find-me affordance
#[derive(Debug, Default)]
pub struct LocationDisplay {
    enabled: bool,
    following: bool,
    find_me_selected: bool,
    last_location: Option<LngLat>,
    marker: Option<MarkerId>,
}

impl LocationDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_following(&self) -> bool {
        self.following
    }

    pub fn find_me_selected(&self) -> bool {
        self.find_me_selected
    }

    pub fn last_location(&self) -> Option<LngLat> {
        self.last_location
    }

    pub fn marker(&self) -> Option<MarkerId> {
        self.marker
    }

    /// Show or hide the current-location marker
    pub fn show(&mut self, engine: &mut dyn MapEngine, registry: &mut MarkerRegistry, show: bool) {
        self.enabled = show;
        if !show {
            self.disengage_follow();
        }
        match (self.marker, self.last_location) {
            (Some(marker), _) => {
                registry.update(engine, marker, |m| m.set_visible(show));
            }
            (None, Some(location)) if show => self.attach(engine, registry, location),
            _ => {}
        }
    }

    /// Record a location fix, moving the marker and the camera when following
    pub fn update_location(&mut self, engine: &mut dyn MapEngine, registry: &mut MarkerRegistry, location: LngLat) {
        self.last_location = Some(location);
        if self.enabled {
            match self.marker {
                Some(marker) => {
                    registry.update(engine, marker, |m| m.set_geometry(Geometry::Point(location)));
                }
                None => self.attach(engine, registry, location),
            }
        }
        if self.following {
            center_on(engine, location);
        }
    }

    /// Select find-me: follow the user and center on the last fix.
    ///
    /// Returns whether a fix was available.
    pub fn find_me(&mut self, engine: &mut dyn MapEngine) -> bool {
        self.find_me_selected = true;
        self.following = true;
        match self.last_location {
            Some(location) => {
                center_on(engine, location);
                true
            }
            None => false,
        }
    }

    /// Leave follow mode and deselect find-me
    pub fn disengage_follow(&mut self) {
        if self.following || self.find_me_selected {
            tracing::debug!("Leaving follow mode");
        }
        self.following = false;
        self.find_me_selected = false;
    }

    /// Forget the marker after the engine went away
    pub fn detach(&mut self) -> LocationState {
        self.marker = None;
        self.following = false;
        self.find_me_selected = false;
        LocationState {
            enabled: self.enabled,
            last_location: self.last_location,
        }
    }

    /// Restore the marker on a fresh engine
    pub fn restore(&mut self, engine: &mut dyn MapEngine, registry: &mut MarkerRegistry, state: LocationState) {
        self.enabled = state.enabled;
        self.last_location = state.last_location;
        if let (true, Some(location)) = (state.enabled, state.last_location) {
            self.attach(engine, registry, location);
        }
    }

    fn attach(&mut self, engine: &mut dyn MapEngine, registry: &mut MarkerRegistry, location: LngLat) {
        let marker = LogicalMarker::system(Geometry::Point(location), SystemStyle::CurrentLocation);
        self.marker = Some(registry.add(engine, marker));
    }
}

fn center_on(engine: &mut dyn MapEngine, location: LngLat) {
    let mut pose = engine.camera_pose();
    pose.position = location;
    engine.set_camera_pose(&pose);
}
