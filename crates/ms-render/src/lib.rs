//! Rendering engine abstraction layer
//!
//! This crate describes what the session layer consumes from the native map
//! renderer, and ships an in-memory implementation used for tests and
//! headless runs.

pub mod headless;

use std::collections::BTreeMap;

use ms_core::{CameraPose, LngLat, MarkerHandle, SceneUpdate, ScreenPoint};

pub use headless::{HeadlessEngine, HeadlessFactory};

/// Feature or label properties reported by a pick
pub type FeatureProperties = BTreeMap<String, String>;

/// Trait for map rendering engines
///
/// Marker calls return `false` when the handle is unknown to the engine.
pub trait MapEngine {
    /// Load a scene synchronously, returning the engine status code (0 = ok)
    fn load_scene_file(&mut self, path: &str, updates: &[SceneUpdate]) -> i32;

    /// Start loading a scene; completion is reported later with the resolved path
    fn load_scene_file_async(&mut self, path: &str, updates: &[SceneUpdate]);

    /// Queue an update against the loaded scene
    fn queue_scene_update(&mut self, path: &str, value: &str);

    /// Apply every queued update at once
    fn apply_scene_updates(&mut self);

    /// Create an empty marker
    fn marker_add(&mut self) -> MarkerHandle;

    fn marker_remove(&mut self, handle: MarkerHandle) -> bool;

    /// Remove every marker issued by this engine
    fn marker_remove_all(&mut self);

    fn marker_set_styling_from_string(&mut self, handle: MarkerHandle, styling: &str) -> bool;

    fn marker_set_styling_from_path(&mut self, handle: MarkerHandle, path: &str) -> bool;

    fn marker_set_point(&mut self, handle: MarkerHandle, coordinate: LngLat) -> bool;

    fn marker_set_polyline(&mut self, handle: MarkerHandle, coordinates: &[LngLat]) -> bool;

    fn marker_set_polygon(&mut self, handle: MarkerHandle, rings: &[Vec<LngLat>]) -> bool;

    fn marker_set_visible(&mut self, handle: MarkerHandle, visible: bool) -> bool;

    fn marker_set_draw_order(&mut self, handle: MarkerHandle, draw_order: i32) -> bool;

    /// Request a label pick; the result is reported asynchronously
    fn pick_label_at(&mut self, position: ScreenPoint);

    /// Request a marker pick; the result is reported asynchronously
    fn pick_marker_at(&mut self, position: ScreenPoint);

    /// Request a feature pick; the result is reported asynchronously
    fn pick_feature_at(&mut self, position: ScreenPoint);

    fn camera_pose(&self) -> CameraPose;

    fn set_camera_pose(&mut self, pose: &CameraPose);
}

/// Creates fresh engine instances
pub trait EngineFactory {
    fn create_engine(&self) -> Box<dyn MapEngine>;
}

impl<F> EngineFactory for F
where
    F: Fn() -> Box<dyn MapEngine>,
{
    fn create_engine(&self) -> Box<dyn MapEngine> {
        self()
    }
}

/// A marker hit reported by the engine
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerPickResult {
    pub handle: MarkerHandle,
    pub coordinate: LngLat,
}

/// A label hit reported by the engine
#[derive(Debug, Clone, PartialEq)]
pub struct LabelPickResult {
    pub coordinate: LngLat,
    pub properties: FeatureProperties,
}

/// A feature hit reported by the engine
#[derive(Debug, Clone, PartialEq)]
pub struct FeaturePickResult {
    pub properties: FeatureProperties,
}
