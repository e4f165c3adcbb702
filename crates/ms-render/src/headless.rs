//! In-memory map engine
//!
//! `HeadlessEngine` keeps scene values, markers, pick requests and pending
//! asynchronous loads in memory. Clones share state, so a clone kept outside
//! the session lets tests inspect what the session pushed.

use ahash::AHashMap;
use parking_lot::Mutex;
use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

use ms_core::{CameraPose, Geometry, LngLat, MarkerHandle, MarkerStyling, SceneUpdate, ScreenPoint};

use crate::{EngineFactory, MapEngine};

/// Install root used when reporting resolved scene paths
pub const DEFAULT_RESOLVE_ROOT: &str = "/opt/mapsession/Resources";

/// Kind of pick requested from the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PickKind {
    Label,
    Marker,
    Feature,
}

/// Marker as stored by the headless engine
#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessMarker {
    pub styling: Option<MarkerStyling>,
    pub geometry: Option<Geometry>,
    pub visible: bool,
    pub draw_order: i32,
}

impl Default for HeadlessMarker {
    fn default() -> Self {
        Self {
            styling: None,
            geometry: None,
            visible: true,
            draw_order: 0,
        }
    }
}

#[derive(Debug, Clone)]
struct PendingLoad {
    path: String,
    updates: Vec<SceneUpdate>,
}

#[derive(Debug, Default)]
struct HeadlessState {
    scene_path: Option<String>,
    load_updates: Vec<SceneUpdate>,
    scene_values: BTreeMap<String, String>,
    queued: Vec<SceneUpdate>,
    pending_loads: VecDeque<PendingLoad>,
    markers: AHashMap<MarkerHandle, HeadlessMarker>,
    next_handle: u64,
    picks: Vec<(PickKind, ScreenPoint)>,
    camera: CameraPose,
    load_status: i32,
}

impl HeadlessState {
    fn load(&mut self, path: &str, updates: &[SceneUpdate]) {
        self.scene_path = Some(path.to_string());
        self.load_updates = updates.to_vec();
        self.scene_values.clear();
        for update in updates {
            self.scene_values.insert(update.path.clone(), update.value.clone());
        }
    }

    fn marker_mut(&mut self, handle: MarkerHandle) -> Option<&mut HeadlessMarker> {
        self.markers.get_mut(&handle)
    }
}

/// In-memory engine
#[derive(Clone)]
pub struct HeadlessEngine {
    resolve_root: String,
    state: Arc<Mutex<HeadlessState>>,
}

impl Default for HeadlessEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessEngine {
    /// Create a new headless engine
    pub fn new() -> Self {
        Self::with_resolve_root(DEFAULT_RESOLVE_ROOT)
    }

    /// Create an engine that reports resolved paths under `root`
    pub fn with_resolve_root(root: impl Into<String>) -> Self {
        Self {
            resolve_root: root.into().trim_end_matches('/').to_string(),
            state: Arc::new(Mutex::new(HeadlessState {
                next_handle: 1,
                ..Default::default()
            })),
        }
    }

    /// Status code returned by subsequent synchronous loads
    pub fn set_load_status(&self, status: i32) {
        self.state.lock().load_status = status;
    }

    /// Path of the currently loaded scene
    pub fn scene_path(&self) -> Option<String> {
        self.state.lock().scene_path.clone()
    }

    /// Updates that accompanied the last completed load
    pub fn load_updates(&self) -> Vec<SceneUpdate> {
        self.state.lock().load_updates.clone()
    }

    /// Current value of a scene path (last write wins)
    pub fn scene_value(&self, path: &str) -> Option<String> {
        self.state.lock().scene_values.get(path).cloned()
    }

    pub fn queued_update_count(&self) -> usize {
        self.state.lock().queued.len()
    }

    pub fn pending_load_count(&self) -> usize {
        self.state.lock().pending_loads.len()
    }

    /// Finish the oldest asynchronous load and return the resolved path the
    /// native engine would report for it
    pub fn complete_next_load(&self) -> Option<String> {
        let mut state = self.state.lock();
        let pending = state.pending_loads.pop_front()?;
        state.load(&pending.path, &pending.updates);
        Some(self.resolved_path(&pending.path))
    }

    /// Resolved `file://` URL for a requested scene path
    pub fn resolved_path(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("file://{}", path)
        } else {
            format!("file://{}/{}", self.resolve_root, path)
        }
    }

    pub fn marker_count(&self) -> usize {
        self.state.lock().markers.len()
    }

    pub fn marker(&self, handle: MarkerHandle) -> Option<HeadlessMarker> {
        self.state.lock().markers.get(&handle).cloned()
    }

    /// Every live marker, ordered by handle
    pub fn markers(&self) -> Vec<(MarkerHandle, HeadlessMarker)> {
        let state = self.state.lock();
        let mut markers: Vec<_> = state.markers.iter().map(|(h, m)| (*h, m.clone())).collect();
        markers.sort_by_key(|(handle, _)| *handle);
        markers
    }

    pub fn pick_requests(&self) -> Vec<(PickKind, ScreenPoint)> {
        self.state.lock().picks.clone()
    }
}

impl MapEngine for HeadlessEngine {
    fn load_scene_file(&mut self, path: &str, updates: &[SceneUpdate]) -> i32 {
        let mut state = self.state.lock();
        state.load(path, updates);
        state.load_status
    }

    fn load_scene_file_async(&mut self, path: &str, updates: &[SceneUpdate]) {
        self.state.lock().pending_loads.push_back(PendingLoad {
            path: path.to_string(),
            updates: updates.to_vec(),
        });
    }

    fn queue_scene_update(&mut self, path: &str, value: &str) {
        self.state.lock().queued.push(SceneUpdate::new(path, value));
    }

    fn apply_scene_updates(&mut self) {
        let mut state = self.state.lock();
        let queued = std::mem::take(&mut state.queued);
        for update in queued {
            state.scene_values.insert(update.path, update.value);
        }
    }

    fn marker_add(&mut self) -> MarkerHandle {
        let mut state = self.state.lock();
        let handle = MarkerHandle(state.next_handle);
        state.next_handle += 1;
        state.markers.insert(handle, HeadlessMarker::default());
        handle
    }

    fn marker_remove(&mut self, handle: MarkerHandle) -> bool {
        self.state.lock().markers.remove(&handle).is_some()
    }

    fn marker_remove_all(&mut self) {
        self.state.lock().markers.clear();
    }

    fn marker_set_styling_from_string(&mut self, handle: MarkerHandle, styling: &str) -> bool {
        let mut state = self.state.lock();
        match state.marker_mut(handle) {
            Some(marker) => {
                marker.styling = Some(MarkerStyling::Description(styling.to_string()));
                true
            }
            None => false,
        }
    }

    fn marker_set_styling_from_path(&mut self, handle: MarkerHandle, path: &str) -> bool {
        let mut state = self.state.lock();
        match state.marker_mut(handle) {
            Some(marker) => {
                marker.styling = Some(MarkerStyling::Path(path.to_string()));
                true
            }
            None => false,
        }
    }

    fn marker_set_point(&mut self, handle: MarkerHandle, coordinate: LngLat) -> bool {
        let mut state = self.state.lock();
        match state.marker_mut(handle) {
            Some(marker) => {
                marker.geometry = Some(Geometry::Point(coordinate));
                true
            }
            None => false,
        }
    }

    fn marker_set_polyline(&mut self, handle: MarkerHandle, coordinates: &[LngLat]) -> bool {
        let mut state = self.state.lock();
        match state.marker_mut(handle) {
            Some(marker) => {
                marker.geometry = Some(Geometry::Polyline(coordinates.to_vec()));
                true
            }
            None => false,
        }
    }

    fn marker_set_polygon(&mut self, handle: MarkerHandle, rings: &[Vec<LngLat>]) -> bool {
        let mut state = self.state.lock();
        match state.marker_mut(handle) {
            Some(marker) => {
                marker.geometry = Some(Geometry::Polygon(rings.to_vec()));
                true
            }
            None => false,
        }
    }

    fn marker_set_visible(&mut self, handle: MarkerHandle, visible: bool) -> bool {
        let mut state = self.state.lock();
        match state.marker_mut(handle) {
            Some(marker) => {
                marker.visible = visible;
                true
            }
            None => false,
        }
    }

    fn marker_set_draw_order(&mut self, handle: MarkerHandle, draw_order: i32) -> bool {
        let mut state = self.state.lock();
        match state.marker_mut(handle) {
            Some(marker) => {
                marker.draw_order = draw_order;
                true
            }
            None => false,
        }
    }

    fn pick_label_at(&mut self, position: ScreenPoint) {
        self.state.lock().picks.push((PickKind::Label, position));
    }

    fn pick_marker_at(&mut self, position: ScreenPoint) {
        self.state.lock().picks.push((PickKind::Marker, position));
    }

    fn pick_feature_at(&mut self, position: ScreenPoint) {
        self.state.lock().picks.push((PickKind::Feature, position));
    }

    fn camera_pose(&self) -> CameraPose {
        self.state.lock().camera
    }

    fn set_camera_pose(&mut self, pose: &CameraPose) {
        self.state.lock().camera = *pose;
    }
}

/// Factory producing headless engines and remembering every instance
#[derive(Clone)]
pub struct HeadlessFactory {
    resolve_root: String,
    instances: Arc<Mutex<Vec<HeadlessEngine>>>,
}

impl Default for HeadlessFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessFactory {
    pub fn new() -> Self {
        Self {
            resolve_root: DEFAULT_RESOLVE_ROOT.to_string(),
            instances: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Most recently created engine
    pub fn latest(&self) -> Option<HeadlessEngine> {
        self.instances.lock().last().cloned()
    }

    pub fn instance_count(&self) -> usize {
        self.instances.lock().len()
    }
}

impl EngineFactory for HeadlessFactory {
    fn create_engine(&self) -> Box<dyn MapEngine> {
        let engine = HeadlessEngine::with_resolve_root(self.resolve_root.clone());
        self.instances.lock().push(engine.clone());
        tracing::debug!("Created headless engine #{}", self.instances.lock().len());
        Box::new(engine)
    }
}
