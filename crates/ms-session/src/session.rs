//! Map session facade
//!
//! `MapSession` owns the engine (or its absence while suspended) and every
//! piece of state layered on top of it. All mutation goes through `&mut self`
//! on the thread that drives the rendering surface.

use ahash::AHashSet;
use std::sync::Arc;

use ms_core::{
    Annotation, ApiKey, CameraPose, CameraType, EventBus, LngLat, Locale, LogicalMarker, MapError,
    MapResult, Overlay, RouteResult, SceneUpdate, ScreenPoint, SessionConfig, StyleCatalog, StyleId,
};
use ms_render::{EngineFactory, FeaturePickResult, LabelPickResult, MapEngine, MarkerPickResult};

use crate::annotations::{AnnotationIndex, PickTarget};
use crate::events::{SessionReplayed, SessionSuspended, StyleLoaded};
use crate::gestures::{Gesture, GestureDelegate, GestureDispatcher, GestureKind};
use crate::loader::StyleLoader;
use crate::location::LocationDisplay;
use crate::reclaimer::{Lifecycle, SessionStateReclaimer};
use crate::registry::{MarkerId, MarkerRegistry};
use crate::route::RouteDisplay;
use crate::selection::{MarkerSelection, SelectionDelegate, TileLoadDelegate};
use crate::snapshot::{CapturedMarker, SessionReplay, SessionSnapshot};

/// Callback run once an asynchronous style load completed
pub type LoadCallback = Box<dyn FnOnce(&mut MapSession, StyleId)>;

/// A map session bound to one rendering surface
pub struct MapSession {
    engine: Option<Box<dyn MapEngine>>,
    factory: Box<dyn EngineFactory>,
    loader: StyleLoader<LoadCallback>,
    markers: MarkerRegistry,
    annotations: AnnotationIndex,
    route: RouteDisplay,
    location: LocationDisplay,
    gestures: GestureDispatcher,
    selection_delegate: Option<Arc<dyn SelectionDelegate>>,
    tile_delegate: Option<Arc<dyn TileLoadDelegate>>,
    reclaimer: SessionStateReclaimer,
    events: Arc<EventBus>,
    visible: bool,
    api_key: Option<ApiKey>,
    locale: Locale,
    default_style: StyleId,
}

fn attached(engine: &mut Option<Box<dyn MapEngine>>) -> MapResult<&mut (dyn MapEngine + 'static)> {
    engine.as_deref_mut().ok_or(MapError::EngineUnavailable)
}

fn apply_update(engine: &mut dyn MapEngine, update: &SceneUpdate) {
    engine.queue_scene_update(&update.path, &update.value);
    engine.apply_scene_updates();
}

impl MapSession {
    /// Create a new session with a fresh engine from `factory`
    pub fn new<F>(config: SessionConfig, factory: F) -> Self
    where
        F: EngineFactory + 'static,
    {
        let engine = factory.create_engine();
        let api_key = config.api_key();
        let locale = config.locale();
        if api_key.is_none() {
            tracing::warn!("No API key configured, style loads will fail");
        }
        tracing::info!("Created map session (assets: {}, locale: {})", config.asset_root, locale);

        Self {
            engine: Some(engine),
            factory: Box::new(factory),
            loader: StyleLoader::new(StyleCatalog::new(config.asset_root)),
            markers: MarkerRegistry::new(),
            annotations: AnnotationIndex::new(),
            route: RouteDisplay::new(),
            location: LocationDisplay::new(),
            gestures: GestureDispatcher::new(),
            selection_delegate: None,
            tile_delegate: None,
            reclaimer: SessionStateReclaimer::new(),
            events: Arc::new(EventBus::new()),
            visible: true,
            api_key,
            locale,
            default_style: config.default_style,
        }
    }

    /// Event bus carrying style and lifecycle notifications
    pub fn events(&self) -> Arc<EventBus> {
        self.events.clone()
    }

    pub fn catalog(&self) -> &StyleCatalog {
        self.loader.catalog()
    }

    // Styles

    /// Load a style with the session locale
    pub fn load_style(&mut self, style: StyleId) -> MapResult<()> {
        let locale = self.locale.clone();
        self.load_style_with(style, &locale, &[])
    }

    /// Load a style with an explicit locale and extra scene updates
    pub fn load_style_with(&mut self, style: StyleId, locale: &Locale, updates: &[SceneUpdate]) -> MapResult<()> {
        let engine = attached(&mut self.engine)?;
        self.loader.load_sync(engine, style, self.api_key.as_ref(), locale, updates)
    }

    /// Start loading a style with the session locale
    pub fn load_style_async<F>(&mut self, style: StyleId, on_loaded: F) -> MapResult<()>
    where
        F: FnOnce(&mut MapSession, StyleId) + 'static,
    {
        let locale = self.locale.clone();
        self.load_style_async_with(style, &locale, &[], on_loaded)
    }

    /// Start loading a style; `on_loaded` runs from [`MapSession::on_scene_loaded`].
    ///
    /// A newer load before completion drops `on_loaded` without running it.
    pub fn load_style_async_with<F>(
        &mut self,
        style: StyleId,
        locale: &Locale,
        updates: &[SceneUpdate],
        on_loaded: F,
    ) -> MapResult<()>
    where
        F: FnOnce(&mut MapSession, StyleId) + 'static,
    {
        let engine = attached(&mut self.engine)?;
        self.loader
            .load_async(engine, style, self.api_key.as_ref(), locale, updates, Box::new(on_loaded))
    }

    /// Entry point for the engine's scene-loaded report
    pub fn on_scene_loaded(&mut self, resolved_path: &str) {
        let completion = self.loader.complete(resolved_path);

        if self.reclaimer.state() == Lifecycle::Reloading {
            self.reclaimer.finish();
        }

        if let Some(style) = completion.style {
            self.events.publish(StyleLoaded { style });
            if let Some(callback) = completion.callback {
                callback(self, style);
            }
        }
    }

    pub fn current_style(&self) -> Option<StyleId> {
        self.loader.current_style()
    }

    // Scene

    /// Toggle a house-style overlay
    pub fn set_overlay(&mut self, overlay: Overlay, enabled: bool) -> MapResult<()> {
        let engine = attached(&mut self.engine)?;
        apply_update(engine, &overlay.update(enabled));
        Ok(())
    }

    /// Change the session locale, updating the loaded scene's label language
    pub fn set_locale(&mut self, locale: Locale) {
        self.locale = locale;
        if self.loader.current_style().is_none() {
            return;
        }
        if let (Some(engine), Some(code)) = (self.engine.as_deref_mut(), self.locale.language_code()) {
            apply_update(engine, &SceneUpdate::language(&code));
        }
    }

    pub fn locale(&self) -> &Locale {
        &self.locale
    }

    /// Replace the API key, updating the loaded scene
    pub fn set_api_key(&mut self, key: ApiKey) {
        if self.loader.current_style().is_some() {
            if let Some(engine) = self.engine.as_deref_mut() {
                apply_update(engine, &SceneUpdate::api_key(&key));
            }
        }
        self.api_key = Some(key);
    }

    pub fn api_key(&self) -> Option<&ApiKey> {
        self.api_key.as_ref()
    }

    // Markers

    /// Attach a caller-owned marker
    pub fn add_marker(&mut self, marker: LogicalMarker) -> MapResult<MarkerId> {
        let engine = attached(&mut self.engine)?;
        Ok(self.markers.add(engine, marker))
    }

    /// Detach a caller-owned marker.
    ///
    /// Unknown ids, markers owned by annotations, the route or the location
    /// display, and calls while suspended are all no-ops.
    pub fn remove_marker(&mut self, id: MarkerId) -> Option<LogicalMarker> {
        if self.owned_by_session(id) {
            tracing::debug!("Refusing to remove session-owned marker {:?}", id);
            return None;
        }
        let engine = self.engine.as_deref_mut()?;
        self.markers.remove(engine, id)
    }

    /// Mutate a caller-owned marker and push its new styling
    pub fn update_marker<F>(&mut self, id: MarkerId, f: F) -> bool
    where
        F: FnOnce(&mut LogicalMarker),
    {
        if self.owned_by_session(id) {
            return false;
        }
        match self.engine.as_deref_mut() {
            Some(engine) => self.markers.update(engine, id, f),
            None => false,
        }
    }

    pub fn marker(&self, id: MarkerId) -> Option<&LogicalMarker> {
        self.markers.get(id)
    }

    /// Markers the host owns: everything but annotation, route and location markers
    pub fn markers(&self) -> impl Iterator<Item = (MarkerId, &LogicalMarker)> + '_ {
        self.markers.iter().filter(|(id, _)| !self.owned_by_session(*id))
    }

    /// Number of markers attached, including annotation, route and location markers
    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    fn owned_by_session(&self, id: MarkerId) -> bool {
        self.annotations.owns_marker(id) || self.route.marker() == Some(id) || self.location.marker() == Some(id)
    }

    // Annotations

    /// Show annotations as search pins
    pub fn add_annotations<I>(&mut self, annotations: I) -> MapResult<Vec<MarkerId>>
    where
        I: IntoIterator<Item = Annotation>,
    {
        let engine = attached(&mut self.engine)?;
        Ok(self.annotations.add(engine, &mut self.markers, annotations))
    }

    pub fn remove_annotation(&mut self, annotation: &Annotation) -> MapResult<()> {
        let engine = attached(&mut self.engine)?;
        self.annotations.remove(engine, &mut self.markers, annotation.id())?;
        Ok(())
    }

    pub fn remove_all_annotations(&mut self) -> MapResult<()> {
        let engine = attached(&mut self.engine)?;
        self.annotations.remove_all(engine, &mut self.markers)
    }

    /// Highlight or un-highlight an annotation's pin
    pub fn select_annotation(&mut self, annotation: &Annotation, active: bool) -> MapResult<()> {
        let engine = attached(&mut self.engine)?;
        self.annotations.set_active(engine, &mut self.markers, annotation.id(), active)
    }

    pub fn annotations(&self) -> impl Iterator<Item = &Annotation> + '_ {
        self.annotations.iter().map(|(annotation, _)| annotation)
    }

    pub fn annotation_count(&self) -> usize {
        self.annotations.len()
    }

    // Routes

    /// Draw a route, silently replacing any route already shown
    pub fn display_route(&mut self, route: &RouteResult) -> MapResult<()> {
        let engine = attached(&mut self.engine)?;
        self.route.display(engine, &mut self.markers, route);
        Ok(())
    }

    pub fn remove_route(&mut self) -> MapResult<RouteResult> {
        let engine = attached(&mut self.engine)?;
        self.route.remove(engine, &mut self.markers)
    }

    pub fn current_route(&self) -> Option<&RouteResult> {
        self.route.current()
    }

    // Camera

    pub fn camera_pose(&self) -> MapResult<CameraPose> {
        self.engine
            .as_deref()
            .map(|engine| engine.camera_pose())
            .ok_or(MapError::EngineUnavailable)
    }

    pub fn set_camera_pose(&mut self, pose: &CameraPose) -> MapResult<()> {
        attached(&mut self.engine)?.set_camera_pose(pose);
        Ok(())
    }

    fn update_camera(&mut self, f: impl FnOnce(&mut CameraPose)) -> MapResult<()> {
        let engine = attached(&mut self.engine)?;
        let mut pose = engine.camera_pose();
        f(&mut pose);
        engine.set_camera_pose(&pose);
        Ok(())
    }

    pub fn tilt(&self) -> MapResult<f32> {
        self.camera_pose().map(|pose| pose.tilt)
    }

    pub fn set_tilt(&mut self, tilt: f32) -> MapResult<()> {
        self.update_camera(|pose| pose.tilt = tilt)
    }

    pub fn rotation(&self) -> MapResult<f32> {
        self.camera_pose().map(|pose| pose.rotation)
    }

    pub fn set_rotation(&mut self, rotation: f32) -> MapResult<()> {
        self.update_camera(|pose| pose.rotation = rotation)
    }

    pub fn zoom(&self) -> MapResult<f32> {
        self.camera_pose().map(|pose| pose.zoom)
    }

    pub fn set_zoom(&mut self, zoom: f32) -> MapResult<()> {
        self.update_camera(|pose| pose.zoom = zoom)
    }

    pub fn position(&self) -> MapResult<LngLat> {
        self.camera_pose().map(|pose| pose.position)
    }

    pub fn set_position(&mut self, position: LngLat) -> MapResult<()> {
        self.update_camera(|pose| pose.position = position)
    }

    pub fn camera_type(&self) -> MapResult<CameraType> {
        self.camera_pose().map(|pose| pose.camera_type)
    }

    pub fn set_camera_type(&mut self, camera_type: CameraType) -> MapResult<()> {
        self.update_camera(|pose| pose.camera_type = camera_type)
    }

    // Location

    pub fn show_current_location(&mut self, show: bool) -> MapResult<()> {
        let engine = attached(&mut self.engine)?;
        self.location.show(engine, &mut self.markers, show);
        Ok(())
    }

    /// Feed a location fix from the host's location service
    pub fn update_current_location(&mut self, location: LngLat) -> MapResult<()> {
        let engine = attached(&mut self.engine)?;
        self.location.update_location(engine, &mut self.markers, location);
        Ok(())
    }

    /// Select find-me; returns whether a location fix was available
    pub fn find_me(&mut self) -> MapResult<bool> {
        let engine = attached(&mut self.engine)?;
        Ok(self.location.find_me(engine))
    }

    pub fn is_following_location(&self) -> bool {
        self.location.is_following()
    }

    pub fn find_me_selected(&self) -> bool {
        self.location.find_me_selected()
    }

    // Gestures and picks

    pub fn set_gesture_delegate(&mut self, kind: GestureKind, delegate: Option<Arc<dyn GestureDelegate>>) {
        self.gestures.set_delegate(kind, delegate);
    }

    pub fn set_selection_delegate(&mut self, delegate: Option<Arc<dyn SelectionDelegate>>) {
        self.selection_delegate = delegate;
    }

    pub fn set_tile_load_delegate(&mut self, delegate: Option<Arc<dyn TileLoadDelegate>>) {
        self.tile_delegate = delegate;
    }

    /// Entry point for the surface's should-recognize query
    pub fn should_recognize(&mut self, gesture: &Gesture) -> bool {
        let engine = self.engine.as_mut().map(|engine| &mut **engine as &mut dyn MapEngine);
        self.gestures.should_recognize(engine, &mut self.location, gesture)
    }

    /// Entry point for the surface's did-recognize notification
    pub fn did_recognize(&mut self, gesture: &Gesture) {
        self.gestures.did_recognize(&mut self.location, gesture);
    }

    /// Route a marker pick to the annotation's action or the selection delegate
    pub fn handle_marker_pick(&mut self, result: Option<MarkerPickResult>, position: ScreenPoint) {
        let Some(result) = result else {
            return;
        };

        match self.annotations.pick_target(&self.markers, result.handle) {
            PickTarget::Annotation(annotation) => match annotation.select_action() {
                Some(action) => action.invoke(&annotation),
                None => tracing::debug!("Annotation {} has no select action", annotation.id()),
            },
            PickTarget::Marker(id) => {
                if let (Some(delegate), Some(marker)) = (&self.selection_delegate, self.markers.get(id)) {
                    let selection = MarkerSelection {
                        id,
                        marker: marker.clone(),
                        coordinate: result.coordinate,
                    };
                    delegate.did_select_marker(&selection, position);
                }
            }
            PickTarget::Unknown => tracing::debug!("Picked unknown {}", result.handle),
        }
    }

    pub fn handle_label_pick(&mut self, result: Option<LabelPickResult>, position: ScreenPoint) {
        if let (Some(result), Some(delegate)) = (result, &self.selection_delegate) {
            delegate.did_select_label(&result.properties, result.coordinate, position);
        }
    }

    pub fn handle_feature_pick(&mut self, result: Option<FeaturePickResult>, position: ScreenPoint) {
        if let (Some(result), Some(delegate)) = (result, &self.selection_delegate) {
            delegate.did_select_feature(&result.properties, position);
        }
    }

    /// Entry point for the engine's view-complete report
    pub fn handle_view_complete(&mut self) {
        if let Some(delegate) = &self.tile_delegate {
            delegate.did_complete_loading();
        }
    }

    // Lifecycle

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.reclaimer.state()
    }

    /// Snapshot held while suspended
    pub fn snapshot(&self) -> Option<&SessionSnapshot> {
        self.reclaimer.snapshot()
    }

    /// Tear the engine down if the surface is off-screen.
    ///
    /// Returns whether the session was suspended.
    pub fn handle_memory_warning(&mut self) -> bool {
        if !self.reclaimer.should_suspend(self.visible) {
            tracing::debug!(
                "Ignoring memory warning (visible: {}, state: {:?})",
                self.visible,
                self.reclaimer.state()
            );
            return false;
        }
        let Some(mut engine) = self.engine.take() else {
            return false;
        };

        let camera = engine.camera_pose();
        let annotations: Vec<CapturedMarker> = self
            .annotations
            .iter()
            .filter_map(|(_, id)| self.markers.get(id))
            .map(CapturedMarker::of)
            .collect();

        let mut owned: AHashSet<MarkerId> = self.annotations.iter().map(|(_, id)| id).collect();
        owned.extend(self.route.marker());
        owned.extend(self.location.marker());

        self.annotations.clear();
        let route = self.route.detach();
        let location = self.location.detach();
        let markers: Vec<LogicalMarker> = self
            .markers
            .detach_all()
            .into_iter()
            .filter(|(id, _)| !owned.contains(id))
            .map(|(_, marker)| marker)
            .collect();

        if self.loader.reset() {
            tracing::debug!("Dropped pending load callback at suspend");
        }
        engine.marker_remove_all();
        drop(engine);

        let snapshot = SessionSnapshot::new(SessionReplay {
            camera,
            style: self.loader.current_style(),
            markers,
            annotations,
            route,
            location,
        });

        tracing::info!(
            "Suspended session: {} markers, {} annotations, route: {}",
            snapshot.markers().len(),
            snapshot.annotations().len(),
            snapshot.route().is_some()
        );
        self.events.publish(SessionSuspended {
            marker_count: snapshot.markers().len(),
            annotation_count: snapshot.annotations().len(),
            has_route: snapshot.route().is_some(),
        });
        self.reclaimer.suspend(snapshot);
        true
    }

    /// The surface is about to appear; rebuild the engine if suspended.
    ///
    /// Returns whether a rebuild was started.
    pub fn handle_will_appear(&mut self) -> bool {
        self.visible = true;
        let Some(snapshot) = self.reclaimer.begin_reload() else {
            return false;
        };

        self.engine = Some(self.factory.create_engine());
        let style = snapshot.style().unwrap_or(self.default_style);
        tracing::info!("Rebuilding engine with style {}", style);

        let result = self.load_style_async(style, move |session, loaded| session.replay(snapshot, loaded));
        if let Err(err) = result {
            tracing::error!("Failed to reload style {}: {}", style, err);
            self.reclaimer.finish();
        }
        true
    }

    fn replay(&mut self, snapshot: SessionSnapshot, style: StyleId) {
        let replay = snapshot.into_replay();
        let Some(engine) = self.engine.as_deref_mut() else {
            tracing::warn!("No engine to replay onto");
            return;
        };

        engine.set_camera_pose(&replay.camera);

        let mut restored_annotation_markers = Vec::with_capacity(replay.annotations.len());
        for captured in replay.annotations {
            let marker = LogicalMarker::raw(captured.geometry, captured.styling);
            restored_annotation_markers.push(self.markers.add(engine, marker));
        }

        let route_restored = match &replay.route {
            Some(route) => {
                self.route.display(engine, &mut self.markers, route);
                true
            }
            None => false,
        };

        self.location.restore(engine, &mut self.markers, replay.location);

        tracing::info!(
            "Replayed session: {} annotations, route: {}, {} markers released",
            restored_annotation_markers.len(),
            route_restored,
            replay.markers.len()
        );
        self.events.publish(SessionReplayed {
            style,
            restored_annotation_markers,
            route_restored,
            released_markers: replay.markers,
        });
    }
}
