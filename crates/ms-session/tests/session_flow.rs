use approx::assert_relative_eq;
use parking_lot::Mutex;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use ms_core::{
    apply_api_key, Annotation, CameraPose, CameraType, Geometry, LngLat, LogicalMarker, MapError,
    MarkerKind, MarkerStyling, RouteLeg, RouteResult, ScreenPoint, SessionConfig, StyleCatalog, StyleId,
    SystemStyle,
};
use ms_data::{parse_search_response, SearchRequest};
use ms_render::headless::PickKind;
use ms_render::{FeaturePickResult, FeatureProperties, HeadlessEngine, HeadlessFactory, MarkerPickResult};
use ms_session::{
    Gesture, GestureDelegate, GestureKind, Lifecycle, MapSession, MarkerId, MarkerSelection, SelectionDelegate,
    SessionReplayed, SessionSuspended, StyleLoaded,
};

fn config() -> SessionConfig {
    SessionConfig {
        api_key: Some("integration-key".to_string()),
        locale: Some("en-US".to_string()),
        ..Default::default()
    }
}

fn session() -> (MapSession, HeadlessFactory) {
    let factory = HeadlessFactory::new();
    let session = MapSession::new(config(), factory.clone());
    (session, factory)
}

fn engine(factory: &HeadlessFactory) -> HeadlessEngine {
    factory.latest().expect("factory created an engine")
}

fn route() -> RouteResult {
    RouteResult::new(vec![RouteLeg {
        coordinates: vec![LngLat::new(2.29, 48.85), LngLat::new(2.30, 48.86), LngLat::new(2.33, 48.87)],
    }])
}

/// Suspend, rebuild and deliver the new engine's completion
fn suspend_and_rebuild(session: &mut MapSession, factory: &HeadlessFactory) {
    session.set_visible(false);
    assert!(session.handle_memory_warning());
    assert!(session.handle_will_appear());
    assert_eq!(session.lifecycle(), Lifecycle::Reloading);

    let path = engine(factory).complete_next_load().expect("reload was requested");
    session.on_scene_loaded(&path);
    assert_eq!(session.lifecycle(), Lifecycle::Live);
}

#[test]
fn test_bubble_wrap_load_ends_with_language_update() {
    let (mut session, factory) = session();
    session.load_style(StyleId::BubbleWrap).unwrap();

    let engine = engine(&factory);
    let path = engine.scene_path().unwrap();
    let mut segments = path.rsplit('/');
    let file = segments.next().unwrap().trim_end_matches(".yaml");
    let dir = segments.next().unwrap();
    assert_eq!(format!("{}/{}", dir, file), "bubble-wrap/bubble-wrap-style-more-labels");

    let updates = engine.load_updates();
    assert_eq!(updates.last().unwrap().path, "global.ux_language");
    assert_eq!(updates.last().unwrap().value, "en");
    assert_eq!(
        updates.iter().filter(|u| u.path == "global.sdk_mapzen_api_key").count(),
        1
    );
    assert_eq!(session.current_style(), Some(StyleId::BubbleWrap));
}

#[test]
fn test_load_without_key_fails() {
    let factory = HeadlessFactory::new();
    let mut session = MapSession::new(SessionConfig::default(), factory.clone());

    assert_eq!(session.load_style(StyleId::Zinc), Err(MapError::ApiKeyNotSet));
    assert_eq!(
        session.load_style_async(StyleId::Zinc, |_, _| {}),
        Err(MapError::ApiKeyNotSet)
    );
    assert_eq!(engine(&factory).scene_path(), None);
    assert_eq!(engine(&factory).pending_load_count(), 0);
}

#[test]
fn test_overlapping_async_loads_only_run_last_callback() {
    let (mut session, factory) = session();
    let fired = Rc::new(RefCell::new(Vec::new()));

    let first = fired.clone();
    session
        .load_style_async(StyleId::Walkabout, move |_, style| first.borrow_mut().push(("cb1", style)))
        .unwrap();
    let second = fired.clone();
    session
        .load_style_async(StyleId::Tron, move |_, style| second.borrow_mut().push(("cb2", style)))
        .unwrap();

    let engine = engine(&factory);
    let tron_path = engine.resolved_path(&session.catalog().scene_path(StyleId::Tron));
    session.on_scene_loaded(&tron_path);
    assert_eq!(*fired.borrow(), vec![("cb2", StyleId::Tron)]);

    let walkabout_path = engine.resolved_path(&session.catalog().scene_path(StyleId::Walkabout));
    session.on_scene_loaded(&walkabout_path);
    assert_eq!(fired.borrow().len(), 1);
    assert_eq!(session.current_style(), Some(StyleId::Walkabout));
}

#[test]
fn test_completion_publishes_style_loaded() {
    let (mut session, factory) = session();
    let loaded = Arc::new(Mutex::new(Vec::new()));
    let sink = loaded.clone();
    session
        .events()
        .subscribe::<StyleLoaded, _>(move |event| sink.lock().push(event.style));

    session.load_style_async(StyleId::Zinc, |_, _| {}).unwrap();
    let path = engine(&factory).complete_next_load().unwrap();
    session.on_scene_loaded(&path);
    session.on_scene_loaded("file:///somewhere/custom.yaml");

    assert_eq!(*loaded.lock(), vec![StyleId::Zinc]);
    assert_eq!(session.current_style(), Some(StyleId::Zinc));
}

#[test]
fn test_annotation_add_then_remove() {
    let (mut session, factory) = session();
    let annotation = Annotation::new(LngLat::new(40.0, 70.0), "x");

    session.add_annotations(vec![annotation.clone()]).unwrap();
    assert_eq!(session.annotation_count(), 1);
    assert_eq!(engine(&factory).marker_count(), 1);

    session.remove_annotation(&annotation).unwrap();
    assert_eq!(session.annotation_count(), 0);
    assert_eq!(engine(&factory).marker_count(), 0);
    assert_eq!(
        session.remove_annotation(&annotation),
        Err(MapError::AnnotationNotFound(annotation.id()))
    );
}

#[test]
fn test_remove_all_annotations() {
    let (mut session, _factory) = session();
    let a1 = Annotation::new(LngLat::new(1.0, 1.0), "a1");
    let a2 = Annotation::new(LngLat::new(2.0, 2.0), "a2");

    let markers = session.add_annotations(vec![a1, a2]).unwrap();
    assert_eq!(markers.len(), 2);
    assert!(markers.iter().all(|id| session.marker(*id).unwrap().is_attached()));

    session.remove_all_annotations().unwrap();
    assert_eq!(session.annotation_count(), 0);
    assert_eq!(session.marker_count(), 0);
}

#[test]
fn test_snapshot_replay_restores_camera_and_style() {
    let (mut session, factory) = session();
    session.load_style(StyleId::Cinnabar).unwrap();
    session
        .set_camera_pose(&CameraPose {
            tilt: 1.0,
            rotation: 2.0,
            zoom: 3.0,
            position: LngLat::new(1.0, 2.0),
            camera_type: CameraType::Flat,
        })
        .unwrap();

    suspend_and_rebuild(&mut session, &factory);

    assert_eq!(factory.instance_count(), 2);
    assert_relative_eq!(session.tilt().unwrap(), 1.0);
    assert_relative_eq!(session.rotation().unwrap(), 2.0);
    assert_relative_eq!(session.zoom().unwrap(), 3.0);
    assert_eq!(session.position().unwrap(), LngLat::new(1.0, 2.0));
    assert_eq!(session.camera_type().unwrap(), CameraType::Flat);
    assert_eq!(session.current_style(), Some(StyleId::Cinnabar));
}

#[test]
fn test_memory_warning_while_visible_is_ignored() {
    let (mut session, factory) = session();
    session.load_style(StyleId::Zinc).unwrap();
    session.add_marker(LogicalMarker::point(LngLat::default())).unwrap();

    assert!(!session.handle_memory_warning());
    assert_eq!(session.lifecycle(), Lifecycle::Live);
    assert_eq!(factory.instance_count(), 1);
    assert_eq!(engine(&factory).marker_count(), 1);
    assert!(!session.handle_will_appear());
}

#[test]
fn test_replay_rebuilds_annotations_route_and_location() {
    let (mut session, factory) = session();
    session.load_style(StyleId::Refill).unwrap();

    let annotation = Annotation::new(LngLat::new(13.4, 52.5), "Alexanderplatz");
    session.add_annotations(vec![annotation]).unwrap();
    session.display_route(&route()).unwrap();
    session.show_current_location(true).unwrap();
    session.update_current_location(LngLat::new(13.39, 52.51)).unwrap();
    let mut caller_marker = LogicalMarker::polygon(vec![vec![LngLat::new(0.0, 0.0), LngLat::new(1.0, 0.0)]]);
    caller_marker.set_color("#ff00ff");
    session.add_marker(caller_marker).unwrap();

    let suspended = Arc::new(Mutex::new(Vec::new()));
    let suspended_sink = suspended.clone();
    session.events().subscribe::<SessionSuspended, _>(move |event| {
        suspended_sink
            .lock()
            .push((event.marker_count, event.annotation_count, event.has_route))
    });
    let released = Arc::new(Mutex::new(Vec::new()));
    let released_sink = released.clone();
    session.events().subscribe::<SessionReplayed, _>(move |event| {
        assert_eq!(event.style, StyleId::Refill);
        assert_eq!(event.restored_annotation_markers.len(), 1);
        assert!(event.route_restored);
        released_sink.lock().extend(event.released_markers.iter().cloned());
    });

    session.set_visible(false);
    assert!(session.handle_memory_warning());
    assert_eq!(*suspended.lock(), vec![(1, 1, true)]);
    let snapshot = session.snapshot().unwrap();
    assert_eq!(snapshot.style(), Some(StyleId::Refill));
    assert_eq!(snapshot.annotations().len(), 1);
    assert_eq!(session.annotation_count(), 0);
    assert_eq!(session.marker_count(), 0);

    assert!(session.handle_will_appear());
    let fresh = engine(&factory);
    let path = fresh.complete_next_load().unwrap();
    session.on_scene_loaded(&path);

    // Annotation pin, route line and location gem; the caller marker is released
    assert_eq!(fresh.marker_count(), 3);
    assert_eq!(session.annotation_count(), 0);
    assert!(session.current_route().is_some());

    let stylings: Vec<_> = fresh.markers().into_iter().filter_map(|(_, m)| m.styling).collect();
    assert!(stylings.contains(&MarkerStyling::Path(
        SystemStyle::SearchPin { active: false }.styling_path().to_string()
    )));
    assert!(stylings.contains(&MarkerStyling::Path(SystemStyle::RouteLine.styling_path().to_string())));
    assert!(stylings.contains(&MarkerStyling::Path(
        SystemStyle::CurrentLocation.styling_path().to_string()
    )));

    let released = released.lock();
    assert_eq!(released.len(), 1);
    assert!(!released[0].is_attached());
    assert_eq!(released[0].paint().color, "#ff00ff");
    assert!(matches!(released[0].geometry(), Geometry::Polygon(_)));
}

#[test]
fn test_replayed_annotations_are_generic_markers() {
    let (mut session, factory) = session();
    session.load_style(StyleId::Zinc).unwrap();
    let annotation = Annotation::new(LngLat::new(5.0, 6.0), "pin");
    session.add_annotations(vec![annotation.clone()]).unwrap();

    suspend_and_rebuild(&mut session, &factory);

    // The pin comes back with its styling but outside the annotation index
    let markers = engine(&factory).markers();
    assert_eq!(markers.len(), 1);
    assert_eq!(
        markers[0].1.styling,
        Some(MarkerStyling::Path(
            SystemStyle::SearchPin { active: false }.styling_path().to_string()
        ))
    );
    assert_eq!(session.annotation_count(), 0);
    assert_eq!(
        session.remove_annotation(&annotation),
        Err(MapError::AnnotationNotFound(annotation.id()))
    );
}

#[test]
fn test_replayed_annotation_markers_can_be_removed() {
    let (mut session, factory) = session();
    session.load_style(StyleId::Zinc).unwrap();
    session
        .add_annotations(vec![Annotation::new(LngLat::new(5.0, 6.0), "old pin")])
        .unwrap();

    let restored: Arc<Mutex<Vec<MarkerId>>> = Arc::new(Mutex::new(Vec::new()));
    let loaded = Arc::new(AtomicUsize::new(0));
    let bus = session.events();
    let restored_sink = restored.clone();
    let loaded_sink = loaded.clone();
    session.events().subscribe::<SessionReplayed, _>(move |event| {
        restored_sink.lock().extend(event.restored_annotation_markers.iter().copied());
        // Subscribing from inside a handler must not block the bus
        let loaded_sink = loaded_sink.clone();
        bus.subscribe::<StyleLoaded, _>(move |_| {
            loaded_sink.fetch_add(1, Ordering::SeqCst);
        });
    });

    suspend_and_rebuild(&mut session, &factory);

    let restored = restored.lock().clone();
    assert_eq!(restored.len(), 1);
    assert!(session.markers().any(|(id, _)| id == restored[0]));

    session
        .add_annotations(vec![Annotation::new(LngLat::new(7.0, 8.0), "new pin")])
        .unwrap();
    session.remove_all_annotations().unwrap();
    assert_eq!(engine(&factory).marker_count(), 1);

    assert!(session.remove_marker(restored[0]).is_some());
    assert_eq!(engine(&factory).marker_count(), 0);
    assert_eq!(session.marker_count(), 0);

    session.load_style_async(StyleId::Tron, |_, _| {}).unwrap();
    let path = engine(&factory).complete_next_load().unwrap();
    session.on_scene_loaded(&path);
    assert_eq!(loaded.load(Ordering::SeqCst), 1);
}

#[test]
fn test_update_marker_keeps_registry_handle() {
    let (mut session, factory) = session();
    session.load_style(StyleId::Zinc).unwrap();
    let pins = session
        .add_annotations(vec![Annotation::new(LngLat::new(1.0, 1.0), "pin")])
        .unwrap();
    let pin_handle = session.marker(pins[0]).and_then(|m| m.handle()).unwrap();
    let first = session.add_marker(LogicalMarker::point(LngLat::default())).unwrap();
    let second = session.add_marker(LogicalMarker::point(LngLat::new(2.0, 2.0))).unwrap();

    assert!(session.update_marker(first, |m| {
        m.bind_handle(pin_handle);
        m.set_color("#ff0000");
    }));
    assert_eq!(
        engine(&factory).marker(pin_handle).unwrap().styling,
        Some(MarkerStyling::Path(
            SystemStyle::SearchPin { active: false }.styling_path().to_string()
        ))
    );

    session.update_marker(second, |m| {
        m.unbind_handle();
    });
    assert!(session.remove_marker(second).is_some());
    assert_eq!(session.marker_count(), 2);
    assert_eq!(engine(&factory).marker_count(), 2);
}

#[test]
fn test_reload_without_prior_style_uses_default() {
    let factory = HeadlessFactory::new();
    let mut session = MapSession::new(
        SessionConfig {
            default_style: StyleId::Tron,
            ..config()
        },
        factory.clone(),
    );

    session.set_visible(false);
    assert!(session.handle_memory_warning());
    assert!(session.snapshot().unwrap().style().is_none());
    assert!(session.handle_will_appear());

    let path = engine(&factory).complete_next_load().unwrap();
    assert_eq!(StyleCatalog::default().identify(&path), Some(StyleId::Tron));
    session.on_scene_loaded(&path);
    assert_eq!(session.current_style(), Some(StyleId::Tron));
}

#[test]
fn test_failed_reload_goes_live_without_replay() {
    let factory = HeadlessFactory::new();
    let mut session = MapSession::new(SessionConfig::default(), factory.clone());
    session
        .add_annotations(vec![Annotation::new(LngLat::new(1.0, 1.0), "a")])
        .unwrap();

    session.set_visible(false);
    assert!(session.handle_memory_warning());
    assert!(session.handle_will_appear());

    assert_eq!(session.lifecycle(), Lifecycle::Live);
    assert_eq!(engine(&factory).pending_load_count(), 0);
    assert_eq!(session.marker_count(), 0);
    assert!(session.snapshot().is_none());
}

#[test]
fn test_pending_callback_is_dropped_at_suspend() {
    let (mut session, factory) = session();
    let fired = Rc::new(RefCell::new(false));
    let flag = fired.clone();
    session
        .load_style_async(StyleId::Walkabout, move |_, _| *flag.borrow_mut() = true)
        .unwrap();

    session.set_visible(false);
    assert!(session.handle_memory_warning());
    assert!(session.handle_will_appear());
    let path = engine(&factory).complete_next_load().unwrap();
    session.on_scene_loaded(&path);

    assert!(!*fired.borrow());
    assert_eq!(session.lifecycle(), Lifecycle::Live);
}

#[test]
fn test_route_replacement_and_removal() {
    let (mut session, factory) = session();

    session.display_route(&route()).unwrap();
    session.display_route(&route()).unwrap();
    assert_eq!(engine(&factory).marker_count(), 1);

    assert!(session.remove_route().is_ok());
    assert_eq!(session.remove_route(), Err(MapError::RouteNotFound));
    assert_eq!(engine(&factory).marker_count(), 0);
}

#[derive(Default)]
struct RecordingSelection {
    markers: Mutex<Vec<LngLat>>,
    features: Mutex<Vec<FeatureProperties>>,
}

impl SelectionDelegate for RecordingSelection {
    fn did_select_feature(&self, properties: &FeatureProperties, _position: ScreenPoint) {
        self.features.lock().push(properties.clone());
    }

    fn did_select_marker(&self, selection: &MarkerSelection, _position: ScreenPoint) {
        self.markers.lock().push(selection.coordinate);
    }
}

#[test]
fn test_marker_pick_dispatch() {
    let (mut session, _factory) = session();
    let selection = Arc::new(RecordingSelection::default());
    session.set_selection_delegate(Some(selection.clone()));

    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();
    let with_action = Annotation::new(LngLat::new(1.0, 1.0), "with action").on_select(move |annotation| {
        assert_eq!(annotation.title(), "with action");
        counter.fetch_add(1, Ordering::SeqCst);
    });
    let without_action = Annotation::new(LngLat::new(2.0, 2.0), "without action");
    let pins = session.add_annotations(vec![with_action, without_action]).unwrap();
    let plain = session.add_marker(LogicalMarker::point(LngLat::new(3.0, 3.0))).unwrap();

    let position = ScreenPoint::new(10.0, 10.0);
    let pick = |id| MarkerPickResult {
        handle: session.marker(id).and_then(|m| m.handle()).unwrap(),
        coordinate: LngLat::new(9.0, 9.0),
    };
    let (first, second, third) = (pick(pins[0]), pick(pins[1]), pick(plain));

    session.handle_marker_pick(Some(first), position);
    session.handle_marker_pick(Some(second), position);
    session.handle_marker_pick(Some(third), position);
    session.handle_marker_pick(None, position);

    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert_eq!(*selection.markers.lock(), vec![LngLat::new(9.0, 9.0)]);

    let mut properties = FeatureProperties::new();
    properties.insert("kind".to_string(), "park".to_string());
    session.handle_feature_pick(Some(FeaturePickResult { properties }), position);
    assert_eq!(selection.features.lock()[0]["kind"], "park");
}

struct RejectAll;

impl GestureDelegate for RejectAll {
    fn should_recognize(&self, _gesture: &Gesture) -> bool {
        false
    }
}

#[test]
fn test_gestures_through_session() {
    let (mut session, factory) = session();
    session.set_gesture_delegate(GestureKind::Pan, Some(Arc::new(RejectAll)));

    session.update_current_location(LngLat::new(4.0, 4.0)).unwrap();
    assert!(session.find_me().unwrap());
    assert!(session.is_following_location());

    let pan = Gesture::Pan {
        start: ScreenPoint::new(0.0, 0.0),
        end: ScreenPoint::new(30.0, 5.0),
    };
    assert!(!session.should_recognize(&pan));
    assert!(!session.is_following_location());
    assert!(!session.find_me_selected());

    let tap = Gesture::SingleTap {
        position: ScreenPoint::new(50.0, 60.0),
    };
    assert!(session.should_recognize(&tap));
    let kinds: Vec<_> = engine(&factory).pick_requests().into_iter().map(|(kind, _)| kind).collect();
    assert_eq!(kinds, vec![PickKind::Label, PickKind::Marker, PickKind::Feature]);
}

#[test]
fn test_search_results_become_annotations() {
    let (mut session, factory) = session();

    let mut request = SearchRequest::new("pizza").with_size(2);
    let key = session.api_key().cloned().unwrap();
    apply_api_key(&key, &mut [&mut request]);
    assert_eq!(request.param("api_key"), Some("integration-key"));

    let body = r#"{"features": [
        {"geometry": {"coordinates": [-0.1276, 51.5072]}, "properties": {"name": "A", "label": "A, London"}},
        {"geometry": {"coordinates": [-0.1300, 51.5100]}, "properties": {"name": "B"}}
    ]}"#;
    let annotations = parse_search_response(body).unwrap();
    let markers = session.add_annotations(annotations).unwrap();

    assert_eq!(markers.len(), 2);
    assert_eq!(engine(&factory).marker_count(), 2);
    let first = session.marker(markers[0]).unwrap();
    assert_eq!(first.kind(), &MarkerKind::System(SystemStyle::SearchPin { active: false }));
    assert_eq!(session.annotations().next().unwrap().subtitle(), Some("A, London"));
}
