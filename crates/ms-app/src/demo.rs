//! Scripted session against the headless engine
//!
//! Loads a style, shows search results and a route, then walks the session
//! through a memory-pressure teardown and rebuild.

use anyhow::{Context, Result};
use serde_json::json;
use tracing::{info, warn};

use ms_core::{apply_api_key, ApiKey, ApiKeyConsumer, LngLat, MapError, Overlay, ScreenPoint, SessionConfig};
use ms_data::polyline::{self, ROUTE_PRECISION};
use ms_data::{parse_route_response, parse_search_response, Costing, RouteRequest, SearchRequest};
use ms_render::{HeadlessEngine, HeadlessFactory};
use ms_session::{Gesture, MapSession, SessionReplayed, SessionSuspended};

/// Key used when neither the config nor the environment supplies one
const DEMO_API_KEY: &str = "demo-headless-key";

const SEARCH_RESPONSE: &str = r#"{
    "type": "FeatureCollection",
    "features": [
        {
            "type": "Feature",
            "geometry": { "type": "Point", "coordinates": [-122.4194, 37.7749] },
            "properties": { "name": "Civic Center", "label": "Civic Center, San Francisco, CA, USA" }
        },
        {
            "type": "Feature",
            "geometry": { "type": "Point", "coordinates": [-122.4089, 37.7837] },
            "properties": { "name": "Union Square", "label": "Union Square, San Francisco, CA, USA" }
        }
    ]
}"#;

fn route_response() -> String {
    let shape = polyline::encode(
        &[
            LngLat::new(-122.4194, 37.7749),
            LngLat::new(-122.4140, 37.7790),
            LngLat::new(-122.4089, 37.7837),
        ],
        ROUTE_PRECISION,
    );
    json!({
        "trip": {
            "legs": [{ "shape": shape }],
            "summary": { "length": 1.31, "time": 960 }
        }
    })
    .to_string()
}

fn latest(factory: &HeadlessFactory) -> Result<HeadlessEngine> {
    factory.latest().context("No engine was created")
}

/// Run the scripted session
pub fn run(config: SessionConfig) -> Result<()> {
    let factory = HeadlessFactory::new();
    let style = config.default_style;
    let mut session = MapSession::new(config, factory.clone());

    session.events().subscribe::<SessionSuspended, _>(|event| {
        info!(
            "Suspended with {} caller markers, {} annotations",
            event.marker_count, event.annotation_count
        );
    });
    session.events().subscribe::<SessionReplayed, _>(|event| {
        info!(
            "Replayed {} with {} annotations, {} markers handed back",
            event.style,
            event.restored_annotation_markers.len(),
            event.released_markers.len()
        );
    });

    match session.load_style_async(style, |_, loaded| info!("Style {} ready", loaded)) {
        Err(MapError::ApiKeyNotSet) => {
            warn!("No API key configured, using the demo key");
            let key = ApiKey::new(DEMO_API_KEY).context("Demo key is blank")?;
            session.set_api_key(key);
            session.load_style_async(style, |_, loaded| info!("Style {} ready", loaded))?;
        }
        other => other?,
    }
    let path = latest(&factory)?.complete_next_load().context("No load pending")?;
    session.on_scene_loaded(&path);
    session.set_overlay(Overlay::Transit, true)?;

    let key = session.api_key().cloned().context("Session has no API key")?;
    let mut search = SearchRequest::new("plaza")
        .with_focus(LngLat::new(-122.41, 37.78))
        .with_size(10);
    let mut routing = RouteRequest::new(vec![LngLat::new(-122.4194, 37.7749), LngLat::new(-122.4089, 37.7837)])
        .with_costing(Costing::Pedestrian)
        .with_language(session.locale().language_code().unwrap_or_else(|| "en".to_string()));
    apply_api_key(&key, &mut [&mut search as &mut dyn ApiKeyConsumer, &mut routing]);
    info!("Search query: {:?}", search.query_params());
    info!("Route body: {}", routing.body());

    let annotations = parse_search_response(SEARCH_RESPONSE)?;
    for annotation in &annotations {
        info!("Result: {} ({:?})", annotation.title(), annotation.subtitle());
    }
    let first = annotations.first().cloned();
    session.add_annotations(annotations)?;
    if let Some(first) = &first {
        session.select_annotation(first, true)?;
    }

    let route = parse_route_response(&route_response())?;
    if let Some(summary) = route.summary {
        info!("Route: {:.2} km, {:.0} s", summary.length_km, summary.time_seconds);
    }
    session.display_route(&route)?;

    session.show_current_location(true)?;
    session.update_current_location(LngLat::new(-122.4180, 37.7755))?;
    session.find_me()?;
    let tap = Gesture::SingleTap {
        position: ScreenPoint::new(160.0, 240.0),
    };
    session.should_recognize(&tap);
    info!(
        "Live session: {} markers, {} pick requests",
        session.marker_count(),
        latest(&factory)?.pick_requests().len()
    );

    session.set_visible(false);
    if session.handle_memory_warning() {
        session.handle_will_appear();
        let path = latest(&factory)?.complete_next_load().context("No reload pending")?;
        session.on_scene_loaded(&path);
    }

    info!(
        "Session {:?}: style {:?}, {} markers on engine #{}",
        session.lifecycle(),
        session.current_style(),
        latest(&factory)?.marker_count(),
        factory.instance_count()
    );
    Ok(())
}
