//! Logical markers and their styling
//!
//! A [`LogicalMarker`] is a plain value: a tagged geometry, a tagged style
//! kind and a set of paint attributes. The engine-side styling for any marker
//! is computed by the single pure function [`LogicalMarker::styling`].

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::geo::LngLat;

/// Opaque marker identifier issued by the rendering engine.
///
/// Only valid for the engine instance that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarkerHandle(pub u64);

impl fmt::Display for MarkerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "marker#{}", self.0)
    }
}

/// Marker geometry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Geometry {
    Point(LngLat),
    Polyline(Vec<LngLat>),
    /// Outer ring first, then holes
    Polygon(Vec<Vec<LngLat>>),
}

/// Styling as understood by the engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarkerStyling {
    /// Inline style description
    Description(String),
    /// Path to a draw rule inside the loaded scene
    Path(String),
}

/// House-style draw rules for markers the session creates itself
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SystemStyle {
    SearchPin { active: bool },
    RouteLine,
    RouteLocation,
    CurrentLocation,
}

impl SystemStyle {
    pub fn styling_path(self) -> &'static str {
        match self {
            SystemStyle::SearchPin { active: false } => "layers.mz_search_result.draw.ux-icons-overlay",
            SystemStyle::SearchPin { active: true } => "layers.mz_selected_search_result.draw.ux-icons-overlay",
            SystemStyle::RouteLine => "layers.mz_route_line.draw.ux-route-line-overlay",
            SystemStyle::RouteLocation => "layers.mz_route_location.draw.ux-icons-overlay",
            SystemStyle::CurrentLocation => "layers.mz_current_location_gem.draw.ux-location-gem-overlay",
        }
    }
}

/// How a marker's styling is derived
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MarkerKind {
    /// Computed from the paint attributes
    Painted,
    /// Fixed house-style draw rule
    System(SystemStyle),
    /// Styling captured verbatim from another marker
    Raw(MarkerStyling),
}

/// Paint attributes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paint {
    pub visible: bool,
    pub draw_order: i32,
    /// CSS-style color, e.g. `#06a6d4`
    pub color: String,
    pub stroke_width: f32,
    pub interactive: bool,
    /// Width and height in pixels (points only)
    pub size: [f32; 2],
}

impl Default for Paint {
    fn default() -> Self {
        Self {
            visible: true,
            draw_order: 1000,
            color: "#ffffff".to_string(),
            stroke_width: 4.0,
            interactive: true,
            size: [20.0, 20.0],
        }
    }
}

/// An application-level marker
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalMarker {
    geometry: Geometry,
    kind: MarkerKind,
    paint: Paint,
    handle: Option<MarkerHandle>,
}

impl LogicalMarker {
    pub fn new(geometry: Geometry, kind: MarkerKind) -> Self {
        Self {
            geometry,
            kind,
            paint: Paint::default(),
            handle: None,
        }
    }

    pub fn point(coordinate: LngLat) -> Self {
        Self::new(Geometry::Point(coordinate), MarkerKind::Painted)
    }

    pub fn polyline(coordinates: Vec<LngLat>) -> Self {
        Self::new(Geometry::Polyline(coordinates), MarkerKind::Painted)
    }

    pub fn polygon(rings: Vec<Vec<LngLat>>) -> Self {
        Self::new(Geometry::Polygon(rings), MarkerKind::Painted)
    }

    pub fn system(geometry: Geometry, style: SystemStyle) -> Self {
        Self::new(geometry, MarkerKind::System(style))
    }

    /// Generic marker carrying a styling taken from elsewhere
    pub fn raw(geometry: Geometry, styling: MarkerStyling) -> Self {
        Self::new(geometry, MarkerKind::Raw(styling))
    }

    pub fn with_paint(mut self, paint: Paint) -> Self {
        self.paint = paint;
        self
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn kind(&self) -> &MarkerKind {
        &self.kind
    }

    pub fn paint(&self) -> &Paint {
        &self.paint
    }

    /// Engine handle, present only while attached
    pub fn handle(&self) -> Option<MarkerHandle> {
        self.handle
    }

    pub fn is_attached(&self) -> bool {
        self.handle.is_some()
    }

    /// Record the handle issued on attach. Only the marker registry may call this.
    #[doc(hidden)]
    pub fn bind_handle(&mut self, handle: MarkerHandle) {
        self.handle = Some(handle);
    }

    /// Forget the handle on detach. Only the marker registry may call this.
    #[doc(hidden)]
    pub fn unbind_handle(&mut self) -> Option<MarkerHandle> {
        self.handle.take()
    }

    pub fn set_geometry(&mut self, geometry: Geometry) {
        self.geometry = geometry;
    }

    pub fn set_kind(&mut self, kind: MarkerKind) {
        self.kind = kind;
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.paint.visible = visible;
    }

    pub fn set_draw_order(&mut self, draw_order: i32) {
        self.paint.draw_order = draw_order;
    }

    pub fn set_color(&mut self, color: impl Into<String>) {
        self.paint.color = color.into();
    }

    pub fn set_stroke_width(&mut self, width: f32) {
        self.paint.stroke_width = width;
    }

    pub fn set_interactive(&mut self, interactive: bool) {
        self.paint.interactive = interactive;
    }

    pub fn set_size(&mut self, size: [f32; 2]) {
        self.paint.size = size;
    }

    /// Engine styling for the current geometry, kind and paint
    pub fn styling(&self) -> MarkerStyling {
        match &self.kind {
            MarkerKind::Raw(styling) => styling.clone(),
            MarkerKind::System(style) => MarkerStyling::Path(style.styling_path().to_string()),
            MarkerKind::Painted => MarkerStyling::Description(describe(&self.geometry, &self.paint)),
        }
    }
}

fn describe(geometry: &Geometry, paint: &Paint) -> String {
    match geometry {
        Geometry::Point(_) => format!(
            "{{ style: 'points', color: '{}', size: [{}px, {}px], order: {}, interactive: {}, collide: false }}",
            paint.color, paint.size[0], paint.size[1], paint.draw_order, paint.interactive
        ),
        Geometry::Polyline(_) => format!(
            "{{ style: 'lines', color: '{}', width: {}px, order: {}, interactive: {} }}",
            paint.color, paint.stroke_width, paint.draw_order, paint.interactive
        ),
        Geometry::Polygon(_) => format!(
            "{{ style: 'polygons', color: '{}', order: {}, interactive: {} }}",
            paint.color, paint.draw_order, paint.interactive
        ),
    }
}
