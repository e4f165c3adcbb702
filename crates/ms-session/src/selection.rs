//! Selection and tile-load delegates

use ms_core::{LngLat, LogicalMarker, ScreenPoint};
use ms_render::FeatureProperties;

use crate::registry::MarkerId;

/// A plain marker hit by a pick
#[derive(Debug, Clone)]
pub struct MarkerSelection {
    pub id: MarkerId,
    pub marker: LogicalMarker,
    pub coordinate: LngLat,
}

/// Receives pick results that no annotation claimed.
///
/// Every method defaults to doing nothing, so implementers only provide
/// what they care about.
pub trait SelectionDelegate: Send + Sync {
    fn did_select_feature(&self, _properties: &FeatureProperties, _position: ScreenPoint) {}

    fn did_select_label(&self, _properties: &FeatureProperties, _coordinate: LngLat, _position: ScreenPoint) {}

    fn did_select_marker(&self, _selection: &MarkerSelection, _position: ScreenPoint) {}
}

/// Notified when the visible tiles finished loading
pub trait TileLoadDelegate: Send + Sync {
    fn did_complete_loading(&self);
}
