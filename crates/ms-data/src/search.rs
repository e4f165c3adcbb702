//! Search collaborator payloads
//!
//! Responses are GeoJSON feature collections: `features[].geometry.coordinates`
//! holds `[lon, lat]`, `properties.name` the title and `properties.label` the
//! full display label.

use indexmap::IndexMap;
use serde_json::Value;

use ms_core::{Annotation, ApiKey, ApiKeyConsumer, LngLat};

use crate::{DataError, DataResult};

/// Query parameter carrying the API key
pub const API_KEY_PARAM: &str = "api_key";

/// A search query
#[derive(Debug, Clone, Default)]
pub struct SearchRequest {
    text: String,
    focus: Option<LngLat>,
    size: Option<u32>,
    params: IndexMap<String, String>,
}

impl SearchRequest {
    /// Create a new free-text search
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    /// Prefer results near `point`
    pub fn with_focus(mut self, point: LngLat) -> Self {
        self.focus = Some(point);
        self
    }

    /// Limit the number of results
    pub fn with_size(mut self, size: u32) -> Self {
        self.size = Some(size);
        self
    }

    /// Set an extra query parameter, replacing any previous value
    pub fn set_param(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.params.insert(name.into(), value.into());
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// Query string pairs in a stable order
    pub fn query_params(&self) -> Vec<(String, String)> {
        let mut query = vec![("text".to_string(), self.text.clone())];
        if let Some(focus) = self.focus {
            query.push(("focus.point.lat".to_string(), focus.latitude.to_string()));
            query.push(("focus.point.lon".to_string(), focus.longitude.to_string()));
        }
        if let Some(size) = self.size {
            query.push(("size".to_string(), size.to_string()));
        }
        query.extend(self.params.iter().map(|(k, v)| (k.clone(), v.clone())));
        query
    }
}

impl ApiKeyConsumer for SearchRequest {
    fn apply_api_key(&mut self, key: &ApiKey) {
        self.set_param(API_KEY_PARAM, key.as_str());
    }
}

/// Parse a search response into annotations, preserving result order
pub fn parse_search_response(body: &str) -> DataResult<Vec<Annotation>> {
    let value: Value = serde_json::from_str(body)?;
    let features = value
        .get("features")
        .and_then(Value::as_array)
        .ok_or(DataError::MissingField("features"))?;

    let annotations = features.iter().map(parse_feature).collect::<DataResult<Vec<_>>>()?;
    tracing::debug!("Parsed {} search results", annotations.len());
    Ok(annotations)
}

fn parse_feature(feature: &Value) -> DataResult<Annotation> {
    let coordinates = feature
        .pointer("/geometry/coordinates")
        .and_then(Value::as_array)
        .ok_or(DataError::MissingField("geometry.coordinates"))?;

    let coordinate = match (
        coordinates.first().and_then(Value::as_f64),
        coordinates.get(1).and_then(Value::as_f64),
    ) {
        (Some(lon), Some(lat)) => LngLat::new(lon, lat),
        _ => return Err(DataError::InvalidCoordinate(Value::from(coordinates.clone()).to_string())),
    };
    if !coordinate.is_valid() {
        return Err(DataError::InvalidCoordinate(format!(
            "[{}, {}]",
            coordinate.longitude, coordinate.latitude
        )));
    }

    let properties = feature
        .get("properties")
        .and_then(Value::as_object)
        .ok_or(DataError::MissingField("properties"))?;
    let title = properties
        .get("name")
        .and_then(Value::as_str)
        .ok_or(DataError::MissingField("properties.name"))?;

    let mut annotation = Annotation::new(coordinate, title).with_metadata(properties.clone());
    if let Some(label) = properties.get("label").and_then(Value::as_str) {
        annotation = annotation.with_subtitle(label);
    }
    Ok(annotation)
}
