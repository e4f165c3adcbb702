//! Routing collaborator payloads
//!
//! Responses carry `trip.legs[].shape` as a precision-6 encoded polyline and
//! `trip.summary` with length in kilometres and time in seconds.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use ms_core::{ApiKey, ApiKeyConsumer, LngLat, RouteLeg, RouteResult, RouteSummary};

use crate::polyline::{self, ROUTE_PRECISION};
use crate::search::API_KEY_PARAM;
use crate::{DataError, DataResult};

/// Travel mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Costing {
    #[default]
    Auto,
    Bicycle,
    Pedestrian,
    Multimodal,
}

/// A route query between two or more locations
#[derive(Debug, Clone)]
pub struct RouteRequest {
    locations: Vec<LngLat>,
    costing: Costing,
    language: Option<String>,
    params: IndexMap<String, String>,
}

impl RouteRequest {
    pub fn new(locations: Vec<LngLat>) -> Self {
        Self {
            locations,
            costing: Costing::default(),
            language: None,
            params: IndexMap::new(),
        }
    }

    pub fn with_costing(mut self, costing: Costing) -> Self {
        self.costing = costing;
        self
    }

    /// Language for turn-by-turn narration
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn set_param(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.params.insert(name.into(), value.into());
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub fn locations(&self) -> &[LngLat] {
        &self.locations
    }

    /// JSON request body
    pub fn body(&self) -> Value {
        let locations: Vec<Value> = self
            .locations
            .iter()
            .map(|l| json!({ "lat": l.latitude, "lon": l.longitude }))
            .collect();

        let mut body = json!({
            "locations": locations,
            "costing": self.costing,
        });
        if let Some(language) = &self.language {
            body["directions_options"] = json!({ "language": language });
        }
        body
    }
}

impl ApiKeyConsumer for RouteRequest {
    fn apply_api_key(&mut self, key: &ApiKey) {
        self.set_param(API_KEY_PARAM, key.as_str());
    }
}

/// Parse a routing response
pub fn parse_route_response(body: &str) -> DataResult<RouteResult> {
    let value: Value = serde_json::from_str(body)?;
    let trip = value.get("trip").ok_or(DataError::MissingField("trip"))?;
    let legs = trip
        .get("legs")
        .and_then(Value::as_array)
        .ok_or(DataError::MissingField("trip.legs"))?;

    let legs = legs
        .iter()
        .map(|leg| {
            let shape = leg
                .get("shape")
                .and_then(Value::as_str)
                .ok_or(DataError::MissingField("trip.legs.shape"))?;
            Ok(RouteLeg {
                coordinates: polyline::decode(shape, ROUTE_PRECISION)?,
            })
        })
        .collect::<DataResult<Vec<_>>>()?;

    let summary = trip.get("summary").and_then(|summary| {
        Some(RouteSummary {
            length_km: summary.get("length")?.as_f64()?,
            time_seconds: summary.get("time")?.as_f64()?,
        })
    });

    tracing::debug!("Parsed route with {} legs", legs.len());
    Ok(RouteResult { legs, summary })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn response(shape: &str) -> String {
        json!({
            "trip": {
                "status": 0,
                "legs": [{ "shape": shape }],
                "summary": { "length": 2.417, "time": 412 }
            }
        })
        .to_string()
    }

    #[test]
    fn test_parse_route_response() {
        let path = vec![
            LngLat::new(-73.9857, 40.7484),
            LngLat::new(-73.9851, 40.7490),
            LngLat::new(-73.9772, 40.7527),
        ];
        let shape = polyline::encode(&path, ROUTE_PRECISION);

        let route = parse_route_response(&response(&shape)).unwrap();
        let leg = route.first_leg().unwrap();
        assert_eq!(leg.coordinates.len(), 3);
        assert_abs_diff_eq!(leg.coordinates[2].longitude, -73.9772, epsilon = 1e-9);

        let summary = route.summary.unwrap();
        assert_abs_diff_eq!(summary.length_km, 2.417);
        assert_abs_diff_eq!(summary.time_seconds, 412.0);
    }

    #[test]
    fn test_malformed_route_responses() {
        assert!(matches!(parse_route_response("{}"), Err(DataError::MissingField("trip"))));
        assert!(matches!(
            parse_route_response(r#"{"trip": {"legs": [{}]}}"#),
            Err(DataError::MissingField("trip.legs.shape"))
        ));
        assert!(matches!(
            parse_route_response(r#"{"trip": {"legs": [{"shape": "_p~iF~"}]}}"#),
            Err(DataError::InvalidPolyline(_))
        ));
        assert!(matches!(
            parse_route_response(&response(&"~~~~~~~~~~~~?".repeat(40))),
            Err(DataError::InvalidPolyline(_))
        ));
    }

    #[test]
    fn test_summary_is_optional() {
        let route = parse_route_response(r#"{"trip": {"legs": []}}"#).unwrap();
        assert!(route.legs.is_empty());
        assert!(route.summary.is_none());
    }

    #[test]
    fn test_request_body() {
        let mut request = RouteRequest::new(vec![LngLat::new(1.0, 2.0), LngLat::new(3.0, 4.0)])
            .with_costing(Costing::Pedestrian)
            .with_language("de");
        request.apply_api_key(&ApiKey::new("route-key").unwrap());

        let body = request.body();
        assert_eq!(body["costing"], "pedestrian");
        assert_eq!(body["locations"][1]["lat"], 4.0);
        assert_eq!(body["directions_options"]["language"], "de");
        assert_eq!(request.param(API_KEY_PARAM), Some("route-key"));
    }
}
