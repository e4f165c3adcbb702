//! Scene updates sent alongside style loads

use serde::{Deserialize, Serialize};

use crate::config::{ApiKey, Locale};
use crate::error::{MapError, MapResult};

/// Scene path holding the API key (value is single-quoted)
pub const API_KEY_PATH: &str = "global.sdk_mapzen_api_key";

/// Scene path holding the label language (value is the bare language code)
pub const LANGUAGE_PATH: &str = "global.ux_language";

/// A single path-keyed scene mutation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneUpdate {
    pub path: String,
    pub value: String,
}

impl SceneUpdate {
    pub fn new(path: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            value: value.into(),
        }
    }

    pub fn api_key(key: &ApiKey) -> Self {
        Self::new(API_KEY_PATH, format!("'{}'", key.as_str()))
    }

    pub fn language(code: &str) -> Self {
        Self::new(LANGUAGE_PATH, code)
    }

    fn is_reserved(&self) -> bool {
        self.path == API_KEY_PATH || self.path == LANGUAGE_PATH
    }
}

/// Optional house-style layers toggled through global scene values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Overlay {
    Transit,
    Bike,
    Walking,
}

impl Overlay {
    pub fn scene_path(self) -> &'static str {
        match self {
            Overlay::Transit => "global.sdk_transit_overlay",
            Overlay::Bike => "global.sdk_bike_overlay",
            Overlay::Walking => "global.sdk_path_overlay",
        }
    }

    pub fn update(self, enabled: bool) -> SceneUpdate {
        SceneUpdate::new(self.scene_path(), enabled.to_string())
    }
}

/// Composes the ordered update list sent with every style load
pub struct SceneUpdateBuilder;

impl SceneUpdateBuilder {
    /// Caller updates, then the API key, then the language (when it resolves).
    ///
    /// Caller updates for the reserved key/language paths are dropped so the
    /// result carries exactly one key update and the language stays last.
    pub fn build(
        caller_updates: &[SceneUpdate],
        api_key: Option<&ApiKey>,
        locale: &Locale,
    ) -> MapResult<Vec<SceneUpdate>> {
        let api_key = api_key.ok_or(MapError::ApiKeyNotSet)?;

        let mut updates: Vec<SceneUpdate> = Vec::with_capacity(caller_updates.len() + 2);
        for update in caller_updates {
            if update.is_reserved() {
                tracing::debug!("Dropping caller update for reserved path {}", update.path);
                continue;
            }
            updates.push(update.clone());
        }

        updates.push(SceneUpdate::api_key(api_key));

        match locale.language_code() {
            Some(code) => updates.push(SceneUpdate::language(&code)),
            None => tracing::debug!("Locale '{}' has no language code, skipping language update", locale),
        }

        Ok(updates)
    }
}
