//! Search-result annotations

use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

use crate::geo::LngLat;

/// Unique identifier for an annotation
pub type AnnotationId = Uuid;

/// Action invoked when the annotation's marker is picked
#[derive(Clone)]
pub struct SelectAction(Arc<dyn Fn(&Annotation) + Send + Sync>);

impl SelectAction {
    pub fn new<F>(action: F) -> Self
    where
        F: Fn(&Annotation) + Send + Sync + 'static,
    {
        Self(Arc::new(action))
    }

    pub fn invoke(&self, annotation: &Annotation) {
        (self.0)(annotation);
    }
}

impl fmt::Debug for SelectAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SelectAction(..)")
    }
}

/// An immutable search result placed on the map.
///
/// Two annotations are equal when they share an id; clones keep the id.
#[derive(Debug, Clone)]
pub struct Annotation {
    id: AnnotationId,
    coordinate: LngLat,
    title: String,
    subtitle: Option<String>,
    metadata: Map<String, Value>,
    on_select: Option<SelectAction>,
}

impl Annotation {
    pub fn new(coordinate: LngLat, title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            coordinate,
            title: title.into(),
            subtitle: None,
            metadata: Map::new(),
            on_select: None,
        }
    }

    pub fn with_subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = Some(subtitle.into());
        self
    }

    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn on_select<F>(mut self, action: F) -> Self
    where
        F: Fn(&Annotation) + Send + Sync + 'static,
    {
        self.on_select = Some(SelectAction::new(action));
        self
    }

    pub fn id(&self) -> AnnotationId {
        self.id
    }

    pub fn coordinate(&self) -> LngLat {
        self.coordinate
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn subtitle(&self) -> Option<&str> {
        self.subtitle.as_deref()
    }

    pub fn metadata(&self) -> &Map<String, Value> {
        &self.metadata
    }

    pub fn select_action(&self) -> Option<&SelectAction> {
        self.on_select.as_ref()
    }
}

impl PartialEq for Annotation {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Annotation {}
