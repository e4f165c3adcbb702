//! Search-result annotations attached as selectable markers

use ahash::AHashMap;
use indexmap::IndexMap;

use ms_core::{
    Annotation, AnnotationId, Geometry, LogicalMarker, MapError, MapResult, MarkerHandle,
    MarkerKind, SystemStyle,
};
use ms_render::MapEngine;

use crate::registry::{MarkerId, MarkerRegistry};

#[derive(Debug)]
struct Entry {
    annotation: Annotation,
    marker: MarkerId,
}

/// What a picked marker handle belongs to
#[derive(Debug, Clone, PartialEq)]
pub enum PickTarget {
    Annotation(Annotation),
    Marker(MarkerId),
    Unknown,
}

/// Index of annotations and the markers showing them, in insertion order
#[derive(Debug, Default)]
pub struct AnnotationIndex {
    entries: IndexMap<AnnotationId, Entry>,
    by_marker: AHashMap<MarkerId, AnnotationId>,
}

impl AnnotationIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach one inactive search pin per annotation.
    ///
    /// An annotation that is already indexed gets a fresh marker.
    pub fn add<I>(&mut self, engine: &mut dyn MapEngine, registry: &mut MarkerRegistry, annotations: I) -> Vec<MarkerId>
    where
        I: IntoIterator<Item = Annotation>,
    {
        let mut markers = Vec::new();
        for annotation in annotations {
            if let Some(previous) = self.entries.get(&annotation.id()).map(|e| e.marker) {
                tracing::debug!("Replacing marker of annotation {}", annotation.id());
                self.by_marker.remove(&previous);
                registry.remove(engine, previous);
            }

            let marker = LogicalMarker::system(
                Geometry::Point(annotation.coordinate()),
                SystemStyle::SearchPin { active: false },
            );
            let marker = registry.add(engine, marker);
            self.by_marker.insert(marker, annotation.id());
            self.entries.insert(annotation.id(), Entry { annotation, marker });
            markers.push(marker);
        }
        markers
    }

    /// Detach one annotation's marker
    pub fn remove(
        &mut self,
        engine: &mut dyn MapEngine,
        registry: &mut MarkerRegistry,
        id: AnnotationId,
    ) -> MapResult<Annotation> {
        let entry = self.entries.shift_remove(&id).ok_or(MapError::AnnotationNotFound(id))?;
        self.by_marker.remove(&entry.marker);
        registry.remove(engine, entry.marker);
        Ok(entry.annotation)
    }

    /// Detach every annotation in insertion order.
    ///
    /// Stops at the first entry whose marker is no longer registered and
    /// leaves that entry and every later one indexed.
    pub fn remove_all(&mut self, engine: &mut dyn MapEngine, registry: &mut MarkerRegistry) -> MapResult<()> {
        while let Some((id, marker)) = self.entries.first().map(|(id, e)| (*id, e.marker)) {
            if !registry.contains(marker) {
                tracing::warn!("Annotation {} lost its marker, {} entries left", id, self.entries.len());
                return Err(MapError::AnnotationNotFound(id));
            }
            self.remove(engine, registry, id)?;
        }
        Ok(())
    }

    /// Switch an annotation between the active and inactive pin styling
    pub fn set_active(
        &mut self,
        engine: &mut dyn MapEngine,
        registry: &mut MarkerRegistry,
        id: AnnotationId,
        active: bool,
    ) -> MapResult<()> {
        let entry = self.entries.get(&id).ok_or(MapError::AnnotationNotFound(id))?;
        registry.update(engine, entry.marker, |marker| {
            marker.set_kind(MarkerKind::System(SystemStyle::SearchPin { active }))
        });
        Ok(())
    }

    /// Resolve a picked handle
    pub fn pick_target(&self, registry: &MarkerRegistry, handle: MarkerHandle) -> PickTarget {
        match registry.find_by_handle(handle) {
            Some(marker) => match self.by_marker.get(&marker).and_then(|id| self.entries.get(id)) {
                Some(entry) => PickTarget::Annotation(entry.annotation.clone()),
                None => PickTarget::Marker(marker),
            },
            None => PickTarget::Unknown,
        }
    }

    pub fn get(&self, id: AnnotationId) -> Option<&Annotation> {
        self.entries.get(&id).map(|e| &e.annotation)
    }

    pub fn marker_for(&self, id: AnnotationId) -> Option<MarkerId> {
        self.entries.get(&id).map(|e| e.marker)
    }

    pub fn owns_marker(&self, marker: MarkerId) -> bool {
        self.by_marker.contains_key(&marker)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Annotation, MarkerId)> + '_ {
        self.entries.values().map(|e| (&e.annotation, e.marker))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Forget every entry without touching the engine
    pub fn clear(&mut self) {
        self.entries.clear();
        self.by_marker.clear();
    }
}
