//! Marker registry
//!
//! Owns every marker attached to the engine. Slots are generational so a
//! stale [`MarkerId`] never aliases a newer marker, and the handle index makes
//! reverse lookups from pick results O(1).

use ahash::AHashMap;

use ms_core::{Geometry, LogicalMarker, MarkerHandle, MarkerStyling};
use ms_render::MapEngine;

/// Registry key for an attached marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarkerId {
    index: u32,
    generation: u32,
}

#[derive(Debug, Default)]
struct Slot {
    generation: u32,
    marker: Option<LogicalMarker>,
}

/// Registry of attached markers
#[derive(Debug, Default)]
pub struct MarkerRegistry {
    slots: Vec<Slot>,
    free: Vec<u32>,
    by_handle: AHashMap<MarkerHandle, MarkerId>,
}

impl MarkerRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach `marker`: request a handle and push its full state
    pub fn add(&mut self, engine: &mut dyn MapEngine, mut marker: LogicalMarker) -> MarkerId {
        let handle = engine.marker_add();
        push_marker(engine, handle, &marker);
        marker.bind_handle(handle);

        let id = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.marker = Some(marker);
                MarkerId {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot {
                    generation: 0,
                    marker: Some(marker),
                });
                MarkerId { index, generation: 0 }
            }
        };

        self.by_handle.insert(handle, id);
        tracing::trace!("Attached {} as {:?}", handle, id);
        id
    }

    /// Detach a marker and hand it back.
    ///
    /// Unknown or stale ids are a no-op.
    pub fn remove(&mut self, engine: &mut dyn MapEngine, id: MarkerId) -> Option<LogicalMarker> {
        let mut marker = self.take(id)?;
        if let Some(handle) = marker.unbind_handle() {
            self.by_handle.remove(&handle);
            if !engine.marker_remove(handle) {
                tracing::warn!("Engine did not know {}", handle);
            }
        }
        Some(marker)
    }

    /// Mutate an attached marker and push the result to the engine.
    ///
    /// The handle belongs to the registry; any rebinding done by `f` is undone.
    pub fn update<F>(&mut self, engine: &mut dyn MapEngine, id: MarkerId, f: F) -> bool
    where
        F: FnOnce(&mut LogicalMarker),
    {
        let Some(marker) = self.get_mut(id) else {
            tracing::debug!("Ignoring update of unknown marker {:?}", id);
            return false;
        };
        let handle = marker.handle();
        f(marker);
        if marker.handle() != handle {
            tracing::warn!("Discarding handle change on {:?}", id);
            match handle {
                Some(handle) => marker.bind_handle(handle),
                None => {
                    marker.unbind_handle();
                }
            }
        }
        if let Some(handle) = handle {
            push_marker(engine, handle, marker);
        }
        true
    }

    pub fn get(&self, id: MarkerId) -> Option<&LogicalMarker> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.marker.as_ref())
    }

    pub fn contains(&self, id: MarkerId) -> bool {
        self.get(id).is_some()
    }

    /// Reverse lookup from an engine handle
    pub fn find_by_handle(&self, handle: MarkerHandle) -> Option<MarkerId> {
        self.by_handle.get(&handle).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (MarkerId, &LogicalMarker)> + '_ {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.marker.as_ref().map(|marker| {
                (
                    MarkerId {
                        index: index as u32,
                        generation: slot.generation,
                    },
                    marker,
                )
            })
        })
    }

    pub fn len(&self) -> usize {
        self.by_handle.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_handle.is_empty()
    }

    /// Forget every marker after the engine went away.
    ///
    /// No engine calls are made; the returned markers carry no handle.
    pub fn detach_all(&mut self) -> Vec<(MarkerId, LogicalMarker)> {
        let ids: Vec<MarkerId> = self.iter().map(|(id, _)| id).collect();
        let detached = ids
            .into_iter()
            .filter_map(|id| {
                let mut marker = self.take(id)?;
                marker.unbind_handle();
                Some((id, marker))
            })
            .collect();
        self.by_handle.clear();
        detached
    }

    fn get_mut(&mut self, id: MarkerId) -> Option<&mut LogicalMarker> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.marker.as_mut())
    }

    fn take(&mut self, id: MarkerId) -> Option<LogicalMarker> {
        let slot = self
            .slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)?;
        let marker = slot.marker.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        Some(marker)
    }
}

fn push_marker(engine: &mut dyn MapEngine, handle: MarkerHandle, marker: &LogicalMarker) {
    match marker.styling() {
        MarkerStyling::Description(description) => {
            engine.marker_set_styling_from_string(handle, &description);
        }
        MarkerStyling::Path(path) => {
            engine.marker_set_styling_from_path(handle, &path);
        }
    }

    match marker.geometry() {
        Geometry::Point(coordinate) => {
            engine.marker_set_point(handle, *coordinate);
        }
        Geometry::Polyline(coordinates) => {
            engine.marker_set_polyline(handle, coordinates);
        }
        Geometry::Polygon(rings) => {
            engine.marker_set_polygon(handle, rings);
        }
    }

    engine.marker_set_visible(handle, marker.paint().visible);
    engine.marker_set_draw_order(handle, marker.paint().draw_order);
}
