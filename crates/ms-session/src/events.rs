//! Events published on the session bus

use ms_core::events::Event;
use ms_core::{LogicalMarker, StyleId};

use crate::registry::MarkerId;

/// An asynchronous style load completed and matched a house style
#[derive(Debug, Clone)]
pub struct StyleLoaded {
    pub style: StyleId,
}

/// The engine was discarded and its state captured
#[derive(Debug, Clone)]
pub struct SessionSuspended {
    pub marker_count: usize,
    pub annotation_count: usize,
    pub has_route: bool,
}

/// A captured snapshot was replayed against a new engine
#[derive(Debug, Clone)]
pub struct SessionReplayed {
    pub style: StyleId,
    /// Generic markers standing in for the captured annotations. They are
    /// caller-owned: remove them with `MapSession::remove_marker`.
    pub restored_annotation_markers: Vec<MarkerId>,
    pub route_restored: bool,
    /// Caller-owned markers that were captured but not replayed
    pub released_markers: Vec<LogicalMarker>,
}

impl Event for StyleLoaded {}
impl Event for SessionSuspended {}
impl Event for SessionReplayed {}
