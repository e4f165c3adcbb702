//! Gesture dispatch
//!
//! Each gesture kind has at most one delegate. Without a delegate every
//! gesture is accepted and recognitions go unobserved.

use ahash::AHashMap;
use std::sync::Arc;

use ms_core::ScreenPoint;
use ms_render::MapEngine;

use crate::location::LocationDisplay;

/// Gesture categories a delegate can be registered for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GestureKind {
    SingleTap,
    DoubleTap,
    LongPress,
    Pan,
    Pinch,
    Rotate,
    Shove,
}

/// A gesture reported by the rendering surface
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Gesture {
    SingleTap { position: ScreenPoint },
    DoubleTap { position: ScreenPoint },
    LongPress { position: ScreenPoint },
    Pan { start: ScreenPoint, end: ScreenPoint },
    Pinch { location: ScreenPoint, scale: f32 },
    Rotate { location: ScreenPoint, radians: f32 },
    Shove { displacement: f32 },
}

impl Gesture {
    pub fn kind(&self) -> GestureKind {
        match self {
            Gesture::SingleTap { .. } => GestureKind::SingleTap,
            Gesture::DoubleTap { .. } => GestureKind::DoubleTap,
            Gesture::LongPress { .. } => GestureKind::LongPress,
            Gesture::Pan { .. } => GestureKind::Pan,
            Gesture::Pinch { .. } => GestureKind::Pinch,
            Gesture::Rotate { .. } => GestureKind::Rotate,
            Gesture::Shove { .. } => GestureKind::Shove,
        }
    }
}

/// Trait for gesture delegates
pub trait GestureDelegate: Send + Sync {
    /// Whether the gesture should be recognized
    fn should_recognize(&self, _gesture: &Gesture) -> bool {
        true
    }

    /// Called once the gesture was recognized
    fn did_recognize(&self, _gesture: &Gesture) {}
}

/// Routes gesture queries and notifications to registered delegates
#[derive(Default)]
pub struct GestureDispatcher {
    delegates: AHashMap<GestureKind, Arc<dyn GestureDelegate>>,
}

impl GestureDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or clear the delegate for one gesture kind
    pub fn set_delegate(&mut self, kind: GestureKind, delegate: Option<Arc<dyn GestureDelegate>>) {
        match delegate {
            Some(delegate) => {
                self.delegates.insert(kind, delegate);
            }
            None => {
                self.delegates.remove(&kind);
            }
        }
    }

    pub fn has_delegate(&self, kind: GestureKind) -> bool {
        self.delegates.contains_key(&kind)
    }

    /// Ask whether `gesture` should be recognized.
    ///
    /// A pan always leaves follow mode, and a single tap always requests
    /// label, marker and feature picks at the tap position.
    pub fn should_recognize(
        &self,
        engine: Option<&mut dyn MapEngine>,
        location: &mut LocationDisplay,
        gesture: &Gesture,
    ) -> bool {
        match gesture {
            Gesture::Pan { .. } => location.disengage_follow(),
            Gesture::SingleTap { position } => {
                if let Some(engine) = engine {
                    engine.pick_label_at(*position);
                    engine.pick_marker_at(*position);
                    engine.pick_feature_at(*position);
                }
            }
            _ => {}
        }

        self.delegates
            .get(&gesture.kind())
            .map_or(true, |delegate| delegate.should_recognize(gesture))
    }

    /// Notify the delegate that `gesture` was recognized
    pub fn did_recognize(&self, location: &mut LocationDisplay, gesture: &Gesture) {
        if let Gesture::Pan { .. } = gesture {
            location.disengage_follow();
        }
        if let Some(delegate) = self.delegates.get(&gesture.kind()) {
            delegate.did_recognize(gesture);
        }
    }
}
