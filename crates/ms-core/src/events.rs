//! Typed notification bus
//!
//! Subscribers are keyed by event type. Handlers run with the bus unlocked, so
//! a handler may subscribe or publish on the same bus.

use ahash::AHashMap;
use parking_lot::Mutex;
use std::any::{Any, TypeId};

/// Marker for values that can travel over an [`EventBus`]
pub trait Event: Any + Send + Sync {}

type Handler = Box<dyn FnMut(&dyn Any) + Send>;

/// Event bus for session notifications
#[derive(Default)]
pub struct EventBus {
    handlers: Mutex<AHashMap<TypeId, Vec<Handler>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe a closure to events of type `E`
    pub fn subscribe<E, F>(&self, mut f: F)
    where
        E: Event,
        F: FnMut(&E) + Send + 'static,
    {
        let handler: Handler = Box::new(move |event| {
            if let Some(event) = event.downcast_ref::<E>() {
                f(event);
            }
        });
        self.handlers.lock().entry(TypeId::of::<E>()).or_default().push(handler);
    }

    /// Number of handlers subscribed to `E`
    pub fn subscriber_count<E: Event>(&self) -> usize {
        self.handlers.lock().get(&TypeId::of::<E>()).map_or(0, Vec::len)
    }

    /// Deliver `event` to every handler subscribed to its type.
    ///
    /// While its handlers run they are checked out of the bus, so a nested
    /// publish of the same type only reaches handlers subscribed after this
    /// call started.
    pub fn publish<E: Event>(&self, event: E) {
        let type_id = TypeId::of::<E>();
        let Some(mut running) = self.handlers.lock().remove(&type_id) else {
            tracing::trace!("No subscribers for {}", std::any::type_name::<E>());
            return;
        };

        for handler in running.iter_mut() {
            handler(&event);
        }

        let mut handlers = self.handlers.lock();
        if let Some(added) = handlers.remove(&type_id) {
            running.extend(added);
        }
        handlers.insert(type_id, running);
    }
}
