//! Publish/subscribe channel for registry lifecycle events
//!
//! A generic broadcast bus keyed by event name. The components cache fires
//! `"error"` events on failed refreshes; other registry subsystems reuse the
//! same bus for their own events. The emitter is injected at construction
//! rather than shared through global state so tests can observe it.

use std::collections::HashMap;
use std::sync::Mutex;

use serde_json::Value;

type Handler = Box<dyn Fn(&Value) -> anyhow::Result<()> + Send + Sync>;

/// Synchronous publish/subscribe event bus.
///
/// Handlers for a given event run in registration order. A failing handler
/// is logged and does not prevent later handlers from running.
#[derive(Default)]
pub struct EventEmitter {
    handlers: Mutex<HashMap<String, Vec<Handler>>>,
}

impl EventEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for an event name.
    pub fn on<F>(&self, event: &str, handler: F)
    where
        F: Fn(&Value) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let mut handlers = self.handlers.lock().unwrap_or_else(|e| e.into_inner());
        handlers
            .entry(event.to_string())
            .or_default()
            .push(Box::new(handler));
    }

    /// Fire an event, invoking every registered handler synchronously.
    ///
    /// Handlers must not fire events on the same emitter; the subscriber
    /// list is locked for the duration of the dispatch.
    pub fn fire(&self, event: &str, payload: Value) {
        let handlers = self.handlers.lock().unwrap_or_else(|e| e.into_inner());
        let Some(subscribers) = handlers.get(event) else {
            return;
        };
        for handler in subscribers {
            if let Err(err) = handler(&payload) {
                log::warn!("event handler for '{}' failed: {}", event, err);
            }
        }
    }
}
