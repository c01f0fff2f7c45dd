//! Result callback registration
//!
//! The bridge exposes a single process-wide callback slot. Registering a new
//! callback replaces the previous pair atomically; the stored context token
//! is handed back verbatim on every invocation and never interpreted here.
//!
//! `register` may be called from any thread. `invoke` must only be called
//! from the consumer's own execution context (the dispatcher enforces this
//! by performing all deliveries during its drain step).

use std::any::Any;
use std::sync::{Arc, Mutex};

use crate::error::{HarnessError, HarnessResult};

/// Opaque context token passed back verbatim on every invocation
pub type CallbackContext = Arc<dyn Any + Send + Sync>;

/// Result callback invoked with the registered context and one payload
pub type ResultCallback = Box<dyn Fn(&CallbackContext, &str) + Send>;

struct Registered {
    callback: ResultCallback,
    context: CallbackContext,
}

/// Stores the single registered result callback and its context
pub struct CallbackRegistry {
    slot: Mutex<Option<Registered>>,
}

impl CallbackRegistry {
    /// Creates an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }

    /// Stores the callback/context pair, replacing any prior registration
    pub fn register(&self, callback: ResultCallback, context: CallbackContext) {
        if let Ok(mut slot) = self.slot.lock() {
            let replaced = slot.is_some();
            *slot = Some(Registered { callback, context });
            tracing::debug!(replaced, "result callback registered");
        }
    }

    /// Returns true if a callback is currently registered
    #[must_use]
    pub fn is_registered(&self) -> bool {
        self.slot.lock().map(|slot| slot.is_some()).unwrap_or(false)
    }

    /// Invokes the registered callback with `payload`
    ///
    /// Must be called from the consumer's execution context only.
    ///
    /// # Errors
    ///
    /// Returns `HarnessError::NotRegistered` if no callback is set. A
    /// poisoned slot counts as unregistered.
    pub fn invoke(&self, payload: &str) -> HarnessResult<()> {
        let Ok(slot) = self.slot.lock() else {
            tracing::warn!("callback slot poisoned, dropping delivery");
            return Err(HarnessError::NotRegistered);
        };
        match slot.as_ref() {
            Some(registered) => {
                (registered.callback)(&registered.context, payload);
                Ok(())
            }
            None => Err(HarnessError::NotRegistered),
        }
    }
}

impl Default for CallbackRegistry {
    fn default() -> Self {
        Self::new()
    }
}
