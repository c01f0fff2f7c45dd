//! Screen update pump
//!
//! Triggered by the consumer to push the active session's current rendered
//! frame through the same delivery path as test results.

use std::sync::Arc;

use crate::dispatch::ResultDispatcher;
use crate::error::{HarnessError, HarnessResult};
use crate::session::WindowRegistry;

/// Requests screen-refresh deliveries for the active session
pub struct ScreenUpdatePump {
    windows: Arc<WindowRegistry>,
    dispatcher: Arc<ResultDispatcher>,
}

impl ScreenUpdatePump {
    /// Creates a pump over the given registry and dispatcher
    #[must_use]
    pub fn new(windows: Arc<WindowRegistry>, dispatcher: Arc<ResultDispatcher>) -> Self {
        Self {
            windows,
            dispatcher,
        }
    }

    /// Renders the active session's frame and submits it for delivery
    ///
    /// # Errors
    ///
    /// Returns `HarnessError::NoActiveSession` if no run is live; no
    /// delivery occurs in that case.
    pub fn update_screen(&self) -> HarnessResult<()> {
        let Some(session) = self.windows.active() else {
            return Err(HarnessError::NoActiveSession);
        };
        let payload = session.render_frame();
        tracing::debug!(window_id = session.window_id(), "screen update submitted");
        self.dispatcher.submit(payload)
    }
}
