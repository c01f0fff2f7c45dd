//! Input event routing
//!
//! Key and window-command events from the consumer are applied immediately
//! and synchronously against the addressed session. Fire-and-forget: no
//! result is produced and nothing goes through the result dispatcher. These
//! calls may interleave freely with the background thread's use of the same
//! session; the session's own lock provides the mutation discipline.

use std::sync::Arc;

use crate::error::HarnessResult;
use crate::session::{InputEvent, KeyDirection, WindowCommandCode, WindowId, WindowRegistry};

/// Routes consumer input into the active session
pub struct InputEventRouter {
    windows: Arc<WindowRegistry>,
}

impl InputEventRouter {
    /// Creates a router over the given window registry
    #[must_use]
    pub fn new(windows: Arc<WindowRegistry>) -> Self {
        Self { windows }
    }

    /// Applies an input event against its target session
    ///
    /// # Errors
    ///
    /// Returns `HarnessError::UnknownWindow` if the event targets a window
    /// with no live session.
    pub fn route(&self, event: InputEvent) -> HarnessResult<()> {
        let session = self.windows.get(event.window_id())?;
        match event {
            InputEvent::KeyEvent {
                key_code,
                direction,
                ..
            } => session.apply_key(key_code, direction),
            InputEvent::WindowCommand { command, .. } => session.apply_window_command(command),
        }
        Ok(())
    }

    /// Injects a key transition for a window
    ///
    /// # Errors
    ///
    /// Returns `HarnessError::UnknownWindow` if no session is live for
    /// `window_id`.
    pub fn key_event(
        &self,
        window_id: WindowId,
        key_code: u32,
        direction: KeyDirection,
    ) -> HarnessResult<()> {
        self.route(InputEvent::KeyEvent {
            window_id,
            key_code,
            direction,
        })
    }

    /// Injects a window-level command for a window
    ///
    /// Unknown command codes are logged and ignored; the command enumeration
    /// is owned by the session layer.
    ///
    /// # Errors
    ///
    /// Returns `HarnessError::UnknownWindow` if no session is live for
    /// `window_id`.
    pub fn window_command(&self, window_id: WindowId, command_code: u32) -> HarnessResult<()> {
        match WindowCommandCode::from_code(command_code) {
            Some(command) => self.route(InputEvent::WindowCommand { window_id, command }),
            None => {
                // Still require the window to exist so the caller gets the
                // same diagnostics as for a known code.
                self.windows.get(window_id)?;
                tracing::warn!(window_id, command_code, "ignoring unknown window command code");
                Ok(())
            }
        }
    }
}
