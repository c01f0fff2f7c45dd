//! Input events routed into the session layer

/// Identifier addressing a session window
///
/// The session created for run *n* carries window id *n*; run ids start at 1.
pub type WindowId = u32;

/// Key transition direction
///
/// On the wire this is a two-valued integer: up = 0, anything else = down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyDirection {
    /// Key released
    Up,
    /// Key pressed
    Down,
}

impl KeyDirection {
    /// Decodes the raw integer form used by the external surface
    #[must_use]
    pub const fn from_raw(raw: i32) -> Self {
        if raw == 0 {
            Self::Up
        } else {
            Self::Down
        }
    }

    /// Returns true for a key press
    #[must_use]
    pub const fn is_down(self) -> bool {
        matches!(self, Self::Down)
    }
}

/// Window-level command codes owned by the session layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowCommandCode {
    /// Minimize the window
    Minimize,
    /// Maximize the window
    Maximize,
    /// Restore the window to its normal state
    Restore,
    /// Close the window
    Close,
    /// Give the window input focus
    Focus,
}

impl WindowCommandCode {
    /// Decodes a raw command code; unknown codes yield `None`
    #[must_use]
    pub const fn from_code(code: u32) -> Option<Self> {
        match code {
            1 => Some(Self::Minimize),
            2 => Some(Self::Maximize),
            3 => Some(Self::Restore),
            4 => Some(Self::Close),
            5 => Some(Self::Focus),
            _ => None,
        }
    }

    /// Returns the raw code for this command
    #[must_use]
    pub const fn code(self) -> u32 {
        match self {
            Self::Minimize => 1,
            Self::Maximize => 2,
            Self::Restore => 3,
            Self::Close => 4,
            Self::Focus => 5,
        }
    }
}

/// Input events applied immediately against a session
///
/// These are transient: never persisted, never queued through the result
/// dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    /// A key transition for a window
    KeyEvent {
        /// Target window
        window_id: WindowId,
        /// Key code as delivered by the embedder
        key_code: u32,
        /// Press or release
        direction: KeyDirection,
    },

    /// A window-level command
    WindowCommand {
        /// Target window
        window_id: WindowId,
        /// Decoded command
        command: WindowCommandCode,
    },
}

impl InputEvent {
    /// Returns the window this event addresses
    #[must_use]
    pub const fn window_id(&self) -> WindowId {
        match self {
            Self::KeyEvent { window_id, .. } | Self::WindowCommand { window_id, .. } => *window_id,
        }
    }
}
