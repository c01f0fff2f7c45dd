//! Session handle and window registry

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::event::{KeyDirection, WindowCommandCode, WindowId};
use crate::error::{HarnessError, HarnessResult};

/// Window-level state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindowState {
    /// Window is in its normal state
    #[default]
    Normal,
    /// Window is minimized
    Minimized,
    /// Window is maximized
    Maximized,
    /// Window has been closed; further input is ignored
    Closed,
}

#[derive(Debug)]
struct SessionInner {
    framebuffer: Vec<u8>,
    frame_seq: u64,
    keys_down: HashSet<u32>,
    last_key: Option<(u32, KeyDirection)>,
    window_state: WindowState,
    focused: bool,
    ended_at: Option<DateTime<Utc>>,
}

/// The addressed RDP-like session instance a test run executes against
///
/// Shared between the background test thread and the consumer thread; all
/// state lives behind the session's own lock, so input injection may
/// interleave freely with the run.
pub struct SessionHandle {
    id: Uuid,
    window_id: WindowId,
    width: u16,
    height: u16,
    started_at: DateTime<Utc>,
    inner: Mutex<SessionInner>,
}

impl SessionHandle {
    /// Creates a session with a zeroed BGRA framebuffer
    #[must_use]
    pub fn new(window_id: WindowId, width: u16, height: u16) -> Self {
        let pixels = usize::from(width) * usize::from(height);
        Self {
            id: Uuid::new_v4(),
            window_id,
            width,
            height,
            started_at: Utc::now(),
            inner: Mutex::new(SessionInner {
                framebuffer: vec![0u8; pixels * 4],
                frame_seq: 0,
                keys_down: HashSet::new(),
                last_key: None,
                window_state: WindowState::Normal,
                focused: true,
                ended_at: None,
            }),
        }
    }

    // A poisoned lock still holds usable plain data.
    fn inner(&self) -> MutexGuard<'_, SessionInner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Returns the unique session id
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Returns the window id this session is addressed by
    #[must_use]
    pub const fn window_id(&self) -> WindowId {
        self.window_id
    }

    /// Returns the desktop width
    #[must_use]
    pub const fn width(&self) -> u16 {
        self.width
    }

    /// Returns the desktop height
    #[must_use]
    pub const fn height(&self) -> u16 {
        self.height
    }

    /// Returns the session start timestamp
    #[must_use]
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Applies a key transition
    pub fn apply_key(&self, key_code: u32, direction: KeyDirection) {
        let mut inner = self.inner();
        if inner.window_state == WindowState::Closed {
            tracing::debug!(window_id = self.window_id, key_code, "key ignored: window closed");
            return;
        }
        if direction.is_down() {
            inner.keys_down.insert(key_code);
        } else {
            inner.keys_down.remove(&key_code);
        }
        inner.last_key = Some((key_code, direction));
        tracing::debug!(
            window_id = self.window_id,
            key_code,
            down = direction.is_down(),
            "key applied"
        );
    }

    /// Applies a window-level command
    pub fn apply_window_command(&self, command: WindowCommandCode) {
        let mut inner = self.inner();
        if inner.window_state == WindowState::Closed {
            tracing::debug!(window_id = self.window_id, ?command, "command ignored: window closed");
            return;
        }
        match command {
            WindowCommandCode::Minimize => inner.window_state = WindowState::Minimized,
            WindowCommandCode::Maximize => inner.window_state = WindowState::Maximized,
            WindowCommandCode::Restore => inner.window_state = WindowState::Normal,
            WindowCommandCode::Close => {
                inner.window_state = WindowState::Closed;
                inner.ended_at = Some(Utc::now());
            }
            WindowCommandCode::Focus => inner.focused = true,
        }
        tracing::debug!(window_id = self.window_id, ?command, "window command applied");
    }

    /// Returns the current window state
    #[must_use]
    pub fn window_state(&self) -> WindowState {
        self.inner().window_state
    }

    /// Returns true if the window currently has focus
    #[must_use]
    pub fn is_focused(&self) -> bool {
        self.inner().focused
    }

    /// Returns true if the given key is currently held down
    #[must_use]
    pub fn is_key_down(&self, key_code: u32) -> bool {
        self.inner().keys_down.contains(&key_code)
    }

    /// Returns the most recent key transition, if any
    #[must_use]
    pub fn last_key(&self) -> Option<(u32, KeyDirection)> {
        self.inner().last_key
    }

    /// Paints the whole framebuffer with one BGRA color
    pub fn fill(&self, bgra: [u8; 4]) {
        let mut inner = self.inner();
        for chunk in inner.framebuffer.chunks_exact_mut(4) {
            chunk.copy_from_slice(&bgra);
        }
        inner.frame_seq += 1;
    }

    /// Paints a rectangle, clamped to the framebuffer bounds
    pub fn fill_rect(&self, x: u16, y: u16, width: u16, height: u16, bgra: [u8; 4]) {
        let x0 = usize::from(x.min(self.width));
        let y0 = usize::from(y.min(self.height));
        let x1 = usize::from(x.saturating_add(width).min(self.width));
        let y1 = usize::from(y.saturating_add(height).min(self.height));
        let stride = usize::from(self.width) * 4;

        let mut inner = self.inner();
        for row in y0..y1 {
            for col in x0..x1 {
                let idx = row * stride + col * 4;
                inner.framebuffer[idx..idx + 4].copy_from_slice(&bgra);
            }
        }
        inner.frame_seq += 1;
    }

    /// Renders the current frame as a single-line string payload
    ///
    /// Format: `screen window=<id> <w>x<h> seq=<n> digest=<16-hex>`, where
    /// the digest is FNV-1a 64 over the framebuffer bytes.
    #[must_use]
    pub fn render_frame(&self) -> String {
        let inner = self.inner();
        let digest = fnv1a64(&inner.framebuffer);
        format!(
            "screen window={} {}x{} seq={} digest={digest:016x}",
            self.window_id, self.width, self.height, inner.frame_seq
        )
    }

    /// Marks the session closed at the end of a run
    pub fn close(&self) {
        let mut inner = self.inner();
        inner.window_state = WindowState::Closed;
        if inner.ended_at.is_none() {
            inner.ended_at = Some(Utc::now());
        }
    }

    /// Returns when the session ended, if it has
    #[must_use]
    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.inner().ended_at
    }
}

fn fnv1a64(data: &[u8]) -> u64 {
    const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    let mut hash = OFFSET_BASIS;
    for byte in data {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(PRIME);
    }
    hash
}

/// Tracks live sessions by window id
///
/// Insertion and removal happen on the background thread at run start and
/// completion; lookup happens on the consumer thread. Removal holds the
/// registry lock, so an input call either finds the session (and keeps it
/// alive through its `Arc`) or observes it already gone — never a
/// half-torn-down handle.
pub struct WindowRegistry {
    windows: Mutex<HashMap<WindowId, Arc<SessionHandle>>>,
}

impl WindowRegistry {
    /// Creates an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self {
            windows: Mutex::new(HashMap::new()),
        }
    }

    fn windows(&self) -> MutexGuard<'_, HashMap<WindowId, Arc<SessionHandle>>> {
        match self.windows.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Registers a session under its window id
    pub fn insert(&self, session: Arc<SessionHandle>) {
        self.windows().insert(session.window_id(), session);
    }

    /// Removes and returns the session for a window id
    pub fn remove(&self, window_id: WindowId) -> Option<Arc<SessionHandle>> {
        self.windows().remove(&window_id)
    }

    /// Looks up the session for a window id
    ///
    /// # Errors
    ///
    /// Returns `HarnessError::UnknownWindow` if no session is registered
    /// under `window_id`.
    pub fn get(&self, window_id: WindowId) -> HarnessResult<Arc<SessionHandle>> {
        self.windows()
            .get(&window_id)
            .cloned()
            .ok_or(HarnessError::UnknownWindow(window_id))
    }

    /// Returns the active session, if exactly one run is live
    #[must_use]
    pub fn active(&self) -> Option<Arc<SessionHandle>> {
        self.windows().values().next().cloned()
    }

    /// Returns the number of live sessions
    #[must_use]
    pub fn len(&self) -> usize {
        self.windows().len()
    }

    /// Returns true if no session is live
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.windows().is_empty()
    }
}

impl Default for WindowRegistry {
    fn default() -> Self {
        Self::new()
    }
}
