//! RDP-like session model
//!
//! A session is the unit a test case executes against: a window with an
//! in-memory framebuffer, key state, and a window-level state machine. One
//! session exists per active run. Sessions are shared between the background
//! test thread (driving the run) and the consumer thread (injecting input);
//! all mutation goes through the session's own lock.

mod event;
mod handle;

pub use event::{InputEvent, KeyDirection, WindowCommandCode, WindowId};
pub use handle::{SessionHandle, WindowRegistry, WindowState};
