//! Property-based tests for the session model

use proptest::prelude::*;
use rdpharness_core::{SessionHandle, WindowCommandCode, WindowState};

fn arb_command() -> impl Strategy<Value = WindowCommandCode> {
    prop_oneof![
        Just(WindowCommandCode::Minimize),
        Just(WindowCommandCode::Maximize),
        Just(WindowCommandCode::Restore),
        Just(WindowCommandCode::Close),
        Just(WindowCommandCode::Focus),
    ]
}

// Reference model of the window state machine: Close is terminal, Focus
// leaves the state unchanged.
fn model_transition(state: WindowState, command: WindowCommandCode) -> WindowState {
    if state == WindowState::Closed {
        return WindowState::Closed;
    }
    match command {
        WindowCommandCode::Minimize => WindowState::Minimized,
        WindowCommandCode::Maximize => WindowState::Maximized,
        WindowCommandCode::Restore => WindowState::Normal,
        WindowCommandCode::Close => WindowState::Closed,
        WindowCommandCode::Focus => state,
    }
}

proptest! {
    #[test]
    fn prop_window_state_machine(commands in proptest::collection::vec(arb_command(), 0..30)) {
        let session = SessionHandle::new(1, 320, 240);
        let mut expected = WindowState::Normal;
        for command in commands {
            session.apply_window_command(command);
            expected = model_transition(expected, command);
        }
        prop_assert_eq!(session.window_state(), expected);
    }

    #[test]
    fn prop_frame_payload_is_stable(color in any::<[u8; 4]>()) {
        let session = SessionHandle::new(1, 64, 48);
        session.fill(color);
        // Rendering must not mutate the frame: two reads agree.
        prop_assert_eq!(session.render_frame(), session.render_frame());
    }

    #[test]
    fn prop_distinct_fills_change_digest(a in any::<[u8; 4]>(), b in any::<[u8; 4]>()) {
        prop_assume!(a != b);
        let session = SessionHandle::new(1, 32, 32);

        session.fill(a);
        let first = session.render_frame();
        session.fill(b);
        let second = session.render_frame();

        let digest = |frame: &str| frame.split("digest=").nth(1).map(str::to_string);
        prop_assert_ne!(digest(&first), digest(&second));
    }
}
