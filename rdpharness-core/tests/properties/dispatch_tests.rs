//! Property-based tests for the result dispatcher

use std::sync::{Arc, Mutex};

use proptest::prelude::*;
use rdpharness_core::{CallbackContext, CallbackRegistry, ResultDispatcher};

fn collecting_dispatcher() -> (ResultDispatcher, Arc<Mutex<Vec<String>>>) {
    let registry = Arc::new(CallbackRegistry::new());
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_clone = Arc::clone(&seen);
    let context: CallbackContext = Arc::new(());
    registry.register(
        Box::new(move |_, payload| {
            seen_clone.lock().unwrap().push(payload.to_string());
        }),
        context,
    );
    (ResultDispatcher::new(registry), seen)
}

proptest! {
    // For any submission sequence from the producer thread, the callback
    // observes exactly that sequence, in order.
    #[test]
    fn prop_fifo_order_preserved(payloads in proptest::collection::vec("[a-z0-9:.-]{0,24}", 0..50)) {
        let (dispatcher, seen) = collecting_dispatcher();
        let submitter = dispatcher.submitter();

        let to_send = payloads.clone();
        let producer = std::thread::spawn(move || {
            for payload in to_send {
                submitter.submit(payload).unwrap();
            }
        });
        producer.join().unwrap();

        let delivered = dispatcher.pump();
        prop_assert_eq!(delivered, payloads.len());
        let seen = seen.lock().unwrap();
        prop_assert_eq!(seen.as_slice(), payloads.as_slice());
    }

    // Draining in several steps never reorders or duplicates payloads.
    #[test]
    fn prop_split_drain_equals_single_drain(
        first in proptest::collection::vec("[a-z]{1,8}", 0..20),
        second in proptest::collection::vec("[0-9]{1,8}", 0..20),
    ) {
        let (dispatcher, seen) = collecting_dispatcher();

        for payload in &first {
            dispatcher.submit(payload.clone()).unwrap();
        }
        dispatcher.pump();
        for payload in &second {
            dispatcher.submit(payload.clone()).unwrap();
        }
        dispatcher.pump();

        let mut expected = first;
        expected.extend(second);
        let seen = seen.lock().unwrap();
        prop_assert_eq!(seen.as_slice(), expected.as_slice());
    }
}
