//! Cross-thread result dispatch
//!
//! The dispatcher is the only path by which test results reach the consumer.
//! Payloads are submitted from any execution context (including the
//! background test thread) into an unbounded FIFO queue and are delivered
//! exclusively during the drain step, which the consumer runs on its own
//! context via [`ResultDispatcher::pump`] or [`ResultDispatcher::pump_wait`].
//!
//! This mirrors the event channel between a protocol thread and a GUI main
//! loop: `std::sync::mpsc` for the cross-runtime handoff, polled with
//! `try_recv` from the owning loop.
//!
//! Payloads submitted before a callback is registered are buffered: the
//! drain step is a no-op while the registry is empty, and everything is
//! delivered in submission order once a callback appears.

use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::callback::CallbackRegistry;
use crate::error::{HarnessError, HarnessResult};

/// FIFO bridge between producer threads and the consumer's drain step
pub struct ResultDispatcher {
    tx: Sender<String>,
    rx: Mutex<Receiver<String>>,
    callbacks: Arc<CallbackRegistry>,
}

impl ResultDispatcher {
    /// Creates a dispatcher delivering into the given callback registry
    #[must_use]
    pub fn new(callbacks: Arc<CallbackRegistry>) -> Self {
        let (tx, rx) = channel();
        Self {
            tx,
            rx: Mutex::new(rx),
            callbacks,
        }
    }

    /// Enqueues a payload for delivery on the consumer's context
    ///
    /// Callable from any thread; never blocks.
    ///
    /// # Errors
    ///
    /// Returns `HarnessError::ChannelError` if the dispatcher was dropped.
    pub fn submit(&self, payload: impl Into<String>) -> HarnessResult<()> {
        self.tx
            .send(payload.into())
            .map_err(|e| HarnessError::ChannelError(e.to_string()))
    }

    /// Returns a clonable submission handle for background contexts
    #[must_use]
    pub fn submitter(&self) -> ResultSubmitter {
        ResultSubmitter {
            tx: self.tx.clone(),
        }
    }

    /// Drains queued payloads, invoking the registered callback for each
    ///
    /// Must be called from the consumer's own context. Payloads are
    /// delivered strictly in submission order. While no callback is
    /// registered the queue is left intact. A failed delivery is dropped
    /// and draining continues with the next payload.
    ///
    /// Returns the number of payloads delivered.
    pub fn pump(&self) -> usize {
        if !self.callbacks.is_registered() {
            tracing::debug!("drain skipped: no callback registered");
            return 0;
        }
        let Ok(rx) = self.rx.lock() else {
            tracing::warn!("result queue poisoned, drain skipped");
            return 0;
        };
        let mut delivered = 0;
        while let Ok(payload) = rx.try_recv() {
            match self.callbacks.invoke(&payload) {
                Ok(()) => delivered += 1,
                Err(e) => {
                    tracing::warn!(error = %e, "result dropped during drain");
                }
            }
        }
        delivered
    }

    /// Like [`pump`](Self::pump), but blocks up to `timeout` for the first
    /// payload before draining the rest
    ///
    /// Returns immediately with 0 while no callback is registered.
    pub fn pump_wait(&self, timeout: Duration) -> usize {
        if !self.callbacks.is_registered() {
            return 0;
        }
        let Ok(rx) = self.rx.lock() else {
            tracing::warn!("result queue poisoned, drain skipped");
            return 0;
        };
        let Ok(first) = rx.recv_timeout(timeout) else {
            return 0;
        };
        let mut delivered = 0;
        match self.callbacks.invoke(&first) {
            Ok(()) => delivered += 1,
            Err(e) => tracing::warn!(error = %e, "result dropped during drain"),
        }
        while let Ok(payload) = rx.try_recv() {
            match self.callbacks.invoke(&payload) {
                Ok(()) => delivered += 1,
                Err(e) => tracing::warn!(error = %e, "result dropped during drain"),
            }
        }
        delivered
    }
}

/// Clonable, `Send` handle for submitting results from a producer thread
#[derive(Clone)]
pub struct ResultSubmitter {
    tx: Sender<String>,
}

impl ResultSubmitter {
    /// Enqueues a payload for delivery on the consumer's context
    ///
    /// # Errors
    ///
    /// Returns `HarnessError::ChannelError` if the dispatcher was dropped.
    pub fn submit(&self, payload: impl Into<String>) -> HarnessResult<()> {
        self.tx
            .send(payload.into())
            .map_err(|e| HarnessError::ChannelError(e.to_string()))
    }
}
