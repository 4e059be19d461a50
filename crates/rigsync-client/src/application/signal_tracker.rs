//! Machine signal tracker.
//!
//! Holds the three wait-signals derived from the machine-state feed in a
//! single `watch` channel, so a reader always sees a consistent triple and a
//! waiter is woken on every recompute.  Every decoded message is also
//! re-published on a `broadcast` channel for observers.
//!
//! # Lifecycle
//!
//! ```text
//! feed pump ──mpsc<String>──► run_machine_listener ──► tracker.apply(msg)
//!                                                        ├─ watch.send_replace(from_state)
//!                                                        └─ broadcast.send(msg)
//! ```

use std::sync::Arc;
use std::time::Duration;

use rigsync_core::protocol::decode_machine_state;
use rigsync_core::{MachineSignal, MachineSignals, MachineStateMessage};
use tokio::sync::{broadcast, mpsc, watch};
use tracing::{debug, info, warn};

/// Capacity of the observer channel; slow observers miss older messages.
const OBSERVER_CAPACITY: usize = 64;

/// Derives and publishes the machine's wait-signals.
pub struct MachineSignalTracker {
    signals: watch::Sender<MachineSignals>,
    observers: broadcast::Sender<MachineStateMessage>,
}

impl Default for MachineSignalTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl MachineSignalTracker {
    /// Creates a tracker with every flag clear.
    pub fn new() -> Self {
        let (signals, _) = watch::channel(MachineSignals::default());
        let (observers, _) = broadcast::channel(OBSERVER_CAPACITY);
        Self { signals, observers }
    }

    /// Recomputes all flags from `message` and notifies observers.
    pub fn apply(&self, message: MachineStateMessage) {
        let signals = MachineSignals::from_state(&message.state);
        debug!("machine state '{}' -> {:?}", message.state, signals);
        self.signals.send_replace(signals);
        // No observers is fine.
        let _ = self.observers.send(message);
    }

    /// Current flags.
    pub fn current(&self) -> MachineSignals {
        *self.signals.borrow()
    }

    /// Waits until `signal` is set or `timeout` elapses (`None` waits forever).
    ///
    /// Returns `true` if the flag was observed set.
    pub async fn wait(&self, signal: MachineSignal, timeout: Option<Duration>) -> bool {
        let mut rx = self.signals.subscribe();
        let set = async move {
            // The sender lives in `self`, so `wait_for` cannot fail while we borrow it.
            rx.wait_for(|s| s.is_set(signal)).await.is_ok()
        };
        match timeout {
            Some(limit) => tokio::time::timeout(limit, set).await.unwrap_or(false),
            None => set.await,
        }
    }

    /// Subscribes to every decoded machine-state message from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<MachineStateMessage> {
        self.observers.subscribe()
    }
}

/// Consumes machine-state frames until `frames` closes.
///
/// A frame that does not decode is logged and skipped.
pub async fn run_machine_listener(
    tracker: Arc<MachineSignalTracker>,
    mut frames: mpsc::Receiver<String>,
) {
    while let Some(text) = frames.recv().await {
        match decode_machine_state(&text) {
            Ok(message) => tracker.apply(message),
            Err(e) => warn!("{e}; dropping frame"),
        }
    }
    info!("machine-state listener stopped");
}

// ── Tests ─────────────────────────────────────────────────────────────────────
