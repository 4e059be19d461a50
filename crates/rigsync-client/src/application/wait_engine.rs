//! Application wait engine.
//!
//! Callers waiting for an application state register a slot in a pending
//! set.  The application-state listener scans the set for every incoming
//! message and resolves (then removes) all matching slots in one pass.
//!
//! # Concurrency
//!
//! The pending set is one `parking_lot::Mutex<Vec<PendingWait>>`.  Register
//! appends under the lock; resolve scans, delivers and removes under a
//! single acquisition, so a message can never be delivered to a slot twice
//! and a slot registered while a scan is running waits for the next message.
//! Delivery is a `oneshot` send and never blocks while the lock is held.
//!
//! Slots of callers that already gave up (timed out) stay in the set until a
//! matching message arrives; the send to their dropped receiver fails
//! silently and the slot is removed like any other.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use rigsync_core::protocol::decode_application_state;
use rigsync_core::{AcceptableStates, ApplicationStateMessage};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::error::RigError;

/// One registered wait.
#[derive(Debug)]
struct PendingWait {
    id: Uuid,
    application: String,
    acceptable: AcceptableStates,
    tx: Option<oneshot::Sender<String>>,
}

/// The pending set of application waits.
#[derive(Debug, Default)]
pub struct AppWaitEngine {
    pending: Mutex<Vec<PendingWait>>,
}

impl AppWaitEngine {
    /// Creates an engine with no pending waits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a wait for `application` to reach one of `acceptable`.
    pub fn register(&self, application: &str, acceptable: AcceptableStates) -> WaitHandle {
        let (tx, rx) = oneshot::channel();
        let id = Uuid::new_v4();
        debug!(
            "wait {id}: '{application}' -> {:?}",
            acceptable.iter().collect::<Vec<_>>()
        );
        self.pending.lock().push(PendingWait {
            id,
            application: application.to_string(),
            acceptable,
            tx: Some(tx),
        });
        WaitHandle::Pending(rx)
    }

    /// Resolves every slot matching `message`; returns how many matched.
    pub fn resolve(&self, message: &ApplicationStateMessage) -> usize {
        let mut resolved = 0;
        self.pending.lock().retain_mut(|slot| {
            if slot.application != message.name || !slot.acceptable.contains(&message.value) {
                return true;
            }
            if let Some(tx) = slot.tx.take() {
                if tx.send(message.value.clone()).is_err() {
                    debug!("wait {}: caller already gone", slot.id);
                }
            }
            resolved += 1;
            false
        });
        resolved
    }

    /// Number of registered, unresolved waits.
    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }
}

/// The caller's side of one application wait.
#[derive(Debug)]
pub enum WaitHandle {
    /// The snapshot already satisfied the wait.
    Resolved(String),
    /// Registered; resolved by a later feed message.
    Pending(oneshot::Receiver<String>),
}

impl WaitHandle {
    /// Waits for the resolving state.
    ///
    /// Returns `Ok(None)` when `timeout` elapses first (`None` waits forever).
    ///
    /// # Errors
    ///
    /// [`RigError::FeedClosed`] if the engine was dropped with this wait
    /// still pending.
    pub async fn wait(self, timeout: Option<Duration>) -> Result<Option<String>, RigError> {
        let rx = match self {
            WaitHandle::Resolved(state) => return Ok(Some(state)),
            WaitHandle::Pending(rx) => rx,
        };
        let received = match timeout {
            Some(limit) => match tokio::time::timeout(limit, rx).await {
                Ok(received) => received,
                Err(_) => return Ok(None),
            },
            None => rx.await,
        };
        received.map(Some).map_err(|_| RigError::FeedClosed {
            feed: "application-state",
        })
    }
}

/// Consumes application-state frames until `frames` closes.
///
/// A frame that does not decode is logged and skipped.
pub async fn run_application_listener(
    engine: Arc<AppWaitEngine>,
    mut frames: mpsc::Receiver<String>,
) {
    while let Some(text) = frames.recv().await {
        match decode_application_state(&text) {
            Ok(message) => {
                let resolved = engine.resolve(&message);
                if resolved > 0 {
                    debug!(
                        "'{}' reached '{}'; resolved {resolved} wait(s)",
                        message.name, message.value
                    );
                }
            }
            Err(e) => warn!("{e}; dropping frame"),
        }
    }
    info!("application-state listener stopped");
}

// ── Tests ─────────────────────────────────────────────────────────────────────
