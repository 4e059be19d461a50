//! The `Machine` coordinator.
//!
//! A [`Machine`] is one live session with the rig.  It owns:
//!
//! - the REST transport and base URL,
//! - the application registry and state-trigger actions resolved at connect,
//! - the [`MachineSignalTracker`] and [`AppWaitEngine`], and
//! - every background task feeding them.
//!
//! # Lifecycle
//!
//! ```text
//! assemble ─► spawn machine-state listener
//!          ─► spawn application-state listener
//!          ─► resolve registry + triggers   (feeds already live)
//!          ─► Machine
//!
//! drop / shutdown ─► abort every task
//! ```
//!
//! Listeners are started before resolution so no feed message sent while
//! connect is resolving is lost.
//!
//! # Wait semantics
//!
//! Every wait reads a snapshot over REST first and returns at once when the
//! snapshot already satisfies it.  Otherwise it waits on the live feed.  A
//! state change that happens between the snapshot and the registration is
//! not replayed: such a wait only resolves on a later message or times out.

use std::sync::Arc;
use std::time::Duration;

use rigsync_core::domain::signals::{STATE_CLOSING, STATE_READY};
use rigsync_core::protocol::{API_ROOT_PATH, APPLICATIONS_PATH};
use rigsync_core::{
    AcceptableStates, ActionSet, ActionSpec, Application, ApplicationRegistry, MachineSignal,
    MachineSignals, MachineStateMessage, WaitVerdict,
};
use serde_json::{Map, Value};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::error::RigError;
use super::invoke::{invoke_action, ActionOutcome};
use super::resolver::{fetch_entity_document, resolve_registry};
use super::signal_tracker::{run_machine_listener, MachineSignalTracker};
use super::transport::RestTransport;
use super::wait_engine::{run_application_listener, AppWaitEngine, WaitHandle};

/// Owner name used in errors about the machine's own actions.
const MACHINE_OWNER: &str = "machine";

/// Text-frame channels of the two feeds.
#[derive(Debug)]
pub struct FeedReceivers {
    /// Frames from the machine-state feed.
    pub machine: mpsc::Receiver<String>,
    /// Frames from the application-state feed.
    pub applications: mpsc::Receiver<String>,
}

/// A connected machine.
pub struct Machine {
    transport: Arc<dyn RestTransport>,
    base_url: String,
    registry: ApplicationRegistry,
    state_triggers: ActionSet,
    tracker: Arc<MachineSignalTracker>,
    engine: Arc<AppWaitEngine>,
    tasks: Vec<JoinHandle<()>>,
}

impl Machine {
    /// Starts the feed listeners, then resolves the registry.
    ///
    /// # Errors
    ///
    /// Any error from [`resolve_registry`].  The listeners are stopped
    /// before the error is returned.
    pub async fn assemble(
        transport: Arc<dyn RestTransport>,
        base_url: impl Into<String>,
        feeds: FeedReceivers,
    ) -> Result<Self, RigError> {
        let tracker = Arc::new(MachineSignalTracker::new());
        let engine = Arc::new(AppWaitEngine::new());

        let mut machine = Self {
            transport,
            base_url: base_url.into(),
            registry: ApplicationRegistry::new(),
            state_triggers: ActionSet::new(),
            tracker: Arc::clone(&tracker),
            engine: Arc::clone(&engine),
            tasks: Vec::with_capacity(4),
        };
        machine.supervise(tokio::spawn(run_machine_listener(tracker, feeds.machine)));
        machine.supervise(tokio::spawn(run_application_listener(
            engine,
            feeds.applications,
        )));

        // On error `machine` is dropped here, which aborts both listeners.
        let (registry, state_triggers) =
            resolve_registry(machine.transport.as_ref(), &machine.base_url).await?;
        machine.registry = registry;
        machine.state_triggers = state_triggers;

        info!("connected to machine at {}", machine.base_url);
        Ok(machine)
    }

    /// Ties a background task to this machine's lifetime.
    pub fn supervise(&mut self, task: JoinHandle<()>) {
        self.tasks.push(task);
    }

    /// Stops every background task and waits for them to finish.
    pub async fn shutdown(mut self) {
        let tasks = std::mem::take(&mut self.tasks);
        for task in &tasks {
            task.abort();
        }
        for task in tasks {
            // A cancelled task reports `JoinError::Cancelled`; nothing to do.
            let _ = task.await;
        }
        debug!("machine at {} shut down", self.base_url);
    }

    /// Base URL of the machine's REST API.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // ── Machine reads ─────────────────────────────────────────────────────────

    /// Machine properties, read fresh from the root document.
    pub async fn properties(&self) -> Result<Map<String, Value>, RigError> {
        let url = format!("{}{API_ROOT_PATH}", self.base_url);
        Ok(fetch_entity_document(self.transport.as_ref(), &url)
            .await?
            .properties)
    }

    /// The machine's current state string, read fresh.
    pub async fn current_machine_state(&self) -> Result<String, RigError> {
        let url = format!("{}{API_ROOT_PATH}", self.base_url);
        let root = fetch_entity_document(self.transport.as_ref(), &url).await?;
        root.state()
            .map(str::to_string)
            .ok_or_else(|| RigError::MalformedDocument {
                url,
                reason: "root document has no properties.state".to_string(),
            })
    }

    /// Returns `true` when every test can run (state is `Ready`).
    pub async fn ready_for_testing(&self) -> Result<bool, RigError> {
        Ok(self.current_machine_state().await? == STATE_READY)
    }

    /// Returns `true` when the box is closing or already ready.
    pub async fn test_box_closing(&self) -> Result<bool, RigError> {
        let state = self.current_machine_state().await?;
        Ok(state == STATE_CLOSING || state == STATE_READY)
    }

    /// Flags derived from the latest machine-state feed message.
    pub fn signals(&self) -> MachineSignals {
        self.tracker.current()
    }

    /// Every decoded machine-state message from now on.
    pub fn subscribe_machine_state(&self) -> broadcast::Receiver<MachineStateMessage> {
        self.tracker.subscribe()
    }

    // ── Registry ──────────────────────────────────────────────────────────────

    /// The application registry resolved at connect.
    pub fn applications(&self) -> &ApplicationRegistry {
        &self.registry
    }

    /// The machine's root-level actions.
    pub fn state_triggers(&self) -> &ActionSet {
        &self.state_triggers
    }

    /// Looks up an application by canonical name or alias.
    pub fn application(&self, key: &str) -> Result<&Arc<Application>, RigError> {
        self.registry
            .get(key)
            .ok_or_else(|| RigError::UnknownApplication(key.to_string()))
    }

    // ── Actions ───────────────────────────────────────────────────────────────

    /// Invokes `action` of application `key` with caller `fields`.
    pub async fn invoke(
        &self,
        key: &str,
        action: &str,
        fields: Map<String, Value>,
    ) -> Result<ActionOutcome, RigError> {
        let application = self.application(key)?;
        let spec = application
            .action(action)
            .ok_or_else(|| RigError::UnknownAction {
                owner: key.to_string(),
                action: action.to_string(),
            })?;
        self.run(spec, &fields).await
    }

    /// Invokes one of the machine's state triggers.
    pub async fn trigger(
        &self,
        action: &str,
        fields: Map<String, Value>,
    ) -> Result<ActionOutcome, RigError> {
        let spec = self
            .state_triggers
            .get(action)
            .ok_or_else(|| RigError::UnknownAction {
                owner: MACHINE_OWNER.to_string(),
                action: action.to_string(),
            })?;
        self.run(spec, &fields).await
    }

    async fn run(
        &self,
        spec: &ActionSpec,
        fields: &Map<String, Value>,
    ) -> Result<ActionOutcome, RigError> {
        info!("{} {} ({})", spec.method, spec.name, spec.target);
        invoke_action(self.transport.as_ref(), spec, fields).await
    }

    // ── Machine waits ─────────────────────────────────────────────────────────

    /// Waits until the machine is ready for testing.
    ///
    /// Returns `Ok(false)` if `timeout` elapsed first.
    pub async fn wait_ready(&self, timeout: Option<Duration>) -> Result<bool, RigError> {
        if self.ready_for_testing().await? {
            return Ok(true);
        }
        Ok(self.tracker.wait(MachineSignal::Ready, timeout).await)
    }

    /// Waits until the test box is closing (or ready).
    pub async fn wait_closing(&self, timeout: Option<Duration>) -> Result<bool, RigError> {
        if self.test_box_closing().await? {
            return Ok(true);
        }
        Ok(self
            .tracker
            .wait(MachineSignal::ClosingOrReady, timeout)
            .await)
    }

    /// Waits until the machine leaves `Ready`.
    pub async fn wait_not_ready(&self, timeout: Option<Duration>) -> Result<bool, RigError> {
        if !self.ready_for_testing().await? {
            return Ok(true);
        }
        Ok(self.tracker.wait(MachineSignal::NotReady, timeout).await)
    }

    // ── Application waits ─────────────────────────────────────────────────────

    /// Current state of application `key`.
    ///
    /// Read from the live application list; falls back to the state captured
    /// at connect when the list no longer contains the application.
    pub async fn application_state(&self, key: &str) -> Result<Option<String>, RigError> {
        let application = self.application(key)?;
        let url = format!("{}{APPLICATIONS_PATH}", self.base_url);
        let list = fetch_entity_document(self.transport.as_ref(), &url).await?;

        let live = list
            .entities
            .iter()
            .find(|link| link.name() == Some(key) || link.alias() == Some(key))
            .and_then(|link| link.state());
        Ok(live.or_else(|| application.state()).map(str::to_string))
    }

    /// Starts waiting for application `key` to reach `target`.
    ///
    /// With `bail_on_error`, any error state also resolves the wait.  A
    /// snapshot that already satisfies the wait yields
    /// [`WaitHandle::Resolved`].
    pub async fn app_wait(
        &self,
        key: &str,
        target: &str,
        bail_on_error: bool,
    ) -> Result<WaitHandle, RigError> {
        let acceptable = AcceptableStates::new(target, bail_on_error);
        if let Some(state) = self.application_state(key).await? {
            if acceptable.contains(&state) {
                debug!("'{key}' already in '{state}'");
                return Ok(WaitHandle::Resolved(state));
            }
        }
        // Matched against the frame's `name` exactly as the caller spelled it.
        Ok(self.engine.register(key, acceptable))
    }

    /// Waits for application `key` to reach `target`, bailing on error states.
    ///
    /// # Errors
    ///
    /// - [`RigError::Timeout`] if `timeout` elapses first.
    /// - [`RigError::Application`] if the application reached an error state.
    pub async fn wait_app_state(
        &self,
        key: &str,
        target: &str,
        timeout: Option<Duration>,
    ) -> Result<(), RigError> {
        let acceptable = AcceptableStates::new(target, true);
        let handle = self.app_wait(key, target, true).await?;
        let Some(resolved) = handle.wait(timeout).await? else {
            return Err(RigError::Timeout {
                name: key.to_string(),
                state: target.to_string(),
            });
        };
        match WaitVerdict::judge(&acceptable, &resolved) {
            WaitVerdict::Reached => Ok(()),
            WaitVerdict::Diverted { actual } => Err(RigError::Application {
                name: key.to_string(),
                expected: target.to_string(),
                actual,
            }),
        }
    }

    /// Number of application waits not yet resolved.
    pub fn pending_waits(&self) -> usize {
        self.engine.pending_count()
    }
}

impl Drop for Machine {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

impl std::fmt::Debug for Machine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Machine")
            .field("base_url", &self.base_url)
            .field("applications", &self.registry.len())
            .field("state_triggers", &self.state_triggers.len())
            .field("tasks", &self.tasks.len())
            .finish()
    }
}
