//! # rigsync-core
//!
//! Shared domain library for rigsync, a client that keeps a controller
//! process in step with a remote test rig (the "machine").
//!
//! The machine publishes its surface as a hypermedia entity graph over REST
//! and pushes state changes over two WebSocket feeds.  This crate contains
//! everything about that conversation that can be expressed without I/O:
//!
//! - **`protocol`** – The wire shapes.  Serde types for the entity graph
//!   documents (`/api`, `/api/applications`, per-application detail
//!   documents) and decoders for the two feed message formats.
//!
//! - **`domain`** – The model built from those shapes.  [`ActionSpec`] turns
//!   a hypermedia action into data that one generic invoke operation can
//!   execute; [`ApplicationRegistry`] applies the canonical-name/alias
//!   registration rule; [`MachineSignals`] recomputes the three machine
//!   wait-signals from a state string; [`AcceptableStates`] decides which
//!   application states end a wait.
//!
//! Nothing here touches sockets, timers, or async runtimes.  The
//! `rigsync-client` crate layers the transport, the background listeners and
//! the blocking waits on top.

pub mod domain;
pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `rigsync_core::ActionSpec` instead of `rigsync_core::domain::action::ActionSpec`.
pub use domain::action::{ActionSet, ActionSpec, HttpMethod};
pub use domain::registry::{Application, ApplicationRegistry, Registration};
pub use domain::signals::{MachineSignal, MachineSignals};
pub use domain::wait::{AcceptableStates, WaitVerdict};
pub use protocol::feed::{ApplicationStateMessage, FeedError, MachineStateMessage};
pub use protocol::hypermedia::{ActionDocument, EntityDocument, EntityLink, FieldDocument};
