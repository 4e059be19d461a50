//! Application layer for rigsync-client.
//!
//! The application layer knows *what* to do with the machine's documents and
//! feeds; it delegates *how* bytes move to the infrastructure layer through
//! the [`RestTransport`] trait and plain `mpsc` channels of text frames.
//!
//! # Responsibilities
//!
//! - Resolving the hypermedia graph into the application registry
//! - Invoking actions from their [`ActionSpec`](rigsync_core::ActionSpec)
//! - Tracking the three machine wait-signals
//! - Resolving pending application waits
//! - Owning the background listener tasks for the machine's lifetime
//!
//! # What does NOT belong here?
//!
//! - reqwest, tungstenite, or any socket type (infrastructure)
//! - Reading configuration files (infrastructure)

pub mod error;
pub mod invoke;
pub mod machine;
pub mod resolver;
pub mod signal_tracker;
pub mod transport;
pub mod wait_engine;

pub use error::RigError;
pub use invoke::{invoke_action, ActionOutcome};
pub use machine::{FeedReceivers, Machine};
pub use resolver::{resolve_actions, resolve_registry};
pub use signal_tracker::{run_machine_listener, MachineSignalTracker};
pub use transport::{RestResponse, RestTransport, TransportError};
pub use wait_engine::{run_application_listener, AppWaitEngine, WaitHandle};
