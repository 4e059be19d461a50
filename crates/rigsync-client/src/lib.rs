//! rigsync-client library crate.
//!
//! Keeps a controller process synchronised with a remote test rig (the
//! "machine").  The machine is described by a hypermedia REST API and
//! reports changes over two WebSocket feeds; this crate turns both into a
//! small async API:
//!
//! ```text
//! caller ──► Machine ─┬─ current_machine_state / properties   (REST read)
//!                     ├─ invoke / trigger                      (REST via ActionSpec)
//!                     ├─ wait_ready / wait_closing / wait_not_ready
//!                     │        ▲ MachineSignalTracker ◄── machine-state feed listener
//!                     └─ wait_app_state / app_wait
//!                              ▲ AppWaitEngine        ◄── application-state feed listener
//! ```
//!
//! # Architecture
//!
//! ```text
//! [rigsync-client]
//!   ├── application/      Resolver, invocation, signal tracker, wait engine,
//!   │                     the Machine coordinator, and the RestTransport seam
//!   └── infrastructure/
//!         ├── http/       reqwest implementation of RestTransport
//!         ├── feed/       tokio-tungstenite feed pumps
//!         └── config/     ClientConfig (TOML file + defaults)
//! ```
//!
//! `application` depends only on `rigsync-core` and the [`RestTransport`]
//! trait, so every coordination rule is testable with an in-memory transport
//! and `mpsc` channels standing in for the feeds.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use rigsync_client::{connect, ClientConfig};
//!
//! # async fn example() -> Result<(), rigsync_client::RigError> {
//! let machine = connect(&ClientConfig::new("10.0.0.5:8080")).await?;
//! machine.wait_ready(Some(Duration::from_secs(60))).await?;
//! machine.invoke("camera", "capture", serde_json::Map::new()).await?;
//! machine.wait_app_state("camera", "Running", Some(Duration::from_secs(10))).await?;
//! # Ok(())
//! # }
//! ```

/// Application layer: coordination logic over the transport seam.
pub mod application;

/// Infrastructure layer: HTTP transport, WebSocket feeds, configuration.
pub mod infrastructure;

pub use application::{
    ActionOutcome, AppWaitEngine, FeedReceivers, Machine, MachineSignalTracker, RestResponse,
    RestTransport, RigError, TransportError, WaitHandle,
};
pub use infrastructure::config::{ClientConfig, ConfigError};
pub use infrastructure::connect;
