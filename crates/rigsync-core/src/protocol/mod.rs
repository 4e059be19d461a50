//! Wire formats spoken by the machine.
//!
//! - [`hypermedia`] – REST entity-graph documents.
//! - [`feed`] – JSON frames pushed over the two WebSocket feeds.
//!
//! The path constants below are relative to the machine's base URL.

pub mod feed;
pub mod hypermedia;

pub use feed::{decode_application_state, decode_machine_state, FeedError};

/// Root document: machine `properties` (including `state`) and root actions.
pub const API_ROOT_PATH: &str = "/api";

/// Application list document: one entity per application.
pub const APPLICATIONS_PATH: &str = "/api/applications";

/// Session login endpoint, used only when credentials are configured.
pub const LOGIN_PATH: &str = "/login";

/// WebSocket feed carrying `{"state": ...}` machine-state frames.
pub const MACHINE_STATE_FEED_PATH: &str = "/websocket/state";

/// WebSocket feed carrying `{"name": ..., "value": ...}` application frames.
pub const APPLICATION_STATE_FEED_PATH: &str = "/websocket/applications";
