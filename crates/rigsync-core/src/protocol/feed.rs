//! Feed frame decoding.
//!
//! The machine pushes two independent streams of UTF-8 JSON text frames:
//!
//! ```text
//! /websocket/state         {"state": "Ready"}
//! /websocket/applications  {"name": "camera", "value": "Running"}
//! ```
//!
//! Listeners decode each frame with the functions below.  A frame that fails
//! to decode is reported as a [`FeedError`]; listeners log it and move on to
//! the next frame, so one bad frame never stops a feed.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced while decoding a feed frame.
#[derive(Debug, Error)]
pub enum FeedError {
    /// The frame was not valid JSON or lacked a required key.
    #[error("malformed {feed} frame: {source}")]
    Malformed {
        /// Which feed the frame came from (`"machine-state"` / `"application-state"`).
        feed: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// A machine-state frame: `{"state": <string>}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineStateMessage {
    /// The machine's new state, e.g. `"Ready"`, `"Closing"`, `"Running"`.
    pub state: String,
}

/// An application-state frame: `{"name": <string>, "value": <string>}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationStateMessage {
    /// Application the change applies to.
    pub name: String,
    /// The application's new state.
    pub value: String,
}

/// Decodes one frame from the machine-state feed.
///
/// # Errors
///
/// Returns [`FeedError::Malformed`] when the text is not JSON or `state` is
/// missing or not a string.
///
/// # Example
///
/// ```rust
/// use rigsync_core::protocol::decode_machine_state;
///
/// let msg = decode_machine_state(r#"{"state":"Ready"}"#).unwrap();
/// assert_eq!(msg.state, "Ready");
/// ```
pub fn decode_machine_state(text: &str) -> Result<MachineStateMessage, FeedError> {
    serde_json::from_str(text).map_err(|source| FeedError::Malformed {
        feed: "machine-state",
        source,
    })
}

/// Decodes one frame from the application-state feed.
///
/// # Errors
///
/// Returns [`FeedError::Malformed`] when the text is not JSON or `name` /
/// `value` is missing or not a string.
pub fn decode_application_state(text: &str) -> Result<ApplicationStateMessage, FeedError> {
    serde_json::from_str(text).map_err(|source| FeedError::Malformed {
        feed: "application-state",
        source,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
