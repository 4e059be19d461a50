//! Error taxonomy surfaced to callers of the machine.
//!
//! | Variant              | Raised when                                          | Recovery            |
//! |----------------------|------------------------------------------------------|---------------------|
//! | `Resolution`         | one entity's detail document could not be fetched    | logged; entity gets |
//! |                      | or decoded while building the registry               | an empty action set |
//! | `Action`             | an action answered with a non-success status         | surfaced, no retry  |
//! | `Timeout`            | a wait did not resolve before its deadline           | surfaced            |
//! | `Application`        | the awaited application reached another state        | surfaced            |
//!
//! The remaining variants cover lookups and transport failures outside the
//! four core cases.  Feed decode failures never appear here: listeners log
//! and drop them (see `rigsync_core::FeedError`).

use thiserror::Error;

use super::transport::TransportError;

/// Errors returned by [`Machine`](super::Machine) operations.
#[derive(Debug, Error)]
pub enum RigError {
    /// An entity's detail document could not be fetched or decoded.
    #[error("failed to resolve actions from {href}: {reason}")]
    Resolution {
        /// Detail document URL.
        href: String,
        /// Underlying failure.
        reason: String,
    },

    /// An action returned a non-success HTTP status.
    #[error("action '{action}' failed with HTTP status {status}")]
    Action {
        /// Action name.
        action: String,
        /// HTTP status code returned by the machine.
        status: u16,
    },

    /// A wait did not resolve within its timeout.
    #[error("timeout while waiting for the state '{state}' for the application '{name}'")]
    Timeout {
        /// Application name.
        name: String,
        /// Awaited state.
        state: String,
    },

    /// The awaited application reached a different (error) state.
    #[error("the application '{name}' waiting for the state '{expected}' went to state '{actual}'")]
    Application {
        /// Application name.
        name: String,
        /// Awaited state.
        expected: String,
        /// State actually reached.
        actual: String,
    },

    /// No application is registered under this name or alias.
    #[error("unknown application '{0}'")]
    UnknownApplication(String),

    /// The application (or the machine root) has no action with this name.
    #[error("'{owner}' has no action named '{action}'")]
    UnknownAction {
        /// Application key, or `"machine"` for root triggers.
        owner: String,
        /// Requested action name.
        action: String,
    },

    /// A document was fetched but lacked a required part.
    #[error("malformed document at {url}: {reason}")]
    MalformedDocument {
        /// Document URL.
        url: String,
        /// What was missing or wrong.
        reason: String,
    },

    /// The feed that would resolve a wait is gone.
    #[error("the {feed} feed closed before the wait resolved")]
    FeedClosed {
        /// Feed name.
        feed: &'static str,
    },

    /// The transport failed to complete a request.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_message_names_state_and_application() {
        let err = RigError::Timeout {
            name: "app1".to_string(),
            state: "Running".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("'Running'"));
        assert!(text.contains("'app1'"));
    }

    #[test]
    fn test_application_message_reports_expected_and_actual() {
        let err = RigError::Application {
            name: "app1".to_string(),
            expected: "Running".to_string(),
            actual: "Error".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "the application 'app1' waiting for the state 'Running' went to state 'Error'"
        );
    }

    #[test]
    fn test_transport_error_converts_transparently() {
        let err: RigError = TransportError::Status {
            url: "http://rig/api".to_string(),
            status: 503,
        }
        .into();
        assert!(matches!(err, RigError::Transport(_)));
        assert!(err.to_string().contains("503"));
    }
}
