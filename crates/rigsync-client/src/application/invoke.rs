//! Generic action invocation.
//!
//! Every action the machine declares is executed here from its
//! [`ActionSpec`].  GET actions hand the raw response back to the caller;
//! POST actions send the merged body and return nothing.  A non-success
//! status is an [`RigError::Action`] and is never retried.

use rigsync_core::{ActionSpec, HttpMethod};
use serde_json::{Map, Value};
use tracing::debug;

use super::error::RigError;
use super::transport::{RestResponse, RestTransport};

/// Result of a successful invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// A GET action's response.
    Response(RestResponse),
    /// A POST action was accepted.
    Submitted,
}

/// Executes `spec`, overlaying `overrides` on its static fields for POST.
///
/// # Errors
///
/// - [`RigError::Action`] on a non-success HTTP status.
/// - [`RigError::Transport`] when the request could not be completed.
pub async fn invoke_action(
    transport: &dyn RestTransport,
    spec: &ActionSpec,
    overrides: &Map<String, Value>,
) -> Result<ActionOutcome, RigError> {
    let response = match spec.method {
        HttpMethod::Get => {
            if !overrides.is_empty() {
                debug!("action '{}' is GET; ignoring {} field(s)", spec.name, overrides.len());
            }
            transport.get(&spec.target, &spec.content_type).await?
        }
        HttpMethod::Post => {
            let body = spec.request_body(overrides);
            debug!("POST {} {}", spec.target, body);
            transport
                .post_json(&spec.target, &spec.content_type, &body)
                .await?
        }
    };

    if !response.is_success() {
        return Err(RigError::Action {
            action: spec.name.clone(),
            status: response.status,
        });
    }

    Ok(match spec.method {
        HttpMethod::Get => ActionOutcome::Response(response),
        HttpMethod::Post => ActionOutcome::Submitted,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
