//! Hypermedia resolver.
//!
//! Walks the machine's entity graph once at connect time:
//!
//! ```text
//! GET {base}/api/applications ──► entities[] ──► for each (document order):
//!        registration_for(link) ── Skipped ──► (no fetch)
//!              │ Canonical / Alias
//!              ▼
//!        GET link.href ──► action_set_from_detail ──► registry.register
//!
//! GET {base}/api ──► (href or {base}/api) ──► state-trigger action set
//! ```
//!
//! One entity whose detail cannot be read does not fail the walk: the
//! failure is logged and the entity is registered with no actions.  Failing
//! to read the application list or the root document does fail it.

use std::sync::Arc;

use rigsync_core::domain::action::action_set_from_detail;
use rigsync_core::protocol::{API_ROOT_PATH, APPLICATIONS_PATH};
use rigsync_core::{ActionSet, Application, ApplicationRegistry, EntityDocument, Registration};
use serde_json::Value;
use tracing::{debug, info, warn};

use super::error::RigError;
use super::transport::RestTransport;

/// Fetches one detail document and builds its action set.
///
/// # Errors
///
/// Returns [`RigError::Resolution`] when the document cannot be fetched or
/// does not decode as an entity document.
pub async fn resolve_actions(
    transport: &dyn RestTransport,
    href: &str,
) -> Result<ActionSet, RigError> {
    let value = transport
        .get_document(href)
        .await
        .map_err(|e| RigError::Resolution {
            href: href.to_string(),
            reason: e.to_string(),
        })?;
    let detail: EntityDocument =
        serde_json::from_value(value).map_err(|e| RigError::Resolution {
            href: href.to_string(),
            reason: e.to_string(),
        })?;
    Ok(action_set_from_detail(&detail))
}

/// Builds the application registry and the machine's state-trigger actions.
///
/// # Errors
///
/// - [`RigError::Transport`] if the application list or root document
///   cannot be fetched.
/// - [`RigError::MalformedDocument`] if either of them does not decode.
///
/// Failures on individual application detail documents are not errors.
pub async fn resolve_registry(
    transport: &dyn RestTransport,
    base_url: &str,
) -> Result<(ApplicationRegistry, ActionSet), RigError> {
    let list_url = format!("{base_url}{APPLICATIONS_PATH}");
    let list = fetch_entity_document(transport, &list_url).await?;

    let mut registry = ApplicationRegistry::new();
    for link in &list.entities {
        let key = match registry.registration_for(link) {
            Registration::Skipped => {
                match link.name() {
                    Some(name) => debug!("skipping duplicate application '{name}' without alias"),
                    None => warn!("skipping application entry without a name at {}", link.href),
                }
                continue;
            }
            Registration::Canonical(key) | Registration::Alias(key) => key,
        };

        let actions = match resolve_actions(transport, &link.href).await {
            Ok(actions) => actions,
            Err(e) => {
                warn!("application '{key}': {e}; registering without actions");
                ActionSet::new()
            }
        };

        // `registration_for` already rejected nameless links.
        if let Some(application) = Application::from_link(link, Arc::new(actions)) {
            registry.register(application);
        }
    }

    let root_url = format!("{base_url}{API_ROOT_PATH}");
    let root = fetch_entity_document(transport, &root_url).await?;
    let trigger_url = root.href.as_deref().unwrap_or(&root_url);
    let state_triggers = if trigger_url == root_url {
        action_set_from_detail(&root)
    } else {
        resolve_actions(transport, trigger_url).await?
    };

    info!(
        "resolved {} application key(s) and {} state trigger(s)",
        registry.len(),
        state_triggers.len()
    );
    Ok((registry, state_triggers))
}

/// Fetches and decodes a document that connect cannot do without.
pub(crate) async fn fetch_entity_document(
    transport: &dyn RestTransport,
    url: &str,
) -> Result<EntityDocument, RigError> {
    let value: Value = transport.get_document(url).await?;
    serde_json::from_value(value).map_err(|e| RigError::MalformedDocument {
        url: url.to_string(),
        reason: e.to_string(),
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::transport::{MockRestTransport, TransportError};
    use serde_json::json;

    const BASE: &str = "http://rig";

    fn not_found(url: &str) -> TransportError {
        TransportError::Status {
            url: url.to_string(),
            status: 404,
        }
    }

    fn detail(action: &str) -> Value {
        json!({
            "properties": {"state": "Idle"},
            "actions": [{"name": action, "method": "POST", "href": format!("{BASE}/{action}")}]
        })
    }

    fn root() -> Value {
        json!({
            "properties": {"state": "Ready"},
            "actions": [{"name": "close", "method": "POST", "href": "http://rig/api/close"}]
        })
    }

    #[tokio::test]
    async fn test_resolve_actions_builds_action_set() {
        // Arrange
        let mut transport = MockRestTransport::new();
        transport
            .expect_get_document()
            .returning(|_| Ok(detail("start")));

        // Act
        let actions = resolve_actions(&transport, "http://rig/api/applications/a")
            .await
            .unwrap();

        // Assert
        assert_eq!(actions.len(), 1);
        assert_eq!(actions["start"].target, "http://rig/start");
    }

    #[tokio::test]
    async fn test_resolve_actions_transport_failure_is_resolution_error() {
        let mut transport = MockRestTransport::new();
        transport
            .expect_get_document()
            .returning(|url| Err(not_found(url)));

        let err = resolve_actions(&transport, "http://rig/api/applications/a")
            .await
            .unwrap_err();

        assert!(matches!(err, RigError::Resolution { ref href, .. } if href.ends_with("/a")));
    }

    #[tokio::test]
    async fn test_resolve_actions_non_object_document_is_resolution_error() {
        let mut transport = MockRestTransport::new();
        transport
            .expect_get_document()
            .returning(|_| Ok(json!(["not", "an", "entity"])));

        let err = resolve_actions(&transport, "h").await.unwrap_err();

        assert!(matches!(err, RigError::Resolution { .. }));
    }

    #[tokio::test]
    async fn test_resolve_registry_failed_detail_registers_empty_actions() {
        // Arrange: the second application's detail document is unreachable
        let mut transport = MockRestTransport::new();
        transport.expect_get_document().returning(|url| match url {
            "http://rig/api/applications" => Ok(json!({"entities": [
                {"properties": {"name": "camera"}, "href": "http://rig/api/applications/camera"},
                {"properties": {"name": "robot"}, "href": "http://rig/api/applications/robot"}
            ]})),
            "http://rig/api/applications/camera" => Ok(detail("capture")),
            "http://rig/api" => Ok(root()),
            other => Err(not_found(other)),
        });

        // Act
        let (registry, triggers) = resolve_registry(&transport, BASE).await.unwrap();

        // Assert
        assert_eq!(registry.len(), 2);
        assert!(registry.get("camera").unwrap().action("capture").is_some());
        assert!(registry.get("robot").unwrap().actions.is_empty());
        assert!(triggers.contains_key("close"));
    }

    #[tokio::test]
    async fn test_resolve_registry_skipped_entity_is_never_fetched() {
        // Arrange: a duplicate without alias; fetching its href would fail the test
        let mut transport = MockRestTransport::new();
        transport.expect_get_document().returning(|url| match url {
            "http://rig/api/applications" => Ok(json!({"entities": [
                {"properties": {"name": "camera"}, "href": "http://rig/api/applications/camera"},
                {"properties": {"name": "camera"}, "href": "http://rig/api/applications/dup"}
            ]})),
            "http://rig/api/applications/camera" => Ok(detail("capture")),
            "http://rig/api" => Ok(root()),
            other => panic!("unexpected fetch of {other}"),
        });

        let (registry, _) = resolve_registry(&transport, BASE).await.unwrap();

        assert_eq!(registry.keys().collect::<Vec<_>>(), vec!["camera"]);
    }

    #[tokio::test]
    async fn test_resolve_registry_root_href_is_followed_for_triggers() {
        let mut transport = MockRestTransport::new();
        transport.expect_get_document().returning(|url| match url {
            "http://rig/api/applications" => Ok(json!({"entities": []})),
            "http://rig/api" => Ok(json!({"properties": {}, "href": "http://rig/api/machine"})),
            "http://rig/api/machine" => Ok(detail("open")),
            other => Err(not_found(other)),
        });

        let (registry, triggers) = resolve_registry(&transport, BASE).await.unwrap();

        assert!(registry.is_empty());
        assert_eq!(triggers.keys().collect::<Vec<_>>(), vec!["open"]);
    }

    #[tokio::test]
    async fn test_resolve_registry_unreachable_list_fails_connect() {
        let mut transport = MockRestTransport::new();
        transport
            .expect_get_document()
            .returning(|url| Err(not_found(url)));

        let err = resolve_registry(&transport, BASE).await.unwrap_err();

        assert!(matches!(err, RigError::Transport(TransportError::Status { status: 404, .. })));
    }

    #[tokio::test]
    async fn test_resolve_registry_malformed_list_is_reported() {
        let mut transport = MockRestTransport::new();
        transport
            .expect_get_document()
            .returning(|_| Ok(json!({"entities": "nope"})));

        let err = resolve_registry(&transport, BASE).await.unwrap_err();

        assert!(matches!(err, RigError::MalformedDocument { .. }));
    }
}
