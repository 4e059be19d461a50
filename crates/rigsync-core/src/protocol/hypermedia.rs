//! Serde types for the machine's hypermedia entity graph.
//!
//! Every REST document the machine serves has the same general shape: a
//! `properties` object, an optional list of linked sub-resources
//! (`entities`), and a list of typed operations (`actions`).  Applications
//! additionally expose `blocked_actions`, operations that exist but that the
//! server may currently refuse.
//!
//! ```json
//! {
//!   "properties": {"name": "camera", "alias": "cam", "state": "Ready"},
//!   "href": "http://rig/api/applications/camera",
//!   "actions": [
//!     {"name": "start", "method": "POST", "href": "http://rig/api/applications/camera/start",
//!      "type": "application/json",
//!      "fields": [{"name": "mode", "value": "auto"}, {"name": "duration"}]}
//!   ]
//! }
//! ```
//!
//! Unknown keys are ignored everywhere so the client keeps working when the
//! server grows new fields.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Any document in the entity graph: the root (`/api`), the application
/// list (`/api/applications`), or an application's detail document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityDocument {
    /// Free-form properties.  The root and every application carry `state`.
    #[serde(default)]
    pub properties: Map<String, Value>,

    /// Self link, when the server includes one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,

    /// Linked sub-resources (only the application list has these).
    #[serde(default)]
    pub entities: Vec<EntityLink>,

    /// Operations currently available.
    #[serde(default)]
    pub actions: Vec<ActionDocument>,

    /// Operations that exist but may be rejected server-side right now.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocked_actions: Option<Vec<ActionDocument>>,
}

impl EntityDocument {
    /// Returns the `properties.state` string, if present.
    pub fn state(&self) -> Option<&str> {
        self.properties.get("state").and_then(Value::as_str)
    }
}

/// One entry of the application list's `entities` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityLink {
    /// Summary properties: `name`, optional `alias`, `state`, ...
    #[serde(default)]
    pub properties: Map<String, Value>,

    /// URL of the entity's full detail document.
    pub href: String,
}

impl EntityLink {
    /// Canonical application name (`properties.name`).
    pub fn name(&self) -> Option<&str> {
        self.properties.get("name").and_then(Value::as_str)
    }

    /// Alias (`properties.alias`), treating an empty string as absent.
    pub fn alias(&self) -> Option<&str> {
        self.properties
            .get("alias")
            .and_then(Value::as_str)
            .filter(|alias| !alias.is_empty())
    }

    /// Current application state (`properties.state`), if reported.
    pub fn state(&self) -> Option<&str> {
        self.properties.get("state").and_then(Value::as_str)
    }
}

/// A typed remote operation as declared by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionDocument {
    /// Action name, unique within its entity.
    pub name: String,

    /// Declared HTTP method (`"GET"`, `"POST"`, ...).
    #[serde(default = "default_method")]
    pub method: String,

    /// Target URL.
    pub href: String,

    /// Content type to send with the request.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,

    /// Declared request fields.
    #[serde(default)]
    pub fields: Vec<FieldDocument>,
}

fn default_method() -> String {
    "GET".to_string()
}

/// One declared field of an action.
///
/// `value` distinguishes "key absent" (`None`) from "key present" (`Some`,
/// even when the JSON value is `null`): only fields that carry the key are
/// server-provided defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDocument {
    /// Field name, used as the JSON body key.
    pub name: String,

    /// Server-provided default, when the `value` key is present.
    #[serde(
        default,
        deserialize_with = "deserialize_present",
        skip_serializing_if = "Option::is_none"
    )]
    pub value: Option<Value>,
}

/// Maps any present JSON value (including `null`) to `Some`.
///
/// Combined with `#[serde(default)]`, an absent key stays `None`.
fn deserialize_present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_entity_document_defaults_missing_sections() {
        // Arrange: a bare document with nothing but properties
        let doc: EntityDocument =
            serde_json::from_value(json!({"properties": {"state": "Ready"}})).unwrap();

        // Assert
        assert_eq!(doc.state(), Some("Ready"));
        assert!(doc.entities.is_empty());
        assert!(doc.actions.is_empty());
        assert!(doc.blocked_actions.is_none());
        assert!(doc.href.is_none());
    }

    #[test]
    fn test_entity_link_alias_empty_string_is_absent() {
        let link: EntityLink = serde_json::from_value(json!({
            "properties": {"name": "camera", "alias": ""},
            "href": "http://rig/api/applications/camera"
        }))
        .unwrap();

        assert_eq!(link.name(), Some("camera"));
        assert_eq!(link.alias(), None);
    }

    #[test]
    fn test_entity_link_alias_null_is_absent() {
        let link: EntityLink = serde_json::from_value(json!({
            "properties": {"name": "camera", "alias": null},
            "href": "h"
        }))
        .unwrap();
        assert_eq!(link.alias(), None);
    }

    #[test]
    fn test_entity_link_with_alias_and_state() {
        let link: EntityLink = serde_json::from_value(json!({
            "properties": {"name": "camera", "alias": "cam", "state": "Idle"},
            "href": "h"
        }))
        .unwrap();
        assert_eq!(link.alias(), Some("cam"));
        assert_eq!(link.state(), Some("Idle"));
    }

    #[test]
    fn test_field_without_value_key_has_no_default() {
        let field: FieldDocument = serde_json::from_value(json!({"name": "duration"})).unwrap();
        assert_eq!(field.value, None);
    }

    #[test]
    fn test_field_with_null_value_key_is_present() {
        // A present-but-null value is still a server-provided default.
        let field: FieldDocument =
            serde_json::from_value(json!({"name": "target", "value": null})).unwrap();
        assert_eq!(field.value, Some(Value::Null));
    }

    #[test]
    fn test_action_document_type_key_maps_to_content_type() {
        let action: ActionDocument = serde_json::from_value(json!({
            "name": "start",
            "method": "POST",
            "href": "http://rig/start",
            "type": "application/json"
        }))
        .unwrap();
        assert_eq!(action.content_type.as_deref(), Some("application/json"));
        assert!(action.fields.is_empty());
    }

    #[test]
    fn test_action_document_method_defaults_to_get() {
        let action: ActionDocument =
            serde_json::from_value(json!({"name": "log", "href": "http://rig/log"})).unwrap();
        assert_eq!(action.method, "GET");
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let doc: EntityDocument = serde_json::from_value(json!({
            "class": ["application"],
            "links": [{"rel": ["self"], "href": "x"}],
            "properties": {}
        }))
        .unwrap();
        assert!(doc.properties.is_empty());
    }
}
