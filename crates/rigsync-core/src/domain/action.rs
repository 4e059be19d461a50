//! Invokable actions represented as data.
//!
//! The machine describes its operations at runtime (see
//! [`ActionDocument`]).  Rather than synthesising a callable per action, the
//! client keeps each one as an [`ActionSpec`] value and executes it through a
//! single generic invoke operation in the client crate.  This keeps the
//! action surface introspectable (the CLI can list it) and testable without
//! a server.
//!
//! # Static fields vs caller fields
//!
//! A declared field that carries a `value` key is a *static* field: the
//! server supplies its default.  Fields without `value` only exist when the
//! caller provides them.  [`ActionSpec::request_body`] overlays the caller's
//! values on the static ones, caller winning on collisions.  The `ActionSpec` itself
//! is never mutated.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::protocol::hypermedia::{ActionDocument, EntityDocument};

/// Content type used when an action does not declare one.
pub const DEFAULT_CONTENT_TYPE: &str = "application/json";

/// Action name → spec, for one application (or for the machine's root).
pub type ActionSet = BTreeMap<String, ActionSpec>;

/// HTTP verb of an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HttpMethod {
    /// Read-only request; the raw response is handed back to the caller.
    Get,
    /// Side-effecting request with a JSON body; no return value.
    Post,
}

impl HttpMethod {
    /// Maps a declared method string to a verb.
    ///
    /// `POST` (any case) is [`HttpMethod::Post`]; every other value is
    /// treated as [`HttpMethod::Get`].
    pub fn from_declared(method: &str) -> Self {
        if method.eq_ignore_ascii_case("POST") {
            HttpMethod::Post
        } else {
            HttpMethod::Get
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpMethod::Get => f.write_str("GET"),
            HttpMethod::Post => f.write_str("POST"),
        }
    }
}

/// An invokable remote operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionSpec {
    /// Action name.
    pub name: String,
    /// HTTP verb.
    pub method: HttpMethod,
    /// Target URL.
    pub target: String,
    /// `Content-Type` header value sent with the request.
    pub content_type: String,
    /// Server-provided field defaults.
    pub static_fields: Map<String, Value>,
}

impl ActionSpec {
    /// Builds a spec from a declared action.
    ///
    /// Only fields carrying a `value` key become static fields.
    pub fn from_document(doc: &ActionDocument) -> Self {
        let static_fields = doc
            .fields
            .iter()
            .filter_map(|field| {
                field
                    .value
                    .as_ref()
                    .map(|value| (field.name.clone(), value.clone()))
            })
            .collect();

        Self {
            name: doc.name.clone(),
            method: HttpMethod::from_declared(&doc.method),
            target: doc.href.clone(),
            content_type: doc
                .content_type
                .clone()
                .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string()),
            static_fields,
        }
    }

    /// Returns the POST body: static fields overlaid by `overrides`.
    ///
    /// ```rust
    /// use rigsync_core::{ActionSpec, HttpMethod};
    /// use serde_json::{json, Map};
    ///
    /// let mut static_fields = Map::new();
    /// static_fields.insert("mode".into(), json!("auto"));
    /// let spec = ActionSpec {
    ///     name: "start".into(),
    ///     method: HttpMethod::Post,
    ///     target: "http://rig/start".into(),
    ///     content_type: "application/json".into(),
    ///     static_fields,
    /// };
    ///
    /// let mut overrides = Map::new();
    /// overrides.insert("mode".into(), json!("manual"));
    /// assert_eq!(spec.request_body(&overrides), json!({"mode": "manual"}));
    /// ```
    pub fn request_body(&self, overrides: &Map<String, Value>) -> Value {
        let mut body = self.static_fields.clone();
        for (key, value) in overrides {
            body.insert(key.clone(), value.clone());
        }
        Value::Object(body)
    }
}

/// Builds the action set of a detail document.
///
/// `actions` are inserted first, then `blocked_actions`; a blocked action
/// with the same name as a plain one replaces it.  Blocked actions are
/// exposed like any other: the server may reject them when invoked.
pub fn action_set_from_detail(detail: &EntityDocument) -> ActionSet {
    let blocked = detail.blocked_actions.iter().flatten();
    detail
        .actions
        .iter()
        .chain(blocked)
        .map(|doc| (doc.name.clone(), ActionSpec::from_document(doc)))
        .collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
