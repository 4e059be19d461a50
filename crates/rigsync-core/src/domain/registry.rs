//! The application registry.
//!
//! Built once at connect time from the application list and then only read.
//! Keys are application names; an application can be reachable under two
//! keys when the registration rule below adds its alias.
//!
//! # Registration rule
//!
//! Entities are registered in document order:
//!
//! | Canonical name already registered? | Entity alias | Effect                              |
//! |------------------------------------|--------------|-------------------------------------|
//! | no                                 | any          | insert under the canonical name     |
//! | yes                                | non-empty    | insert under the alias              |
//! | yes                                | none / empty | nothing                             |
//!
//! The first entry under a canonical name is never overwritten.  The
//! decision is made *before* the entity's detail document is fetched
//! ([`ApplicationRegistry::registration_for`]) so the resolver does not fetch
//! actions for entities that will be dropped.

use std::collections::btree_map::{self, BTreeMap};
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::domain::action::{ActionSet, ActionSpec};
use crate::protocol::hypermedia::EntityLink;

/// One application of the machine.
#[derive(Debug, Clone, PartialEq)]
pub struct Application {
    /// Canonical name (`properties.name`).
    pub name: String,
    /// Alias (`properties.alias`), when non-empty.
    pub alias: Option<String>,
    /// URL of the detail document.
    pub href: String,
    /// Summary properties as reported at connect time (includes `state`).
    pub properties: Map<String, Value>,
    /// Invokable actions, shared between the canonical and alias keys.
    pub actions: Arc<ActionSet>,
}

impl Application {
    /// Builds an application from its list entry and resolved actions.
    ///
    /// Returns `None` when the entry has no `properties.name`.
    pub fn from_link(link: &EntityLink, actions: Arc<ActionSet>) -> Option<Self> {
        let name = link.name()?.to_string();
        Some(Self {
            name,
            alias: link.alias().map(str::to_string),
            href: link.href.clone(),
            properties: link.properties.clone(),
            actions,
        })
    }

    /// State captured at connect time.
    pub fn state(&self) -> Option<&str> {
        self.properties.get("state").and_then(Value::as_str)
    }

    /// Looks up one action by name.
    pub fn action(&self, name: &str) -> Option<&ActionSpec> {
        self.actions.get(name)
    }
}

/// Where an entity of the application list ends up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Registration {
    /// First occurrence of the canonical name.
    Canonical(String),
    /// Canonical name taken; registered under its alias instead.
    Alias(String),
    /// Canonical name taken and no alias: not registered.
    Skipped,
}

/// Immutable map of key (canonical name or alias) → application.
#[derive(Debug, Clone, Default)]
pub struct ApplicationRegistry {
    entries: BTreeMap<String, Arc<Application>>,
}

impl ApplicationRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decides under which key `link` would be registered.
    pub fn registration_for(&self, link: &EntityLink) -> Registration {
        let Some(name) = link.name() else {
            return Registration::Skipped;
        };
        if !self.entries.contains_key(name) {
            return Registration::Canonical(name.to_string());
        }
        match link.alias() {
            Some(alias) => Registration::Alias(alias.to_string()),
            None => Registration::Skipped,
        }
    }

    /// Inserts `application` according to the registration rule.
    ///
    /// Returns the key it was stored under, or `None` when skipped.
    pub fn register(&mut self, application: Application) -> Option<String> {
        let key = if !self.entries.contains_key(&application.name) {
            application.name.clone()
        } else {
            application.alias.clone()?
        };
        self.entries.insert(key.clone(), Arc::new(application));
        Some(key)
    }

    /// Looks up an application by canonical name or registered alias.
    pub fn get(&self, key: &str) -> Option<&Arc<Application>> {
        self.entries.get(key)
    }

    /// Returns `true` when `key` is registered.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// All registered keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Iterates over `(key, application)` pairs in key order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, Arc<Application>> {
        self.entries.iter()
    }

    /// Number of registered keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
