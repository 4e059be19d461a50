//! Application wait rules.
//!
//! A caller waiting for an application to reach `target` is woken by any
//! state in its [`AcceptableStates`].  With bail-on-error the set also
//! contains the error states, so a failing application ends the wait early
//! instead of running the caller into its timeout.  [`WaitVerdict`] then
//! tells the two outcomes apart.

use std::collections::BTreeSet;

/// States that end a bail-on-error wait regardless of its target.
pub const ERROR_STATES: [&str; 3] = ["error", "Error", "ErrorState"];

/// The set of states that resolve one wait.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptableStates {
    target: String,
    states: BTreeSet<String>,
}

impl AcceptableStates {
    /// `{target}`, plus [`ERROR_STATES`] when `bail_on_error` is set.
    pub fn new(target: &str, bail_on_error: bool) -> Self {
        let mut states = BTreeSet::new();
        states.insert(target.to_string());
        if bail_on_error {
            states.extend(ERROR_STATES.iter().map(|s| s.to_string()));
        }
        Self {
            target: target.to_string(),
            states,
        }
    }

    /// The state the caller actually wants.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Returns `true` when `state` resolves the wait.
    pub fn contains(&self, state: &str) -> bool {
        self.states.contains(state)
    }

    /// Iterates over every acceptable state.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.states.iter().map(String::as_str)
    }
}

/// How a resolved wait turned out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitVerdict {
    /// The application reached the target state.
    Reached,
    /// The application reached some other acceptable state (an error state).
    Diverted {
        /// The state actually reached.
        actual: String,
    },
}

impl WaitVerdict {
    /// Judges `resolved` against the wait's target.
    pub fn judge(acceptable: &AcceptableStates, resolved: &str) -> Self {
        if resolved == acceptable.target() {
            WaitVerdict::Reached
        } else {
            WaitVerdict::Diverted {
                actual: resolved.to_string(),
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
