//! Machine wait-signals.
//!
//! Every frame on the machine-state feed recomputes three boolean flags
//! from scratch.  Nothing accumulates: the last frame wins.
//!
//! ```text
//! state        ready  not_ready  closing_or_ready
//! "Ready"      true   false      true
//! "Closing"    false  true       true
//! anything     false  true       false
//! ```
//!
//! The flags are not one exclusive enum: `closing_or_ready` overlaps
//! `ready` for `"Ready"` and overlaps `not_ready` for `"Closing"`.  The rule
//! is kept exactly as the server's clients have always observed it.

use serde::{Deserialize, Serialize};

/// Machine state in which every test can run.
pub const STATE_READY: &str = "Ready";

/// Machine state in which the box is closing; some tests may run, but the
/// box is not yet shielded and the robot is unpowered.
pub const STATE_CLOSING: &str = "Closing";

/// The three flags derived from the latest machine state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineSignals {
    /// The machine is `Ready`.
    pub ready: bool,
    /// The machine is in any state other than `Ready`.
    pub not_ready: bool,
    /// The machine is `Closing` or `Ready`.
    pub closing_or_ready: bool,
}

impl MachineSignals {
    /// Recomputes all three flags from one state string.
    ///
    /// ```rust
    /// use rigsync_core::MachineSignals;
    ///
    /// let s = MachineSignals::from_state("Ready");
    /// assert!(s.ready && s.closing_or_ready && !s.not_ready);
    /// ```
    pub fn from_state(state: &str) -> Self {
        let ready = state == STATE_READY;
        Self {
            ready,
            not_ready: !ready,
            closing_or_ready: state == STATE_CLOSING || ready,
        }
    }

    /// Returns the flag selected by `signal`.
    pub fn is_set(&self, signal: MachineSignal) -> bool {
        match signal {
            MachineSignal::Ready => self.ready,
            MachineSignal::NotReady => self.not_ready,
            MachineSignal::ClosingOrReady => self.closing_or_ready,
        }
    }
}

/// Selects one of the three [`MachineSignals`] flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MachineSignal {
    /// [`MachineSignals::ready`].
    Ready,
    /// [`MachineSignals::not_ready`].
    NotReady,
    /// [`MachineSignals::closing_or_ready`].
    ClosingOrReady,
}

impl MachineSignal {
    /// Evaluates this signal against a snapshot read of the machine state.
    ///
    /// Used to short-circuit a wait before touching the live flag.
    pub fn satisfied_by(self, state: &str) -> bool {
        MachineSignals::from_state(state).is_set(self)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
