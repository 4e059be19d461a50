//! Domain layer: the model the client builds from the machine's documents.
//!
//! - [`action`] – [`ActionSpec`](action::ActionSpec), an invokable operation
//!   represented as data.
//! - [`registry`] – the immutable application registry and its
//!   canonical-name/alias registration rule.
//! - [`signals`] – the three machine wait-signals and their recompute rule.
//! - [`wait`] – which application states end a wait, and how the resolved
//!   state is judged.

pub mod action;
pub mod registry;
pub mod signals;
pub mod wait;
