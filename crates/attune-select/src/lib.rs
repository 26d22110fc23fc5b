//! Attune Select - Tracking configuration selection
//!
//! Merges device capability, coach, partner, lesson and user inputs into one
//! immutable `TrackingConfiguration` while holding the hard model cap:
//! the primary face model plus at most one secondary.
//!
//! Every secondary-model request is collected with its priority, the highest
//! wins (declaration order breaks ties), and each losing request is surfaced
//! as a session insight. Selection never fails: invalid capabilities and
//! unknown profile ids fall back to the casual preset with a warning.

pub mod context;
pub mod profile;
pub mod selector;

pub use context::*;
pub use profile::*;
pub use selector::*;
