//! Attune Runtime - Session coordination
//!
//! A session runs through three stages:
//! 1. Select a tracking configuration for the context
//! 2. Start the configuration's models (critical first), applying the
//!    configuration's fallback strategy to failures
//! 3. Process frames: when engagement analytics is on, each frame's sample
//!    is scored and the score merged onto the frame
//!
//! `stop` is safe at any time, including during an in-flight `start`, and
//! always leaves no model running.

pub mod config;
pub mod feed;
pub mod lifecycle;
pub mod model;
pub mod observability;
pub mod session;

pub use config::*;
pub use feed::*;
pub use lifecycle::*;
pub use model::*;
pub use observability::*;
pub use session::*;
