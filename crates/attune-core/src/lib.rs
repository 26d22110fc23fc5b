//! Attune Core - Fundamental types and primitives
//!
//! This crate defines the core types shared by every Attune component:
//! - Time primitives (caller-supplied `Timestamp`)
//! - Device capability profiles
//! - Tracking model descriptors and tracking-mode presets
//! - The immutable per-session `TrackingConfiguration`
//! - Per-frame engagement samples
//! - The error taxonomy

pub mod capability;
pub mod config;
pub mod error;
pub mod mode;
pub mod model;
pub mod sample;
pub mod time;

pub use capability::*;
pub use config::*;
pub use error::*;
pub use mode::*;
pub use model::*;
pub use sample::*;
pub use time::*;
