//! Attune Test Harness - Deterministic collaborators and synthetic streams
//!
//! This crate provides:
//! - Scripted tracking models with a shared call journal
//! - Synthetic engagement sample streams on synthetic time
//! - An end-to-end session scenario harness

pub mod generator;
pub mod scenario;
pub mod scripted;

pub use generator::*;
pub use scenario::*;
pub use scripted::*;
