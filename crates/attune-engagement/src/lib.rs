//! Attune Engagement - behavioral signals from the per-frame sample stream
//!
//! Raw geometric readings (head position, shoulder line, gaze vector) are
//! folded into three time-bounded sliding windows. Each update derives:
//!
//! - Nodding: direction flips of significant head-y movement
//! - Posture: recent shoulder level against the window's baseline
//! - Eye contact: a two-state machine tracking cumulative contact time
//!
//! and a weighted overall engagement score in [0, 1].
//!
//! All timing uses caller-supplied timestamps; the processor never reads a
//! clock. Callers must `reset` the processor at the start of every new
//! conversation, otherwise contact time from the previous one carries over.

pub mod config;
pub mod processor;
pub mod score;
pub mod signals;
pub mod state;
pub mod window;

pub use config::*;
pub use processor::*;
pub use score::*;
pub use signals::*;
pub use state::*;
pub use window::*;
