//! Frame pump - drives a session from an async frame stream

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::{SessionCoordinator, TrackingFrame};

/// Frame receiver channel
pub type FrameReceiver = mpsc::Receiver<TrackingFrame>;

/// Frame sender channel
pub type FrameSender = mpsc::Sender<TrackingFrame>;

/// Start a background task feeding `frames` through the session
///
/// Frames are handled one at a time in arrival order and forwarded,
/// enriched, on the returned channel. The task ends when the input closes
/// or the output receiver is dropped, and yields the number of frames it
/// forwarded.
pub fn spawn_frame_pump(
    session: Arc<SessionCoordinator>,
    mut frames: FrameReceiver,
    buffer_size: usize,
) -> (FrameReceiver, JoinHandle<u64>) {
    let (tx, rx) = mpsc::channel(buffer_size.max(1));

    let handle = tokio::spawn(async move {
        let mut forwarded = 0u64;
        while let Some(frame) = frames.recv().await {
            let frame = session.on_frame(frame);
            if tx.send(frame).await.is_err() {
                debug!(forwarded, "frame consumer gone, pump stopping");
                break;
            }
            forwarded += 1;
        }
        forwarded
    });

    (rx, handle)
}
