// ABOUTME: Quiet-window debouncing of change notifications into batches
// ABOUTME: Blocks for the first event, then absorbs events until the stream goes quiet

use crossbeam_channel::{Receiver, RecvTimeoutError};
use gotestwatch_core::{ChangeBatch, ChangeEvent};
use std::time::Duration;
use tracing::debug;

/// Wait for one event, then keep collecting until `quiet` passes with no new
/// arrival. Every arrival restarts the window, so a steady burst extends the
/// batch until it stops.
///
/// Returns `None` if the channel closes before the first event. A channel
/// closing mid-batch ends the batch early.
pub fn collect<T>(rx: &Receiver<T>, quiet: Duration) -> Option<Vec<T>> {
    let first = rx.recv().ok()?;
    let mut events = vec![first];
    loop {
        match rx.recv_timeout(quiet) {
            Ok(event) => events.push(event),
            Err(RecvTimeoutError::Timeout) => return Some(events),
            Err(RecvTimeoutError::Disconnected) => {
                debug!("Event channel closed with {} pending event(s)", events.len());
                return Some(events);
            }
        }
    }
}

/// Groups file-change notifications into batches separated by a quiet window.
///
/// Batches are held in a growable vector; real bursts (an editor save, a
/// checkout, a project-wide rename) stay in the hundreds to low thousands of
/// events.
#[derive(Debug, Clone, Copy)]
pub struct DebounceCollector {
    quiet_window: Duration,
}

impl DebounceCollector {
    pub fn new(quiet_window: Duration) -> Self {
        Self { quiet_window }
    }

    pub fn next_batch(&self, rx: &Receiver<ChangeEvent>) -> Option<ChangeBatch> {
        collect(rx, self.quiet_window).map(ChangeBatch::new)
    }
}
