//! Progress computation and progress observers.

use tokio::sync::mpsc::UnboundedSender;

/// Computes the completion percentage for `received` out of `declared` bytes.
///
/// The value is not clamped: a source that sends more than it declared
/// reports more than `100.0`. A zero declared total is reported as `100.0`;
/// sessions never stream zero-length resources, so this only shows up at a
/// terminal signal.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn percentage(received: u64, declared: u64) -> f64 {
    if declared == 0 {
        return 100.0;
    }
    100.0 * received as f64 / declared as f64
}

/// Point-in-time view of a transfer's progress.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressSnapshot {
    /// Bytes received so far.
    pub received_bytes: u64,
    /// Total declared by the source's `Content-Length`.
    pub declared_total_bytes: u64,
    /// `100 * received / declared`, unclamped.
    pub percentage: f64,
}

impl ProgressSnapshot {
    /// Builds a snapshot and derives its percentage.
    #[must_use]
    pub fn new(received_bytes: u64, declared_total_bytes: u64) -> Self {
        Self {
            received_bytes,
            declared_total_bytes,
            percentage: percentage(received_bytes, declared_total_bytes),
        }
    }

    /// Returns `true` if more bytes arrived than were declared.
    #[must_use]
    pub fn is_over_declared(&self) -> bool {
        self.received_bytes > self.declared_total_bytes
    }
}

/// Observer of the snapshots a session emits while streaming.
///
/// `finish` is called once, when the session stops emitting snapshots.
pub trait ProgressSink {
    /// Receives the snapshot taken right after a chunk was appended.
    fn on_progress(&mut self, snapshot: ProgressSnapshot);

    /// Marks the end of the snapshot sequence.
    fn finish(&mut self) {}
}

impl<F> ProgressSink for F
where
    F: FnMut(ProgressSnapshot),
{
    fn on_progress(&mut self, snapshot: ProgressSnapshot) {
        self(snapshot);
    }
}

/// Ignores all progress.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn on_progress(&mut self, _snapshot: ProgressSnapshot) {}
}

/// Forwards snapshots over a tokio channel.
///
/// The sender is released on `finish`, so a receiver loop ends when the
/// session leaves streaming.
#[derive(Debug)]
pub struct ChannelProgress {
    sender: Option<UnboundedSender<ProgressSnapshot>>,
}

impl ChannelProgress {
    /// Wraps the sending half of an unbounded channel.
    #[must_use]
    pub fn new(sender: UnboundedSender<ProgressSnapshot>) -> Self {
        Self {
            sender: Some(sender),
        }
    }
}

impl ProgressSink for ChannelProgress {
    fn on_progress(&mut self, snapshot: ProgressSnapshot) {
        if let Some(sender) = &self.sender {
            // Receiver gone means nobody is watching; the transfer carries on.
            if sender.send(snapshot).is_err() {
                self.sender = None;
            }
        }
    }

    fn finish(&mut self) {
        self.sender = None;
    }
}
