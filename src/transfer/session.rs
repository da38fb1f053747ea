//! One end-to-end transfer, driven as an explicit state machine.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use futures_util::StreamExt;
use tracing::{debug, info, instrument, warn};

use super::accumulator::ByteAccumulator;
use super::cancel::CancelSignal;
use super::error::{LengthMismatchWarning, TransferError};
use super::progress::{ProgressSink, ProgressSnapshot};
use super::source::{ChunkStream, SourceResponse, TransferSource};
use crate::artifact::{ArtifactFinalizer, ArtifactSink, Delivery};

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// Lifecycle state of a [`TransferSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferStatus {
    /// Created, not started.
    Idle,
    /// Waiting for the connection and response headers.
    Requesting,
    /// Reading body chunks.
    Streaming,
    /// Building the artifact and handing it to the sink.
    Finalizing,
    /// The artifact was delivered.
    Completed,
    /// A fatal error ended the session; see [`TransferSession::last_error`].
    Failed,
    /// Cancellation was observed at a checkpoint.
    Cancelled,
}

impl TransferStatus {
    /// Returns `true` for states with no way out.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    /// Returns `true` if the state machine allows moving from `self` to `next`.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        use TransferStatus::{
            Cancelled, Completed, Failed, Finalizing, Idle, Requesting, Streaming,
        };
        match (self, next) {
            (from, _) if from.is_terminal() => false,
            (_, Cancelled) => true,
            (Idle, Requesting)
            | (Requesting, Failed | Streaming)
            | (Streaming, Streaming | Failed | Finalizing)
            | (Finalizing, Completed | Failed) => true,
            _ => false,
        }
    }
}

impl fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Requesting => "requesting",
            Self::Streaming => "streaming",
            Self::Finalizing => "finalizing",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

/// Why the driving loop stopped early.
enum Halt {
    Failed(TransferError),
    Cancelled,
}

impl From<TransferError> for Halt {
    fn from(error: TransferError) -> Self {
        Self::Failed(error)
    }
}

/// A single attempt to fetch one resource and deliver it as an artifact.
///
/// The session is owned by its caller and makes exactly one attempt; retrying
/// means building a new session. [`run`](Self::run) never returns an error:
/// inspect [`status`](Self::status), [`last_error`](Self::last_error) and
/// [`length_mismatch`](Self::length_mismatch) afterwards.
///
/// # Example
///
/// ```no_run
/// use clipfetch_core::artifact::FileSink;
/// use clipfetch_core::transfer::{HttpSource, NoProgress, TransferSession, TransferStatus};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let source = HttpSource::new()?;
/// let sink = FileSink::new("./downloads");
/// let mut session = TransferSession::new("https://cdn.example.com/clip.mp4");
/// let status = session.run(&source, &sink, "My Clip", &mut NoProgress).await;
/// if status == TransferStatus::Failed {
///     eprintln!("{}", session.last_error().map(ToString::to_string).unwrap_or_default());
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct TransferSession {
    id: u64,
    locator: String,
    status: TransferStatus,
    declared_total_bytes: Option<u64>,
    received_bytes: u64,
    last_error: Option<TransferError>,
    length_mismatch: Option<LengthMismatchWarning>,
    delivery: Option<Delivery>,
    finalizer: ArtifactFinalizer,
    cancel: CancelSignal,
}

impl TransferSession {
    /// Creates an idle session for `locator`.
    pub fn new(locator: impl Into<String>) -> Self {
        Self {
            id: NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed),
            locator: locator.into(),
            status: TransferStatus::Idle,
            declared_total_bytes: None,
            received_bytes: 0,
            last_error: None,
            length_mismatch: None,
            delivery: None,
            finalizer: ArtifactFinalizer::default(),
            cancel: CancelSignal::new(),
        }
    }

    /// Uses `finalizer` (and its MIME type) for the artifact.
    #[must_use]
    pub fn with_finalizer(mut self, finalizer: ArtifactFinalizer) -> Self {
        self.finalizer = finalizer;
        self
    }

    /// Observes `cancel` at every checkpoint.
    #[must_use]
    pub fn with_cancel_signal(mut self, cancel: CancelSignal) -> Self {
        self.cancel = cancel;
        self
    }

    /// Returns a handle that cancels this session.
    #[must_use]
    pub fn cancel_signal(&self) -> CancelSignal {
        self.cancel.clone()
    }

    /// Process-unique id, used to key log events.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Locator this session fetches.
    #[must_use]
    pub fn locator(&self) -> &str {
        &self.locator
    }

    /// Current state.
    #[must_use]
    pub fn status(&self) -> TransferStatus {
        self.status
    }

    /// Total declared by the source, once headers were validated.
    #[must_use]
    pub fn declared_total_bytes(&self) -> Option<u64> {
        self.declared_total_bytes
    }

    /// Bytes received so far.
    #[must_use]
    pub fn received_bytes(&self) -> u64 {
        self.received_bytes
    }

    /// The error that failed the session; `None` unless [`TransferStatus::Failed`].
    #[must_use]
    pub fn last_error(&self) -> Option<&TransferError> {
        self.last_error.as_ref()
    }

    /// Received/declared disagreement on a completed session.
    #[must_use]
    pub fn length_mismatch(&self) -> Option<LengthMismatchWarning> {
        self.length_mismatch
    }

    /// The sink's receipt on a completed session.
    #[must_use]
    pub fn delivery(&self) -> Option<&Delivery> {
        self.delivery.as_ref()
    }

    /// Runs the transfer to a terminal state and returns it.
    ///
    /// Snapshots go to `progress` after every chunk; `progress.finish()` is
    /// called once when no more snapshots will follow. On success the
    /// artifact, named after `display_name`, is handed to `sink`.
    ///
    /// Cancellation is checked before the request, before every chunk read
    /// and before finalization. Calling `run` on a session that already left
    /// [`TransferStatus::Idle`] does nothing and returns the current state.
    #[instrument(
        name = "transfer",
        skip_all,
        fields(session_id = self.id, locator = %self.locator)
    )]
    pub async fn run<S, K, P>(
        &mut self,
        source: &S,
        sink: &K,
        display_name: &str,
        progress: &mut P,
    ) -> TransferStatus
    where
        S: TransferSource + ?Sized,
        K: ArtifactSink + ?Sized,
        P: ProgressSink + ?Sized,
    {
        if self.status != TransferStatus::Idle {
            warn!(status = %self.status, "session already started; ignoring run");
            return self.status;
        }

        let outcome = self.drive(source, sink, display_name, progress).await;
        // Sessions that stopped before streaming still owe the observer its end marker.
        if self.declared_total_bytes.is_none() {
            progress.finish();
        }

        match outcome {
            Ok(()) => {}
            Err(Halt::Failed(error)) => {
                warn!(kind = ?error.kind(), error = %error, "transfer failed");
                self.last_error = Some(error);
                self.transition(TransferStatus::Failed);
            }
            Err(Halt::Cancelled) => {
                info!(received = self.received_bytes, "transfer cancelled");
                self.transition(TransferStatus::Cancelled);
            }
        }
        self.status
    }

    async fn drive<S, K, P>(
        &mut self,
        source: &S,
        sink: &K,
        display_name: &str,
        progress: &mut P,
    ) -> Result<(), Halt>
    where
        S: TransferSource + ?Sized,
        K: ArtifactSink + ?Sized,
        P: ProgressSink + ?Sized,
    {
        self.checkpoint()?;
        self.transition(TransferStatus::Requesting);

        let response = source.open(&self.locator).await?;
        self.checkpoint()?;
        let (declared_total, body) = self.validate_headers(response)?;

        self.declared_total_bytes = Some(declared_total);
        self.transition(TransferStatus::Streaming);

        let streamed = self.stream_body(body, declared_total, progress).await;
        progress.finish();
        let accumulator = streamed?;

        self.transition(TransferStatus::Finalizing);
        if let Err(halt) = self.checkpoint() {
            accumulator.discard();
            return Err(halt);
        }

        let mismatch = LengthMismatchWarning::check(declared_total, self.received_bytes);
        if let Some(warning) = mismatch {
            warn!(
                declared = warning.declared,
                received = warning.received,
                "length mismatch at end of data"
            );
        }

        let artifact = self.finalizer.finalize(accumulator.drain(), display_name);
        let delivery = sink.deliver(artifact).await.map_err(TransferError::from)?;

        info!(
            bytes = delivery.bytes,
            location = ?delivery.location,
            "transfer complete"
        );
        self.length_mismatch = mismatch;
        self.delivery = Some(delivery);
        self.transition(TransferStatus::Completed);
        Ok(())
    }

    /// Checks status, body presence and declared length, in that order.
    fn validate_headers(&self, response: SourceResponse) -> Result<(u64, ChunkStream), Halt> {
        if !response.is_success() {
            return Err(TransferError::http_status(&self.locator, response.status).into());
        }
        let status = response.status;
        let Some(body) = response.body else {
            return Err(TransferError::missing_body(&self.locator, status).into());
        };
        match response.content_length {
            None => Err(TransferError::missing_length(&self.locator).into()),
            Some(0) => Err(TransferError::empty_resource(&self.locator).into()),
            Some(total) => Ok((total, body)),
        }
    }

    async fn stream_body<P>(
        &mut self,
        mut body: ChunkStream,
        declared_total: u64,
        progress: &mut P,
    ) -> Result<ByteAccumulator, Halt>
    where
        P: ProgressSink + ?Sized,
    {
        let mut accumulator = ByteAccumulator::new();
        loop {
            if let Err(halt) = self.checkpoint() {
                accumulator.discard();
                return Err(halt);
            }

            match body.next().await {
                Some(Ok(chunk)) => {
                    let previous = self.received_bytes;
                    let chunk_len = chunk.len() as u64;
                    accumulator.append(chunk);
                    self.received_bytes = accumulator.total_length();
                    debug_assert_eq!(self.received_bytes, previous + chunk_len);
                    self.transition(TransferStatus::Streaming);
                    progress.on_progress(ProgressSnapshot::new(
                        self.received_bytes,
                        declared_total,
                    ));
                }
                Some(Err(cause)) => {
                    let received = self.received_bytes;
                    accumulator.discard();
                    return Err(TransferError::stream_read(&self.locator, received, cause).into());
                }
                None => {
                    debug!(
                        received = self.received_bytes,
                        chunks = accumulator.chunk_count(),
                        "end of data"
                    );
                    return Ok(accumulator);
                }
            }
        }
    }

    fn checkpoint(&self) -> Result<(), Halt> {
        if self.cancel.is_cancelled() {
            Err(Halt::Cancelled)
        } else {
            Ok(())
        }
    }

    fn transition(&mut self, next: TransferStatus) {
        debug_assert!(
            self.status.can_transition_to(next),
            "illegal transfer transition {} -> {}",
            self.status,
            next
        );
        if self.status != next {
            debug!(from = %self.status, to = %next, "state transition");
        }
        self.status = next;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::Mutex;
    use std::sync::atomic::AtomicUsize;

    use async_trait::async_trait;
    use bytes::Bytes;
    use futures_util::stream;

    use crate::artifact::{Artifact, SinkError};
    use crate::transfer::error::{ErrorKind, StreamFault};
    use crate::transfer::progress::NoProgress;

    /// In-memory source: fixed status/length and a scripted list of reads.
    struct FakeSource {
        status: u16,
        content_length: Option<u64>,
        with_body: bool,
        reads: Mutex<Option<Vec<Result<Bytes, String>>>>,
        read_count: Arc<AtomicUsize>,
    }

    impl FakeSource {
        fn new(content_length: Option<u64>, chunk_sizes: &[usize]) -> Self {
            let reads = chunk_sizes
                .iter()
                .enumerate()
                .map(|(i, &size)| {
                    let byte = u8::try_from(i % 251).unwrap();
                    Ok(Bytes::from(vec![byte; size]))
                })
                .collect();
            Self {
                status: 200,
                content_length,
                with_body: true,
                reads: Mutex::new(Some(reads)),
                read_count: Arc::new(AtomicUsize::new(0)),
            }
        }

        fn with_status(mut self, status: u16) -> Self {
            self.status = status;
            self
        }

        fn without_body(mut self) -> Self {
            self.with_body = false;
            self
        }

        fn failing_after(self, good_reads: usize) -> Self {
            {
                let mut guard = self.reads.lock().unwrap();
                let reads = guard.as_mut().unwrap();
                reads.truncate(good_reads);
                reads.push(Err("connection reset by peer".to_string()));
            }
            self
        }

        fn reads_performed(&self) -> usize {
            self.read_count.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TransferSource for FakeSource {
        async fn open(&self, _locator: &str) -> Result<SourceResponse, TransferError> {
            let reads = self.reads.lock().unwrap().take().unwrap_or_default();
            let counter = Arc::clone(&self.read_count);
            let body: ChunkStream = stream::iter(reads)
                .map(move |read| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    read.map_err(|msg| -> StreamFault { msg.into() })
                })
                .boxed();
            Ok(SourceResponse {
                status: self.status,
                content_length: self.content_length,
                body: self.with_body.then_some(body),
            })
        }
    }

    /// Source whose connection attempt fails outright.
    struct UnreachableSource;

    #[async_trait]
    impl TransferSource for UnreachableSource {
        async fn open(&self, locator: &str) -> Result<SourceResponse, TransferError> {
            Err(TransferError::connect(locator, "connection refused"))
        }
    }

    /// Source that raises cancellation while the headers are awaited, then
    /// answers with whatever the wrapped source returns.
    struct CancelDuringOpen {
        inner: FakeSource,
        cancel: CancelSignal,
    }

    #[async_trait]
    impl TransferSource for CancelDuringOpen {
        async fn open(&self, locator: &str) -> Result<SourceResponse, TransferError> {
            self.cancel.cancel();
            self.inner.open(locator).await
        }
    }

    /// Sink that keeps delivered artifacts in memory, or rejects them.
    #[derive(Default)]
    struct MemorySink {
        delivered: Mutex<Vec<Artifact>>,
        reject: bool,
    }

    #[async_trait]
    impl ArtifactSink for MemorySink {
        async fn deliver(&self, artifact: Artifact) -> Result<Delivery, SinkError> {
            if self.reject {
                return Err(SinkError::rejected("read-only storage"));
            }
            let bytes = artifact.len();
            self.delivered.lock().unwrap().push(artifact);
            Ok(Delivery {
                location: None,
                bytes,
            })
        }
    }

    const LOCATOR: &str = "https://cdn.example.com/clip.mp4";

    #[test]
    fn test_terminal_states_have_no_exit() {
        for terminal in [
            TransferStatus::Completed,
            TransferStatus::Failed,
            TransferStatus::Cancelled,
        ] {
            assert!(terminal.is_terminal());
            assert!(!terminal.can_transition_to(TransferStatus::Cancelled));
            assert!(!terminal.can_transition_to(TransferStatus::Requesting));
        }
    }

    #[test]
    fn test_transition_table() {
        use TransferStatus::*;
        assert!(Idle.can_transition_to(Requesting));
        assert!(Idle.can_transition_to(Cancelled));
        assert!(!Idle.can_transition_to(Streaming));
        assert!(Requesting.can_transition_to(Streaming));
        assert!(Requesting.can_transition_to(Failed));
        assert!(!Requesting.can_transition_to(Completed));
        assert!(Streaming.can_transition_to(Streaming));
        assert!(Streaming.can_transition_to(Finalizing));
        assert!(!Streaming.can_transition_to(Completed));
        assert!(Finalizing.can_transition_to(Completed));
        assert!(Finalizing.can_transition_to(Failed));
    }

    #[test]
    fn test_session_ids_are_unique() {
        let a = TransferSession::new(LOCATOR);
        let b = TransferSession::new(LOCATOR);
        assert_ne!(a.id(), b.id());
        assert_eq!(a.status(), TransferStatus::Idle);
    }

    #[tokio::test]
    async fn test_scenario_exact_length_reports_quarter_steps() {
        let source = FakeSource::new(Some(1000), &[250, 250, 500]);
        let sink = MemorySink::default();
        let mut percentages = Vec::new();
        let mut session = TransferSession::new(LOCATOR);

        let status = session
            .run(&source, &sink, "Clip", &mut |s: ProgressSnapshot| {
                percentages.push(s.percentage);
            })
            .await;

        assert_eq!(status, TransferStatus::Completed);
        assert_eq!(percentages, vec![25.0, 50.0, 100.0]);
        assert_eq!(session.length_mismatch(), None);
        assert!(session.last_error().is_none());
        assert_eq!(session.received_bytes(), 1000);
        assert_eq!(session.declared_total_bytes(), Some(1000));
        assert_eq!(session.delivery().unwrap().bytes, 1000);

        let delivered = sink.delivered.lock().unwrap();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].suggested_filename(), "Clip.mp4");
    }

    #[tokio::test]
    async fn test_scenario_missing_length_fails_before_any_read() {
        let source = FakeSource::new(None, &[10, 10]);
        let sink = MemorySink::default();
        let mut session = TransferSession::new(LOCATOR);

        let status = session.run(&source, &sink, "Clip", &mut NoProgress).await;

        assert_eq!(status, TransferStatus::Failed);
        assert_eq!(
            session.last_error().map(TransferError::kind),
            Some(ErrorKind::MissingLengthMetadata)
        );
        assert_eq!(source.reads_performed(), 0);
        assert_eq!(session.declared_total_bytes(), None);
        assert!(sink.delivered.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_scenario_short_body_completes_with_mismatch() {
        let source = FakeSource::new(Some(500), &[100, 300]);
        let sink = MemorySink::default();
        let mut session = TransferSession::new(LOCATOR);

        let status = session.run(&source, &sink, "Clip", &mut NoProgress).await;

        assert_eq!(status, TransferStatus::Completed);
        assert_eq!(
            session.length_mismatch(),
            Some(LengthMismatchWarning {
                declared: 500,
                received: 400
            })
        );
        assert_eq!(sink.delivered.lock().unwrap()[0].len(), 400);
    }

    #[tokio::test]
    async fn test_scenario_cancel_after_two_of_five_chunks() {
        let source = FakeSource::new(Some(500), &[100; 5]);
        let sink = MemorySink::default();
        let mut session = TransferSession::new(LOCATOR);
        let cancel = session.cancel_signal();
        let mut snapshots = 0;

        let status = session
            .run(&source, &sink, "Clip", &mut |_s: ProgressSnapshot| {
                snapshots += 1;
                if snapshots == 2 {
                    cancel.cancel();
                }
            })
            .await;

        assert_eq!(status, TransferStatus::Cancelled);
        assert_eq!(snapshots, 2);
        assert_eq!(source.reads_performed(), 2);
        assert!(session.last_error().is_none());
        assert!(session.delivery().is_none());
        assert!(sink.delivered.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cancel_before_start_skips_request() {
        let source = FakeSource::new(Some(10), &[10]);
        let sink = MemorySink::default();
        let cancel = CancelSignal::new();
        cancel.cancel();
        let mut session = TransferSession::new(LOCATOR).with_cancel_signal(cancel);

        let status = session.run(&source, &sink, "Clip", &mut NoProgress).await;

        assert_eq!(status, TransferStatus::Cancelled);
        assert_eq!(source.reads_performed(), 0);
    }

    #[tokio::test]
    async fn test_non_success_status_is_transport_error() {
        let source = FakeSource::new(Some(10), &[10]).with_status(404);
        let sink = MemorySink::default();
        let mut session = TransferSession::new(LOCATOR);

        let status = session.run(&source, &sink, "Clip", &mut NoProgress).await;

        assert_eq!(status, TransferStatus::Failed);
        let error = session.last_error().unwrap();
        assert_eq!(error.kind(), ErrorKind::Transport);
        assert_eq!(error.status_code(), Some(404));
        assert_eq!(source.reads_performed(), 0);
    }

    #[tokio::test]
    async fn test_absent_body_is_transport_error() {
        let source = FakeSource::new(Some(10), &[10]).without_body();
        let sink = MemorySink::default();
        let mut session = TransferSession::new(LOCATOR);

        session.run(&source, &sink, "Clip", &mut NoProgress).await;

        let error = session.last_error().unwrap();
        assert_eq!(error.kind(), ErrorKind::Transport);
        assert_eq!(error.status_code(), Some(200));
    }

    #[tokio::test]
    async fn test_connection_failure_is_transport_error_without_status() {
        let sink = MemorySink::default();
        let mut session = TransferSession::new(LOCATOR);

        let status = session
            .run(&UnreachableSource, &sink, "Clip", &mut NoProgress)
            .await;

        assert_eq!(status, TransferStatus::Failed);
        assert_eq!(session.last_error().unwrap().status_code(), None);
    }

    #[tokio::test]
    async fn test_zero_declared_length_never_streams() {
        let source = FakeSource::new(Some(0), &[]);
        let sink = MemorySink::default();
        let mut session = TransferSession::new(LOCATOR);

        let status = session.run(&source, &sink, "Clip", &mut NoProgress).await;

        assert_eq!(status, TransferStatus::Failed);
        assert_eq!(
            session.last_error().map(TransferError::kind),
            Some(ErrorKind::EmptyResource)
        );
    }

    #[tokio::test]
    async fn test_mid_stream_failure_discards_bytes() {
        let source = FakeSource::new(Some(300), &[100, 100, 100]).failing_after(1);
        let sink = MemorySink::default();
        let mut session = TransferSession::new(LOCATOR);
        let mut snapshots = Vec::new();

        let status = session
            .run(&source, &sink, "Clip", &mut |s: ProgressSnapshot| {
                snapshots.push(s.received_bytes);
            })
            .await;

        assert_eq!(status, TransferStatus::Failed);
        assert_eq!(snapshots, vec![100]);
        match session.last_error().unwrap() {
            TransferError::StreamRead { received, .. } => assert_eq!(*received, 100),
            other => panic!("expected StreamRead, got {other:?}"),
        }
        assert!(sink.delivered.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sink_rejection_is_distinct_from_transfer_failure() {
        let source = FakeSource::new(Some(20), &[20]);
        let sink = MemorySink {
            reject: true,
            ..MemorySink::default()
        };
        let mut session = TransferSession::new(LOCATOR);

        let status = session.run(&source, &sink, "Clip", &mut NoProgress).await;

        assert_eq!(status, TransferStatus::Failed);
        let error = session.last_error().unwrap();
        assert!(error.is_save_failure());
        assert_eq!(session.received_bytes(), 20);
    }

    #[tokio::test]
    async fn test_over_declared_body_surfaces_above_hundred() {
        let source = FakeSource::new(Some(100), &[80, 70]);
        let sink = MemorySink::default();
        let mut last = 0.0;
        let mut session = TransferSession::new(LOCATOR);

        session
            .run(&source, &sink, "Clip", &mut |s: ProgressSnapshot| {
                last = s.percentage;
            })
            .await;

        assert_eq!(last, 150.0);
        assert_eq!(
            session.length_mismatch(),
            Some(LengthMismatchWarning {
                declared: 100,
                received: 150
            })
        );
    }

    #[tokio::test]
    async fn test_run_twice_is_a_no_op() {
        let source = FakeSource::new(Some(10), &[10]);
        let sink = MemorySink::default();
        let mut session = TransferSession::new(LOCATOR);

        assert_eq!(
            session.run(&source, &sink, "Clip", &mut NoProgress).await,
            TransferStatus::Completed
        );
        assert_eq!(
            session.run(&source, &sink, "Clip", &mut NoProgress).await,
            TransferStatus::Completed
        );
        assert_eq!(sink.delivered.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_cancel_while_awaiting_headers_wins_over_bad_status() {
        let cancel = CancelSignal::new();
        let source = CancelDuringOpen {
            inner: FakeSource::new(None, &[10]).with_status(404),
            cancel: cancel.clone(),
        };
        let sink = MemorySink::default();
        let mut session = TransferSession::new(LOCATOR).with_cancel_signal(cancel);

        let status = session.run(&source, &sink, "Clip", &mut NoProgress).await;

        assert_eq!(status, TransferStatus::Cancelled);
        assert!(session.last_error().is_none());
        assert_eq!(session.declared_total_bytes(), None);
        assert_eq!(source.inner.reads_performed(), 0);
    }

    #[tokio::test]
    async fn test_received_bytes_track_running_sum_while_streaming() {
        let sizes = [1_u64, 7, 0, 64, 3];
        let source = FakeSource::new(Some(75), &[1, 7, 0, 64, 3]);
        let sink = MemorySink::default();
        let mut received = Vec::new();
        let mut session = TransferSession::new(LOCATOR);

        session
            .run(&source, &sink, "Clip", &mut |s: ProgressSnapshot| {
                received.push(s.received_bytes);
            })
            .await;

        let running_sum: Vec<u64> = sizes
            .iter()
            .scan(0, |total, size| {
                *total += size;
                Some(*total)
            })
            .collect();
        assert_eq!(received, running_sum);
        assert_eq!(session.received_bytes(), 75);
    }

    #[tokio::test]
    async fn test_round_trip_preserves_arrival_order() {
        let sizes = [1, 7, 0, 64, 3, 1024, 5];
        let source = FakeSource::new(Some(1104), &sizes);
        let sink = MemorySink::default();
        let mut session = TransferSession::new(LOCATOR);

        session.run(&source, &sink, "Clip", &mut NoProgress).await;

        let expected: Vec<u8> = sizes
            .iter()
            .enumerate()
            .flat_map(|(i, &size)| std::iter::repeat_n(u8::try_from(i).unwrap(), size))
            .collect();
        let delivered = sink.delivered.lock().unwrap();
        assert_eq!(delivered[0].len(), 1104);
        assert_eq!(&delivered[0].bytes()[..], &expected[..]);
    }

    #[tokio::test]
    async fn test_percentages_are_monotonic_and_observer_is_finished_once() {
        struct Recorder {
            percentages: Vec<f64>,
            finished: usize,
        }
        impl ProgressSink for Recorder {
            fn on_progress(&mut self, snapshot: ProgressSnapshot) {
                self.percentages.push(snapshot.percentage);
            }
            fn finish(&mut self) {
                self.finished += 1;
            }
        }

        let source = FakeSource::new(Some(60), &[10, 0, 20, 30]);
        let sink = MemorySink::default();
        let mut recorder = Recorder {
            percentages: Vec::new(),
            finished: 0,
        };
        let mut session = TransferSession::new(LOCATOR);

        session.run(&source, &sink, "Clip", &mut recorder).await;

        assert_eq!(recorder.finished, 1);
        assert_eq!(recorder.percentages.len(), 4);
        assert!(recorder.percentages.windows(2).all(|w| w[0] <= w[1]));
    }

    #[tokio::test]
    async fn test_observer_finished_when_failing_before_streaming() {
        let source = FakeSource::new(None, &[]);
        let sink = MemorySink::default();
        let mut finished = 0;
        struct Counter<'a>(&'a mut usize);
        impl ProgressSink for Counter<'_> {
            fn on_progress(&mut self, _snapshot: ProgressSnapshot) {}
            fn finish(&mut self) {
                *self.0 += 1;
            }
        }

        TransferSession::new(LOCATOR)
            .run(&source, &sink, "Clip", &mut Counter(&mut finished))
            .await;

        assert_eq!(finished, 1);
    }
}
