//! Streaming transfer engine with byte-level progress.
//!
//! A [`TransferSession`] opens one resource through a [`TransferSource`],
//! collects the body in a [`ByteAccumulator`], reports a [`ProgressSnapshot`]
//! after every chunk and, at end-of-data, hands the assembled artifact to an
//! [`ArtifactSink`](crate::artifact::ArtifactSink).
//!
//! # Features
//!
//! - Explicit state machine ([`TransferStatus`]) with a single attempt per session
//! - Exact `Content-Length` required; transfers of unknown length are refused
//! - Received/declared disagreement is surfaced as a [`LengthMismatchWarning`], not an error
//! - Cooperative cancellation via [`CancelSignal`], optionally with a deadline
//! - The whole payload is held in memory until it is delivered
//!
//! # Example
//!
//! ```no_run
//! use clipfetch_core::artifact::FileSink;
//! use clipfetch_core::transfer::{HttpSource, ProgressSnapshot, TransferSession};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let source = HttpSource::new()?;
//! let sink = FileSink::new("./downloads");
//! let mut session = TransferSession::new("https://cdn.example.com/clip.mp4");
//! let status = session
//!     .run(&source, &sink, "Launch recap", &mut |s: ProgressSnapshot| {
//!         println!("{:.1}%", s.percentage);
//!     })
//!     .await;
//! println!("finished: {status}");
//! # Ok(())
//! # }
//! ```

mod accumulator;
mod cancel;
mod error;
mod http;
mod progress;
mod session;
mod source;

pub use accumulator::ByteAccumulator;
pub use cancel::CancelSignal;
pub use error::{ErrorKind, LengthMismatchWarning, StreamFault, TransferError};
pub use http::{CONNECT_TIMEOUT_SECS, HttpSource, READ_TIMEOUT_SECS};
pub use progress::{ChannelProgress, NoProgress, ProgressSink, ProgressSnapshot, percentage};
pub use session::{TransferSession, TransferStatus};
pub use source::{ChunkStream, SourceResponse, TransferSource};
