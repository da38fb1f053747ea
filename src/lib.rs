//! clipfetch core library
//!
//! Pulls a single binary resource over HTTP, reports byte-level progress while
//! the body streams in, and delivers the assembled bytes as a named artifact.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`transfer`] - Transfer sessions, sources, progress and cancellation
//! - [`artifact`] - Artifact assembly, filename sanitization and sinks
//! - [`describe`] - Never-failing title/summary lookup for a resource

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod artifact;
pub mod describe;
pub mod transfer;
mod user_agent;

// Re-export commonly used types
pub use artifact::{Artifact, ArtifactFinalizer, ArtifactSink, FileSink, SinkError, sanitize};
pub use describe::{ContentDescriber, Description, DescriptionService, HttpDescriber};
pub use transfer::{
    CancelSignal, HttpSource, ProgressSink, ProgressSnapshot, TransferError, TransferSession,
    TransferSource, TransferStatus,
};
