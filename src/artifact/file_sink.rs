//! Sink that writes artifacts into a directory.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument};

use super::filename::candidate_path;
use super::{Artifact, ArtifactSink, Delivery, SinkError};

/// Suffixes tried before the sink gives up on a filename.
const MAX_NAME_ATTEMPTS: u32 = 10_000;

/// Writes each artifact to `output_dir/<suggested filename>`.
///
/// Existing files are never overwritten; a numeric suffix is added instead.
/// The directory is created on first use.
#[derive(Debug, Clone)]
pub struct FileSink {
    output_dir: PathBuf,
}

impl FileSink {
    /// Creates a sink rooted at `output_dir`.
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Returns the output directory.
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

#[async_trait]
impl ArtifactSink for FileSink {
    #[instrument(level = "debug", skip(self, artifact), fields(filename = %artifact.suggested_filename()))]
    async fn deliver(&self, artifact: Artifact) -> Result<Delivery, SinkError> {
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|e| SinkError::io(self.output_dir.clone(), e))?;

        let (mut file, path) =
            create_unique(&self.output_dir, artifact.suggested_filename()).await?;
        debug!(path = %path.display(), "created output file");

        let bytes = artifact.len();
        let result = write_file(&mut file, &path, &artifact).await;
        drop(file);
        if result.is_err() {
            debug!(path = %path.display(), "cleaning up partial file after error");
            let _ = tokio::fs::remove_file(&path).await;
        }
        result?;

        info!(path = %path.display(), bytes, "artifact saved");
        Ok(Delivery {
            location: Some(path),
            bytes,
        })
    }
}

/// Creates the first free candidate name with `create_new`, so two sinks
/// racing for the same name each end up with their own file.
async fn create_unique(dir: &Path, filename: &str) -> Result<(File, PathBuf), SinkError> {
    for attempt in 1..=MAX_NAME_ATTEMPTS {
        let path = candidate_path(dir, filename, attempt);
        match File::create_new(&path).await {
            Ok(file) => return Ok((file, path)),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {}
            Err(e) => return Err(SinkError::io(path, e)),
        }
    }
    Err(SinkError::rejected(format!(
        "no free name for {filename} after {MAX_NAME_ATTEMPTS} attempts"
    )))
}

async fn write_file(file: &mut File, path: &Path, artifact: &Artifact) -> Result<(), SinkError> {
    file.write_all(artifact.bytes())
        .await
        .map_err(|e| SinkError::io(path, e))?;
    file.flush().await.map_err(|e| SinkError::io(path, e))?;
    Ok(())
}
