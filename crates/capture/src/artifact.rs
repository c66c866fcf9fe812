use chrono::{DateTime, Utc};
use foundation::filename_timestamp;

use crate::chunks::MediaChunk;
use crate::error::CaptureError;

pub const ARTIFACT_MIME: &str = "video/webm";
pub const DEFAULT_FILENAME_PREFIX: &str = "india-from-space";

/// `<prefix>-<ISO timestamp with ':' and '.' as '-'>.webm`
pub fn artifact_filename(prefix: &str, at: DateTime<Utc>) -> String {
    format!("{prefix}-{}.webm", filename_timestamp(at))
}

/// A finished recording, ready to hand to the user.
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact<C> {
    pub filename: String,
    pub mime: &'static str,
    pub chunks: Vec<C>,
}

impl<C: MediaChunk> Artifact<C> {
    pub fn new(filename: impl Into<String>, chunks: Vec<C>) -> Self {
        Self {
            filename: filename.into(),
            mime: ARTIFACT_MIME,
            chunks,
        }
    }

    pub fn byte_len(&self) -> u64 {
        self.chunks.iter().map(MediaChunk::byte_len).sum()
    }

    pub fn summary(&self) -> ArtifactSummary {
        ArtifactSummary {
            filename: self.filename.clone(),
            bytes: self.byte_len(),
            chunks: self.chunks.len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactSummary {
    pub filename: String,
    pub bytes: u64,
    pub chunks: usize,
}

/// Where finished recordings go. Delivery is final; there is no undo.
pub trait ArtifactSink {
    type Chunk: MediaChunk;

    fn deliver(&self, artifact: Artifact<Self::Chunk>) -> Result<(), CaptureError>;
}
