use std::cell::RefCell;
use std::rc::Rc;

use chrono::Utc;
use tracing::{info, warn};

use crate::artifact::{
    Artifact, ArtifactSink, ArtifactSummary, DEFAULT_FILENAME_PREFIX, artifact_filename,
};
use crate::chunks::{SharedChunks, shared_chunks};
use crate::encoder::{ActiveRecorder, EncoderRequest, MediaEncoder};
use crate::error::CaptureError;
use crate::mime::select_mime;

/// Owns the encoder, its chunk buffer and the artifact sink for the lifetime
/// of the view. At most one recorder is active.
pub struct CaptureController<E, S>
where
    E: MediaEncoder,
{
    encoder: E,
    sink: S,
    chunks: SharedChunks<E::Chunk>,
    active: RefCell<Option<Rc<E::Recorder>>>,
    filename_prefix: String,
}

impl<E, S> CaptureController<E, S>
where
    E: MediaEncoder,
    S: ArtifactSink<Chunk = E::Chunk>,
{
    pub fn new(encoder: E, sink: S) -> Self {
        Self {
            encoder,
            sink,
            chunks: shared_chunks(),
            active: RefCell::new(None),
            filename_prefix: DEFAULT_FILENAME_PREFIX.to_string(),
        }
    }

    pub fn with_filename_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.filename_prefix = prefix.into();
        self
    }

    pub fn encoder(&self) -> &E {
        &self.encoder
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Bytes buffered for the current recording so far.
    pub fn buffered_bytes(&self) -> u64 {
        self.chunks.borrow().total_bytes()
    }

    pub fn is_recording(&self) -> bool {
        self.active
            .borrow()
            .as_ref()
            .is_some_and(|r| !r.is_inactive())
    }

    pub fn select_mime(&self) -> Option<&'static str> {
        select_mime(|mime| self.encoder.is_mime_supported(mime))
    }

    /// Start a recorder at `fps`, discarding chunks from any earlier recording.
    pub fn start(&self, fps: u32) -> Result<Rc<E::Recorder>, CaptureError> {
        let mime = self.select_mime();
        self.chunks.borrow_mut().clear();

        let request = EncoderRequest { fps, mime };
        let recorder = Rc::new(self.encoder.start(&request, Rc::clone(&self.chunks))?);
        *self.active.borrow_mut() = Some(Rc::clone(&recorder));
        info!(fps, mime = mime.unwrap_or("default"), "recorder started");
        Ok(recorder)
    }

    /// Stop the active recorder if it is still running. Safe at any time.
    pub fn stop(&self) -> bool {
        let active = self.active.borrow();
        match active.as_ref() {
            Some(recorder) if !recorder.is_inactive() => {
                recorder.stop();
                true
            }
            _ => false,
        }
    }

    /// Stop `recorder`, wait for its last chunk and hand the concatenated
    /// output to the sink.
    pub async fn finish(&self, recorder: Rc<E::Recorder>) -> Result<ArtifactSummary, CaptureError> {
        if !recorder.is_inactive() {
            recorder.stop();
        }
        recorder.finalized().await;
        recorder.release();
        self.active.borrow_mut().take();

        let chunks = self.chunks.borrow_mut().take();
        let artifact = Artifact::new(
            artifact_filename(&self.filename_prefix, Utc::now()),
            chunks,
        );
        let summary = artifact.summary();
        if summary.bytes == 0 {
            warn!(filename = %summary.filename, "recording produced no data");
        }
        self.sink.deliver(artifact)?;
        info!(
            filename = %summary.filename,
            bytes = summary.bytes,
            chunks = summary.chunks,
            "recording delivered"
        );
        Ok(summary)
    }
}
