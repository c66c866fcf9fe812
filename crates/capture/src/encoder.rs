use std::future::Future;

use crate::chunks::{MediaChunk, SharedChunks};
use crate::error::CaptureError;

/// Parameters for one encoding session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncoderRequest {
    pub fps: u32,
    /// `None` leaves the container/codec to the encoder.
    pub mime: Option<&'static str>,
}

/// Turns the map's drawing surface into encoded chunks.
pub trait MediaEncoder {
    type Chunk: MediaChunk;
    type Recorder: ActiveRecorder;

    fn is_mime_supported(&self, mime: &str) -> bool;

    /// Open a capture stream and start encoding. Every chunk the encoder
    /// emits is appended to `chunks`.
    fn start(
        &self,
        request: &EncoderRequest,
        chunks: SharedChunks<Self::Chunk>,
    ) -> Result<Self::Recorder, CaptureError>;
}

/// A running encoder session.
pub trait ActiveRecorder {
    fn is_inactive(&self) -> bool;

    /// Ask the encoder to flush and stop. Calling it twice is harmless.
    fn stop(&self);

    /// Resolves once the encoder has delivered its final chunk.
    fn finalized(&self) -> impl Future<Output = ()>;

    /// Release the capture stream.
    fn release(&self) {}
}
