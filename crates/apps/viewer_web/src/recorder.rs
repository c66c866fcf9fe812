use std::cell::RefCell;
use std::future::Future;

use capture::{ActiveRecorder, CaptureError, EncoderRequest, MediaChunk, MediaEncoder, SharedChunks};
use futures::channel::oneshot;
use tracing::{debug, warn};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Blob, BlobEvent, MediaRecorder, MediaRecorderOptions, MediaStream, MediaStreamTrack, RecordingState};

use crate::maplibre::{BrowserMap, js_text};

/// One `dataavailable` payload.
#[derive(Debug, Clone)]
pub struct BlobChunk(pub Blob);

impl MediaChunk for BlobChunk {
    fn byte_len(&self) -> u64 {
        self.0.size() as u64
    }
}

/// `MediaRecorder` over the map canvas's capture stream.
pub struct CanvasEncoder {
    map: BrowserMap,
    timeslice_ms: u32,
}

impl CanvasEncoder {
    pub fn new(map: BrowserMap, timeslice_ms: u32) -> Self {
        Self {
            map,
            timeslice_ms: timeslice_ms.max(1),
        }
    }
}

fn stop_tracks(stream: &MediaStream) {
    for track in stream.get_tracks().iter() {
        if let Ok(track) = track.dyn_into::<MediaStreamTrack>() {
            track.stop();
        }
    }
}

impl MediaEncoder for CanvasEncoder {
    type Chunk = BlobChunk;
    type Recorder = CanvasRecorder;

    fn is_mime_supported(&self, mime: &str) -> bool {
        MediaRecorder::is_type_supported(mime)
    }

    fn start(
        &self,
        request: &EncoderRequest,
        chunks: SharedChunks<BlobChunk>,
    ) -> Result<CanvasRecorder, CaptureError> {
        let canvas = self.map.canvas().ok_or(CaptureError::NoCanvas)?;
        let stream = canvas
            .capture_stream_with_frame_request_rate(f64::from(request.fps))
            .map_err(|e| CaptureError::StreamUnavailable(js_text(&e)))?;

        let created = match request.mime {
            Some(mime) => {
                let options = MediaRecorderOptions::new();
                options.set_mime_type(mime);
                MediaRecorder::new_with_media_stream_and_media_recorder_options(&stream, &options)
            }
            None => MediaRecorder::new_with_media_stream(&stream),
        };
        let recorder = match created {
            Ok(recorder) => recorder,
            Err(e) => {
                stop_tracks(&stream);
                return Err(CaptureError::RecorderInit(js_text(&e)));
            }
        };

        let on_data = Closure::<dyn FnMut(BlobEvent)>::new(move |event: BlobEvent| {
            if let Some(blob) = event.data() {
                chunks.borrow_mut().push(BlobChunk(blob));
            }
        });
        recorder.set_ondataavailable(Some(on_data.as_ref().unchecked_ref()));

        let (tx, rx) = oneshot::channel();
        let mut tx = Some(tx);
        let on_stop = Closure::<dyn FnMut()>::new(move || {
            debug!("recorder stopped");
            if let Some(tx) = tx.take() {
                let _ = tx.send(());
            }
        });
        recorder.set_onstop(Some(on_stop.as_ref().unchecked_ref()));

        let active = CanvasRecorder {
            recorder,
            stream,
            stopped: RefCell::new(Some(rx)),
            _on_data: on_data,
            _on_stop: on_stop,
        };
        let timeslice = i32::try_from(self.timeslice_ms).unwrap_or(i32::MAX);
        if let Err(e) = active.recorder.start_with_time_slice(timeslice) {
            active.release();
            return Err(CaptureError::RecorderStart(js_text(&e)));
        }
        Ok(active)
    }
}

/// A started `MediaRecorder` and the stream feeding it.
pub struct CanvasRecorder {
    recorder: MediaRecorder,
    stream: MediaStream,
    stopped: RefCell<Option<oneshot::Receiver<()>>>,
    _on_data: Closure<dyn FnMut(BlobEvent)>,
    _on_stop: Closure<dyn FnMut()>,
}

impl ActiveRecorder for CanvasRecorder {
    fn is_inactive(&self) -> bool {
        self.recorder.state() == RecordingState::Inactive
    }

    fn stop(&self) {
        if self.is_inactive() {
            return;
        }
        if let Err(e) = self.recorder.stop() {
            warn!(error = %js_text(&e), "recorder stop failed");
        }
    }

    fn finalized(&self) -> impl Future<Output = ()> {
        let stopped = self.stopped.borrow_mut().take();
        async move {
            if let Some(stopped) = stopped {
                // A dropped sender means the handlers are gone; nothing more will arrive.
                let _ = stopped.await;
            }
        }
    }

    fn release(&self) {
        stop_tracks(&self.stream);
    }
}

impl Drop for CanvasRecorder {
    fn drop(&mut self) {
        self.recorder.set_ondataavailable(None);
        self.recorder.set_onstop(None);
    }
}
