use std::cell::{Cell, RefCell};
use std::future::Future;
use std::rc::Rc;
use std::task::Poll;

use crate::artifact::{Artifact, ArtifactSink};
use crate::chunks::SharedChunks;
use crate::encoder::{ActiveRecorder, EncoderRequest, MediaEncoder};
use crate::error::CaptureError;
use crate::mime::PREFERRED_MIME_TYPES;

/// Encoder that emits the first scripted chunk on start and the rest on stop.
pub struct ScriptedEncoder {
    script: Vec<Vec<u8>>,
    supported: Vec<&'static str>,
    failure: Option<CaptureError>,
    requests: RefCell<Vec<EncoderRequest>>,
    released: Rc<Cell<bool>>,
}

impl ScriptedEncoder {
    pub fn new(script: Vec<Vec<u8>>) -> Self {
        Self {
            script,
            supported: PREFERRED_MIME_TYPES.to_vec(),
            failure: None,
            requests: RefCell::new(Vec::new()),
            released: Rc::new(Cell::new(false)),
        }
    }

    pub fn supporting(mut self, mimes: &[&'static str]) -> Self {
        self.supported = mimes.to_vec();
        self
    }

    pub fn failing_with(mut self, err: CaptureError) -> Self {
        self.failure = Some(err);
        self
    }

    pub fn requests(&self) -> Vec<EncoderRequest> {
        self.requests.borrow().clone()
    }

    pub fn released(&self) -> bool {
        self.released.get()
    }
}

impl MediaEncoder for ScriptedEncoder {
    type Chunk = Vec<u8>;
    type Recorder = ScriptedRecorder;

    fn is_mime_supported(&self, mime: &str) -> bool {
        self.supported.iter().any(|s| *s == mime)
    }

    fn start(
        &self,
        request: &EncoderRequest,
        chunks: SharedChunks<Vec<u8>>,
    ) -> Result<ScriptedRecorder, CaptureError> {
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }
        self.requests.borrow_mut().push(request.clone());

        let mut pending = self.script.clone();
        if !pending.is_empty() {
            chunks.borrow_mut().push(pending.remove(0));
        }
        Ok(ScriptedRecorder {
            inactive: Rc::new(Cell::new(false)),
            chunks,
            pending: RefCell::new(pending),
            released: Rc::clone(&self.released),
        })
    }
}

pub struct ScriptedRecorder {
    inactive: Rc<Cell<bool>>,
    chunks: SharedChunks<Vec<u8>>,
    pending: RefCell<Vec<Vec<u8>>>,
    released: Rc<Cell<bool>>,
}

impl ActiveRecorder for ScriptedRecorder {
    fn is_inactive(&self) -> bool {
        self.inactive.get()
    }

    fn stop(&self) {
        if self.inactive.get() {
            return;
        }
        let mut chunks = self.chunks.borrow_mut();
        for chunk in self.pending.borrow_mut().drain(..) {
            chunks.push(chunk);
        }
        self.inactive.set(true);
    }

    fn finalized(&self) -> impl Future<Output = ()> {
        let inactive = Rc::clone(&self.inactive);
        futures::future::poll_fn(move |_| {
            if inactive.get() {
                Poll::Ready(())
            } else {
                Poll::Pending
            }
        })
    }

    fn release(&self) {
        self.released.set(true);
    }
}

/// Sink that keeps every delivered artifact.
#[derive(Default)]
pub struct MemorySink {
    delivered: RefCell<Vec<Artifact<Vec<u8>>>>,
    fail: bool,
}

impl MemorySink {
    pub fn failing() -> Self {
        Self {
            delivered: RefCell::new(Vec::new()),
            fail: true,
        }
    }

    pub fn delivered(&self) -> Vec<Artifact<Vec<u8>>> {
        self.delivered.borrow().clone()
    }
}

impl ArtifactSink for MemorySink {
    type Chunk = Vec<u8>;

    fn deliver(&self, artifact: Artifact<Vec<u8>>) -> Result<(), CaptureError> {
        if self.fail {
            return Err(CaptureError::Download("sink refused".to_string()));
        }
        self.delivered.borrow_mut().push(artifact);
        Ok(())
    }
}
