use thiserror::Error;

/// Failures while setting up or finishing a recording.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("map canvas is not available")]
    NoCanvas,

    #[error("canvas capture stream unavailable: {0}")]
    StreamUnavailable(String),

    #[error("media recorder could not be created: {0}")]
    RecorderInit(String),

    #[error("media recorder failed to start: {0}")]
    RecorderStart(String),

    #[error("download failed: {0}")]
    Download(String),
}

#[cfg(test)]
mod tests {
    use super::CaptureError;

    #[test]
    fn error_display() {
        let err = CaptureError::StreamUnavailable("NotSupportedError".to_string());
        assert!(err.to_string().contains("NotSupportedError"));
    }
}
