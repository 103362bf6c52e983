use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by the capture pipeline.
///
/// Consent-dismissal failures and session-close failures deliberately have
/// no variants here: both are logged and swallowed where they occur and
/// never reach the caller, so a late teardown problem cannot mask the
/// actual pipeline outcome.
#[derive(Debug, Clone, Error)]
pub enum CaptureError {
    #[error("Browser launch failed: {0}")]
    LaunchFailed(String),

    #[error("Content blocker init failed: {0}")]
    BlockerInit(String),

    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    #[error("Page responded with HTTP {status} {status_text}")]
    HttpStatus { status: u16, status_text: String },

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Screenshot capture failed: {0}")]
    CaptureFailed(String),

    #[error("IO error: {0}")]
    Io(String),
}

impl CaptureError {
    /// Whether the pipeline aborts the request on this error. Only the
    /// content blocker is allowed to fail without failing the capture.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, CaptureError::BlockerInit(_))
    }
}

impl From<std::io::Error> for CaptureError {
    fn from(err: std::io::Error) -> Self {
        CaptureError::Io(err.to_string())
    }
}
