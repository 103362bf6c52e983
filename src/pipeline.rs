//! The capture pipeline and its cleanup boundary.
//!
//! `CaptureService::capture` is the single entry point: one validated
//! request in, exactly one terminal `CaptureResult` out, with the browser
//! session closed on every exit path in between.

use crate::{
    blocker, capture, consent, navigation, BrowserSession, CaptureError, CaptureRequest,
    CaptureResult, Captured, Config, Metrics,
};
use std::time::Instant;
use tokio::time::sleep;
use tracing::{debug, info, warn};

pub struct CaptureService {
    config: Config,
    metrics: Metrics,
}

impl CaptureService {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            metrics: Metrics::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Capture one page. Infallible at this boundary: failures come back
    /// as a `CaptureResult` carrying the error message.
    pub async fn capture(&self, request: &CaptureRequest) -> CaptureResult {
        let start = Instant::now();
        let outcome = self.run(request).await;
        let duration = start.elapsed();

        match outcome {
            Ok(captured) => {
                self.metrics.record_capture(duration, true);
                info!(
                    "captured {} -> {} in {:?}",
                    request.url,
                    captured.path.display(),
                    duration
                );
                CaptureResult::ok(captured.id, &captured.path)
            }
            Err(error) => {
                self.metrics.record_capture(duration, false);
                warn!("capture of {} failed: {error}", request.url);
                CaptureResult::failure(&error)
            }
        }
    }

    /// Owns the session lifetime: opened here, closed here, on success and
    /// failure alike. `close` logs its own problems and never overrides
    /// the pipeline error.
    async fn run(&self, request: &CaptureRequest) -> Result<Captured, CaptureError> {
        let mut session =
            BrowserSession::open(&self.config, request.width, request.height).await?;
        let result = self.drive(&mut session, request).await;
        session.close().await;
        result
    }

    async fn drive(
        &self,
        session: &mut BrowserSession,
        request: &CaptureRequest,
    ) -> Result<Captured, CaptureError> {
        if let Err(e) = blocker::attach(session, &self.config).await {
            // Degraded capture beats no capture: the page renders with ads.
            warn!("content blocker unavailable: {e}");
        }

        let response = navigation::navigate(session, &request.url).await?;
        debug!("main document: HTTP {} {}", response.status, response.url);

        if request.handle_cookie_banners {
            consent::resolve(session).await;
        }

        if !request.wait_time.is_zero() {
            sleep(request.wait_time).await;
        }

        capture::capture(session, request.full_page, &self.config.output_dir).await
    }
}
