//! Page navigation and load synchronization.
//!
//! "Loaded" means: the main-document response arrived with a success
//! status, `document.readyState` reached `"complete"`, and a fixed settle
//! delay has passed for late client-side rendering. Everything except the
//! settle delay runs under the session's timeout ceiling.

use crate::{BrowserSession, CaptureError, SETTLE_DELAY};
use chromiumoxide::cdp::browser_protocol::network::{EnableParams, EventResponseReceived};
use futures::StreamExt;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, trace};

const READY_STATE_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Response metadata for the navigated document.
#[derive(Debug, Clone)]
pub struct PageResponse {
    pub status: u16,
    pub status_text: String,
    pub url: String,
}

/// Drive the session's page to `url` and wait until it is fully loaded.
pub async fn navigate(session: &BrowserSession, url: &str) -> Result<PageResponse, CaptureError> {
    let page = session.page();

    if let Err(e) = page.execute(EnableParams::default()).await {
        debug!("network domain enable failed: {e}");
    }

    // Subscribe before goto so the document response cannot be missed.
    let mut responses = page
        .event_listener::<EventResponseReceived>()
        .await
        .map_err(|e| CaptureError::NavigationFailed(e.to_string()))?;

    session
        .bounded(async {
            page.goto(url)
                .await
                .map_err(|e| CaptureError::NavigationFailed(e.to_string()))?;
            Ok(())
        })
        .await?;

    let response = session
        .bounded(async {
            // The first text/html response is the navigation response, also
            // across redirects; subresources are skipped by mime type.
            while let Some(event) = responses.next().await {
                let mime = event.response.mime_type.to_lowercase();
                let is_document = event.response.url == url
                    || mime.starts_with("text/html")
                    || mime.starts_with("application/xhtml+xml");
                if is_document {
                    return Ok(PageResponse {
                        status: event.response.status as u16,
                        status_text: event.response.status_text.clone(),
                        url: event.response.url.clone(),
                    });
                }
                trace!("skipping subresource response: {}", event.response.url);
            }
            Err(CaptureError::NavigationFailed(format!(
                "no response received for {url}"
            )))
        })
        .await?;

    if !(200..300).contains(&response.status) {
        return Err(CaptureError::HttpStatus {
            status: response.status,
            status_text: response.status_text,
        });
    }

    wait_until_ready(session).await?;
    sleep(SETTLE_DELAY).await;

    debug!("navigation complete: {} ({})", response.url, response.status);
    Ok(response)
}

/// Poll the document ready state until `"complete"`, bounded by the
/// session ceiling.
async fn wait_until_ready(session: &BrowserSession) -> Result<(), CaptureError> {
    let page = session.page();
    session
        .bounded(async {
            loop {
                let state: String = page
                    .evaluate("document.readyState")
                    .await
                    .map_err(|e| CaptureError::NavigationFailed(e.to_string()))?
                    .into_value()
                    .map_err(|e| CaptureError::NavigationFailed(e.to_string()))?;
                if state == "complete" {
                    return Ok(());
                }
                sleep(READY_STATE_POLL_INTERVAL).await;
            }
        })
        .await
}
