//! Browser session lifecycle.
//!
//! Each capture request owns exactly one `BrowserSession`: an isolated
//! Chrome process plus a single page at the requested viewport. The session
//! is never shared and closes exactly once; a second `close` is a no-op.

use crate::{browser_config, CaptureError, Config};
use chromiumoxide::browser::Browser;
use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
use chromiumoxide::Page;
use futures::StreamExt;
use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

pub struct BrowserSession {
    page: Page,
    browser: Option<Browser>,
    handler: Option<JoinHandle<()>>,
    aux_tasks: Vec<JoinHandle<()>>,
    timeout: Duration,
}

impl BrowserSession {
    /// Launch an isolated browser process with one page bound to the
    /// requested viewport.
    pub async fn open(config: &Config, width: u32, height: u32) -> Result<Self, CaptureError> {
        let launch_config = browser_config(config, width, height)?;

        let (browser, mut handler) = Browser::launch(launch_config)
            .await
            .map_err(|e| CaptureError::LaunchFailed(e.to_string()))?;

        // The handler stream carries CDP protocol traffic and must be
        // polled for the lifetime of the browser.
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("CDP handler event error: {e}");
                }
            }
            debug!("CDP handler stream ended");
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                teardown(browser, handler_task).await;
                return Err(CaptureError::LaunchFailed(format!(
                    "page setup failed: {e}"
                )));
            }
        };

        let emulation = match SetDeviceMetricsOverrideParams::builder()
            .width(width)
            .height(height)
            .device_scale_factor(1.0)
            .mobile(false)
            .build()
        {
            Ok(params) => params,
            Err(e) => {
                teardown(browser, handler_task).await;
                return Err(CaptureError::LaunchFailed(e));
            }
        };

        if let Err(e) = page.execute(emulation).await {
            teardown(browser, handler_task).await;
            return Err(CaptureError::LaunchFailed(format!(
                "viewport emulation failed: {e}"
            )));
        }

        Ok(Self {
            page,
            browser: Some(browser),
            handler: Some(handler_task),
            aux_tasks: Vec::new(),
            timeout: config.session_timeout,
        })
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Register a background task tied to this session. Aborted at close.
    pub(crate) fn adopt_task(&mut self, task: JoinHandle<()>) {
        self.aux_tasks.push(task);
    }

    /// Run a fallible browser operation under the session's timeout
    /// ceiling.
    pub async fn bounded<T, F>(&self, fut: F) -> Result<T, CaptureError>
    where
        F: Future<Output = Result<T, CaptureError>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(CaptureError::Timeout(self.timeout)),
        }
    }

    /// Tear the browser process down. Idempotent; never raises. Close
    /// failures are logged and swallowed so they cannot mask an earlier
    /// pipeline error.
    pub async fn close(&mut self) {
        let Some(mut browser) = self.browser.take() else {
            return;
        };

        for task in self.aux_tasks.drain(..) {
            task.abort();
        }

        if let Err(e) = self.page.clone().close().await {
            debug!("page close failed: {e}");
        }

        if let Err(e) = browser.close().await {
            warn!("browser close failed: {e}");
        }

        if let Some(handler) = self.handler.take() {
            handler.abort();
        }
    }
}

async fn teardown(mut browser: Browser, handler: JoinHandle<()>) {
    if let Err(e) = browser.close().await {
        warn!("browser close during failed open: {e}");
    }
    handler.abort();
}
