//! Configuration and the request/result value objects.
//!
//! `CaptureRequest` arrives pre-validated from the caller (CLI or an
//! embedding server); the pipeline never re-checks the ranges. The bounds
//! are published here so validating layers agree on them.

use crate::CaptureError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Accepted viewport width range, pixels.
pub const VIEWPORT_WIDTH_RANGE: (u32, u32) = (320, 3840);

/// Accepted viewport height range, pixels.
pub const VIEWPORT_HEIGHT_RANGE: (u32, u32) = (240, 2160);

/// Maximum caller-requested wait before the screenshot, milliseconds.
pub const MAX_WAIT_TIME_MS: u64 = 10_000;

/// Ceiling applied to every blocking browser operation within a session.
pub const SESSION_TIMEOUT: Duration = Duration::from_secs(30);

/// Fixed pause after the document reaches `readyState == "complete"`,
/// giving late client-side rendering a chance to finish before consent
/// handling runs.
pub const SETTLE_DELAY: Duration = Duration::from_millis(1000);

/// Hosts-format blocklist merged over the built-in blocker rules on first
/// use. Unreachable lists degrade to the built-ins.
pub const DEFAULT_BLOCKLIST_URL: &str =
    "https://raw.githubusercontent.com/StevenBlack/hosts/master/hosts";

/// Service configuration.
///
/// # Examples
///
/// ```rust
/// use pagesnap::Config;
///
/// let config = Config {
///     output_dir: "captures".into(),
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Flat directory receiving one `<id>.png` per successful capture.
    /// Created lazily on first use.
    pub output_dir: PathBuf,

    /// Operation timeout ceiling for every blocking step in a session
    /// (default: 30 seconds).
    pub session_timeout: Duration,

    /// Path to the Chrome/Chromium executable (default: auto-detect).
    pub chrome_path: Option<String>,

    /// Custom User-Agent string (default: Chrome default).
    pub user_agent: Option<String>,

    /// Hosts-format ad/tracker blocklist fetched once per process.
    /// `None` keeps the built-in rules only.
    pub blocklist_url: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("screenshots"),
            session_timeout: SESSION_TIMEOUT,
            chrome_path: None,
            user_agent: None,
            blocklist_url: Some(DEFAULT_BLOCKLIST_URL.to_string()),
        }
    }
}

/// One validated capture request. Immutable once constructed.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CaptureRequest {
    /// Page URL, http or https.
    pub url: String,
    /// Viewport width in pixels, within [`VIEWPORT_WIDTH_RANGE`].
    pub width: u32,
    /// Viewport height in pixels, within [`VIEWPORT_HEIGHT_RANGE`].
    pub height: u32,
    /// Extra wait after consent handling, at most [`MAX_WAIT_TIME_MS`].
    pub wait_time: Duration,
    /// Capture the entire scrollable document instead of the viewport.
    pub full_page: bool,
    /// Run the cookie-consent resolver after the page settles.
    pub handle_cookie_banners: bool,
}

impl CaptureRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            width: 1280,
            height: 800,
            wait_time: Duration::ZERO,
            full_page: false,
            handle_cookie_banners: true,
        }
    }
}

/// Terminal outcome of one capture request.
///
/// Serializes to `{"success":true,"id":...,"path":...,"captured_at":...}`
/// or `{"success":false,"error":...}`; an embedding HTTP layer passes the
/// error message through verbatim.
#[derive(Debug, Clone, Serialize)]
pub struct CaptureResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub captured_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CaptureResult {
    pub fn ok(id: String, path: &Path) -> Self {
        Self {
            success: true,
            id: Some(id),
            path: Some(path.display().to_string()),
            captured_at: Some(Utc::now()),
            error: None,
        }
    }

    pub fn failure(error: &CaptureError) -> Self {
        Self {
            success: false,
            id: None,
            path: None,
            captured_at: None,
            error: Some(error.to_string()),
        }
    }
}

/// Chrome command-line arguments for an isolated headless session.
///
/// Each session gets a unique user-data directory so concurrent requests
/// never contend on a profile.
pub fn chrome_args(config: &Config, width: u32, height: u32) -> Vec<String> {
    let unique_id = format!("{}-{}", std::process::id(), uuid::Uuid::new_v4());

    let mut args = vec![
        "--headless".to_string(),
        "--no-sandbox".to_string(),
        "--disable-dev-shm-usage".to_string(),
        "--disable-gpu".to_string(),
        "--disable-background-timer-throttling".to_string(),
        "--disable-backgrounding-occluded-windows".to_string(),
        "--disable-renderer-backgrounding".to_string(),
        "--disable-extensions".to_string(),
        "--disable-default-apps".to_string(),
        "--disable-sync".to_string(),
        "--no-first-run".to_string(),
        "--mute-audio".to_string(),
        "--hide-scrollbars".to_string(),
        format!("--window-size={width},{height}"),
        format!("--user-data-dir=/tmp/pagesnap-{unique_id}"),
    ];

    if let Some(user_agent) = &config.user_agent {
        args.push(format!("--user-agent={user_agent}"));
    }

    args
}

/// Build the chromiumoxide launch configuration for one session.
pub fn browser_config(
    config: &Config,
    width: u32,
    height: u32,
) -> Result<chromiumoxide::browser::BrowserConfig, CaptureError> {
    use chromiumoxide::browser::BrowserConfig;
    use chromiumoxide::handler::viewport::Viewport;

    let mut builder = BrowserConfig::builder()
        .window_size(width, height)
        .viewport(Viewport {
            width,
            height,
            device_scale_factor: Some(1.0),
            emulating_mobile: false,
            has_touch: false,
            is_landscape: width > height,
        })
        .args(chrome_args(config, width, height));

    if let Some(chrome_path) = &config.chrome_path {
        builder = builder.chrome_executable(chrome_path);
    }

    builder.build().map_err(CaptureError::LaunchFailed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.output_dir, PathBuf::from("screenshots"));
        assert_eq!(config.session_timeout, Duration::from_secs(30));
        assert!(config.chrome_path.is_none());
        assert!(config.blocklist_url.is_some());
    }

    #[test]
    fn test_request_defaults() {
        let request = CaptureRequest::new("https://example.com");
        assert_eq!(request.url, "https://example.com");
        assert_eq!(request.width, 1280);
        assert_eq!(request.height, 800);
        assert_eq!(request.wait_time, Duration::ZERO);
        assert!(!request.full_page);
        assert!(request.handle_cookie_banners);
    }

    #[test]
    fn test_chrome_args_generation() {
        let config = Config::default();
        let args = chrome_args(&config, 1280, 800);

        assert!(args.contains(&"--headless".to_string()));
        assert!(args.contains(&"--no-sandbox".to_string()));
        assert!(args.contains(&"--disable-gpu".to_string()));
        assert!(args.contains(&"--window-size=1280,800".to_string()));
        assert!(args.iter().any(|a| a.starts_with("--user-data-dir=")));
    }

    #[test]
    fn test_chrome_args_user_agent() {
        let config = Config {
            user_agent: Some("SnapBot/1.0".to_string()),
            ..Default::default()
        };
        let args = chrome_args(&config, 800, 600);
        assert!(args.contains(&"--user-agent=SnapBot/1.0".to_string()));
    }

    #[test]
    fn test_unique_user_data_dirs() {
        let config = Config::default();
        let first = chrome_args(&config, 1280, 800);
        let second = chrome_args(&config, 1280, 800);
        let dir = |args: &[String]| {
            args.iter()
                .find(|a| a.starts_with("--user-data-dir="))
                .cloned()
        };
        assert_ne!(dir(&first), dir(&second));
    }

    #[test]
    fn test_result_serialization_shape() {
        let ok = CaptureResult::ok("abc".to_string(), Path::new("screenshots/abc.png"));
        let json = serde_json::to_value(&ok).expect("serialize");
        assert_eq!(json["success"], true);
        assert_eq!(json["id"], "abc");
        assert!(json["path"].as_str().expect("path").ends_with("abc.png"));
        assert!(json.get("error").is_none());

        let failed = CaptureResult::failure(&CaptureError::HttpStatus {
            status: 404,
            status_text: "Not Found".to_string(),
        });
        let json = serde_json::to_value(&failed).expect("serialize");
        assert_eq!(json["success"], false);
        assert!(json["error"].as_str().expect("error").contains("404"));
        assert!(json.get("id").is_none());
        assert!(json.get("path").is_none());
    }
}
