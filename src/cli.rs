//! Command-line driver.
//!
//! This is the validating caller in front of the pipeline: clap enforces
//! the documented viewport and wait ranges, so the `CaptureRequest` handed
//! to the core is already range-checked.

use crate::{CaptureRequest, Config, MAX_WAIT_TIME_MS, VIEWPORT_HEIGHT_RANGE, VIEWPORT_WIDTH_RANGE};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "pagesnap")]
#[command(about = "Consent-aware web page screenshot capture")]
#[command(version)]
pub struct Cli {
    /// Page URL to capture (http or https)
    #[arg(long, value_parser = parse_url)]
    pub url: String,

    /// Viewport width in pixels
    #[arg(
        long,
        default_value_t = 1280,
        value_parser = clap::value_parser!(u32)
            .range(VIEWPORT_WIDTH_RANGE.0 as i64..=VIEWPORT_WIDTH_RANGE.1 as i64)
    )]
    pub width: u32,

    /// Viewport height in pixels
    #[arg(
        long,
        default_value_t = 800,
        value_parser = clap::value_parser!(u32)
            .range(VIEWPORT_HEIGHT_RANGE.0 as i64..=VIEWPORT_HEIGHT_RANGE.1 as i64)
    )]
    pub height: u32,

    /// Extra wait before the screenshot, in milliseconds
    #[arg(
        long,
        default_value_t = 0,
        value_parser = clap::value_parser!(u64).range(0..=MAX_WAIT_TIME_MS)
    )]
    pub wait: u64,

    /// Capture the entire scrollable document instead of the viewport
    #[arg(long)]
    pub full_page: bool,

    /// Skip cookie-consent banner handling
    #[arg(long)]
    pub no_banner_handling: bool,

    /// Output directory for captured PNGs
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Chrome executable path
    #[arg(long)]
    pub chrome_path: Option<String>,

    /// Enable verbose logging
    #[arg(long)]
    pub verbose: bool,
}

impl Cli {
    pub fn to_config(&self) -> Config {
        let mut config = Config::default();
        if let Some(output_dir) = &self.output_dir {
            config.output_dir = output_dir.clone();
        }
        if let Some(chrome_path) = &self.chrome_path {
            config.chrome_path = Some(chrome_path.clone());
        }
        config
    }

    pub fn to_request(&self) -> CaptureRequest {
        CaptureRequest {
            url: self.url.clone(),
            width: self.width,
            height: self.height,
            wait_time: Duration::from_millis(self.wait),
            full_page: self.full_page,
            handle_cookie_banners: !self.no_banner_handling,
        }
    }
}

fn parse_url(value: &str) -> Result<String, String> {
    let parsed = url::Url::parse(value).map_err(|e| e.to_string())?;
    match parsed.scheme() {
        "http" | "https" => Ok(value.to_string()),
        other => Err(format!("unsupported URL scheme: {other}")),
    }
}

pub fn setup_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_map_to_request() {
        let cli = Cli::parse_from(["pagesnap", "--url", "https://example.com"]);
        let request = cli.to_request();
        assert_eq!(request.url, "https://example.com");
        assert_eq!(request.width, 1280);
        assert_eq!(request.height, 800);
        assert_eq!(request.wait_time, Duration::ZERO);
        assert!(!request.full_page);
        assert!(request.handle_cookie_banners);
    }

    #[test]
    fn test_banner_handling_can_be_disabled() {
        let cli = Cli::parse_from([
            "pagesnap",
            "--url",
            "https://example.com",
            "--no-banner-handling",
        ]);
        assert!(!cli.to_request().handle_cookie_banners);
    }

    #[test]
    fn test_viewport_ranges_enforced() {
        let too_narrow =
            Cli::try_parse_from(["pagesnap", "--url", "https://example.com", "--width", "100"]);
        assert!(too_narrow.is_err());

        let too_tall = Cli::try_parse_from([
            "pagesnap",
            "--url",
            "https://example.com",
            "--height",
            "9999",
        ]);
        assert!(too_tall.is_err());

        let in_range = Cli::try_parse_from([
            "pagesnap",
            "--url",
            "https://example.com",
            "--width",
            "3840",
            "--height",
            "2160",
        ]);
        assert!(in_range.is_ok());
    }

    #[test]
    fn test_wait_range_enforced() {
        let too_long = Cli::try_parse_from([
            "pagesnap",
            "--url",
            "https://example.com",
            "--wait",
            "20000",
        ]);
        assert!(too_long.is_err());
    }

    #[test]
    fn test_url_scheme_enforced() {
        assert!(Cli::try_parse_from(["pagesnap", "--url", "ftp://example.com"]).is_err());
        assert!(Cli::try_parse_from(["pagesnap", "--url", "not a url"]).is_err());
        assert!(Cli::try_parse_from(["pagesnap", "--url", "http://example.com"]).is_ok());
    }

    #[test]
    fn test_output_dir_flows_into_config() {
        let cli = Cli::parse_from([
            "pagesnap",
            "--url",
            "https://example.com",
            "--output-dir",
            "/tmp/captures",
        ]);
        assert_eq!(cli.to_config().output_dir, PathBuf::from("/tmp/captures"));
    }
}
