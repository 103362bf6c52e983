//! # pagesnap
//!
//! Consent-aware web page screenshot capture on headless Chrome.
//!
//! One request drives one isolated browser session through a fixed
//! pipeline: launch, ad/tracker blocking, navigation with load
//! synchronization, cookie-consent dismissal, and PNG persistence, with
//! the session guaranteed to close on every exit path.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pagesnap::{CaptureRequest, CaptureService, Config};
//!
//! #[tokio::main]
//! async fn main() {
//!     let service = CaptureService::new(Config::default());
//!
//!     let request = CaptureRequest::new("https://example.com");
//!     let result = service.capture(&request).await;
//!
//!     match result.path {
//!         Some(path) => println!("captured to {path}"),
//!         None => eprintln!("failed: {}", result.error.unwrap_or_default()),
//!     }
//! }
//! ```
//!
//! ## CLI Usage
//!
//! ```bash
//! pagesnap --url https://example.com --width 1280 --height 800 --full-page
//! ```
//!
//! Concurrent requests are independent: each owns its own browser process
//! and shares nothing but the read-only consent term table and the blocker
//! ruleset.

/// Ad/tracker ruleset and CDP request interception
pub mod blocker;

/// Screenshot rendering and persistence
pub mod capture;

/// Command-line interface and logging setup
pub mod cli;

/// Configuration, request/result value objects, Chrome arguments
pub mod config;

/// Cookie-consent banner detection and dismissal
pub mod consent;

/// Error types for the capture pipeline
pub mod error;

/// Performance metrics collection
pub mod metrics;

/// Page navigation and load synchronization
pub mod navigation;

/// Pipeline orchestration and the cleanup boundary
pub mod pipeline;

/// Browser session lifecycle management
pub mod session;

#[cfg(test)]
mod tests;

pub use blocker::BlockRules;
pub use capture::Captured;
pub use cli::{setup_logging, Cli};
pub use config::*;
pub use consent::ConsentTerms;
pub use error::*;
pub use metrics::Metrics;
pub use navigation::PageResponse;
pub use pipeline::CaptureService;
pub use session::BrowserSession;
