//! Ad/tracker request blocking.
//!
//! The ruleset is resolved once per process: the built-in domain and
//! pattern lists, widened by a hosts-format blocklist fetched over HTTP
//! when one is configured. `attach` then intercepts every request of a
//! session through the CDP Fetch domain and fails the ones the ruleset
//! rejects, before the page starts loading.

use crate::{BrowserSession, CaptureError, Config};
use chromiumoxide::cdp::browser_protocol::fetch::{
    ContinueRequestParams, EnableParams, EventRequestPaused, FailRequestParams,
};
use chromiumoxide::cdp::browser_protocol::network::ErrorReason;
use futures::StreamExt;
use std::collections::HashSet;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, info, trace, warn};
use url::Url;

const BLOCKLIST_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

static RULES: OnceCell<BlockRules> = OnceCell::const_new();

/// Immutable filter ruleset shared by all sessions.
#[derive(Debug)]
pub struct BlockRules {
    blocked_domains: HashSet<String>,
}

impl BlockRules {
    /// The bundled fallback rules: a short list of the ad and analytics
    /// hosts that dominate page clutter.
    pub fn builtin() -> Self {
        let blocked_domains = [
            "doubleclick.net",
            "googlesyndication.com",
            "googleadservices.com",
            "googletagmanager.com",
            "google-analytics.com",
            "analytics.google.com",
            "adnxs.com",
            "amazon-adsystem.com",
            "adsystem.amazon.com",
            "criteo.com",
            "taboola.com",
            "outbrain.com",
            "hotjar.com",
            "mixpanel.com",
            "segment.com",
            "scorecardresearch.com",
            "quantserve.com",
            "facebook.net",
        ]
        .into_iter()
        .map(str::to_string)
        .collect();

        Self { blocked_domains }
    }

    pub fn len(&self) -> usize {
        self.blocked_domains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocked_domains.is_empty()
    }

    /// Whether a request for `url` should be failed before it leaves the
    /// browser.
    pub fn should_block(&self, url: &str) -> bool {
        let Ok(parsed) = Url::parse(url) else {
            return false;
        };
        let Some(domain) = parsed.domain() else {
            return false;
        };

        if self.domain_blocked(domain) {
            return true;
        }

        let url_lower = url.to_lowercase();
        contains_ad_pattern(&url_lower) || contains_tracker_pattern(&url_lower)
    }

    /// Walks parent domains so `ads.doubleclick.net` matches a
    /// `doubleclick.net` entry without scanning the whole set.
    fn domain_blocked(&self, domain: &str) -> bool {
        let mut rest = domain;
        loop {
            if self.blocked_domains.contains(rest) {
                return true;
            }
            match rest.split_once('.') {
                Some((_, parent)) if parent.contains('.') => rest = parent,
                _ => return false,
            }
        }
    }

    fn extend(&mut self, domains: HashSet<String>) {
        self.blocked_domains.extend(domains);
    }
}

fn contains_ad_pattern(url: &str) -> bool {
    let ad_patterns = [
        "/ads/",
        "/ad/",
        "/advertisement/",
        "/advertising/",
        "googleads",
        "googlesyndication",
        "doubleclick",
        "adsystem",
        "adnxs",
        "amazon-adsystem",
    ];

    ad_patterns.iter().any(|pattern| url.contains(pattern))
}

fn contains_tracker_pattern(url: &str) -> bool {
    let tracker_patterns = [
        "/analytics",
        "/tracking/",
        "/telemetry/",
        "hotjar",
        "mixpanel",
        "segment.io",
        "gtag/js",
        "facebook.com/tr",
    ];

    tracker_patterns.iter().any(|pattern| url.contains(pattern))
}

/// Resolve the process-wide ruleset, fetching the configured blocklist on
/// first use. Fetch problems degrade to the built-in rules; they never
/// fail the caller.
pub async fn ruleset(blocklist_url: Option<String>) -> &'static BlockRules {
    RULES
        .get_or_init(|| async move {
            let mut rules = BlockRules::builtin();
            if let Some(url) = blocklist_url {
                match fetch_hosts_list(&url).await {
                    Ok(domains) => {
                        info!("blocklist loaded: {} domains from {url}", domains.len());
                        rules.extend(domains);
                    }
                    Err(e) => {
                        warn!("blocklist fetch failed, using built-in rules only: {e}");
                    }
                }
            }
            rules
        })
        .await
}

async fn fetch_hosts_list(url: &str) -> Result<HashSet<String>, reqwest::Error> {
    let client = reqwest::Client::builder()
        .timeout(BLOCKLIST_FETCH_TIMEOUT)
        .build()?;
    let body = client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;
    Ok(parse_hosts(&body))
}

/// Parse hosts-file syntax (`0.0.0.0 domain` per line) into a domain set.
fn parse_hosts(body: &str) -> HashSet<String> {
    body.lines()
        .filter_map(|line| {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                return None;
            }
            let mut parts = line.split_whitespace();
            match (parts.next(), parts.next()) {
                (Some("0.0.0.0") | Some("127.0.0.1"), Some(domain))
                    if domain != "localhost" && domain.contains('.') =>
                {
                    Some(domain.to_string())
                }
                _ => None,
            }
        })
        .collect()
}

/// Enable request interception on the session and keep filtering until the
/// session closes. Must run before navigation so blocked resources never
/// load.
pub async fn attach(session: &mut BrowserSession, config: &Config) -> Result<(), CaptureError> {
    let rules = ruleset(config.blocklist_url.clone()).await;
    let page = session.page().clone();

    // Listener first, then enable, so no paused request slips past.
    let mut paused = page
        .event_listener::<EventRequestPaused>()
        .await
        .map_err(|e| CaptureError::BlockerInit(e.to_string()))?;

    page.execute(EnableParams::default())
        .await
        .map_err(|e| CaptureError::BlockerInit(e.to_string()))?;

    let task = tokio::spawn(async move {
        while let Some(event) = paused.next().await {
            let url = event.request.url.as_str();
            if rules.should_block(url) {
                trace!("blocked request: {url}");
                metrics::increment_counter!("pagesnap_blocked_requests_total");
                let params =
                    FailRequestParams::new(event.request_id.clone(), ErrorReason::BlockedByClient);
                if let Err(e) = page.execute(params).await {
                    debug!("failing blocked request failed: {e}");
                }
            } else {
                let params = ContinueRequestParams::new(event.request_id.clone());
                if let Err(e) = page.execute(params).await {
                    debug!("continuing request failed: {e}");
                }
            }
        }
        debug!("request interception stream ended");
    });

    session.adopt_task(task);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_rules_block_ad_hosts() {
        let rules = BlockRules::builtin();
        assert!(rules.should_block("https://doubleclick.net/pixel"));
        assert!(rules.should_block("https://ads.doubleclick.net/instream/ad.js"));
        assert!(rules.should_block("https://www.googletagmanager.com/gtm.js?id=GTM-1"));
        assert!(rules.should_block("https://static.hotjar.com/c/hotjar.js"));
    }

    #[test]
    fn test_pattern_matching_without_domain_entry() {
        let rules = BlockRules::builtin();
        assert!(rules.should_block("https://cdn.example.com/ads/banner.js"));
        assert!(rules.should_block("https://example.com/assets/analytics.min.js"));
    }

    #[test]
    fn test_ordinary_requests_pass() {
        let rules = BlockRules::builtin();
        assert!(!rules.should_block("https://example.com/main.js"));
        assert!(!rules.should_block("https://example.com/style.css"));
        assert!(!rules.should_block("https://cdn.example.com/img/logo.png"));
    }

    #[test]
    fn test_unparseable_urls_pass() {
        let rules = BlockRules::builtin();
        assert!(!rules.should_block("not a url"));
        assert!(!rules.should_block("data:text/plain,hello"));
    }

    #[test]
    fn test_domain_suffix_walk_stops_at_tld() {
        let mut rules = BlockRules::builtin();
        rules.extend(std::iter::once("tracker.example.org".to_string()).collect());
        assert!(rules.should_block("https://a.b.tracker.example.org/x"));
        assert!(!rules.should_block("https://example.org/x"));
    }

    #[test]
    fn test_parse_hosts() {
        let body = "\
# comment line
0.0.0.0 ads.bad.example
127.0.0.1 tracker.bad.example
0.0.0.0 localhost
0.0.0.0 plainhost
10.0.0.1 not-a-block-entry.example

";
        let domains = parse_hosts(body);
        assert!(domains.contains("ads.bad.example"));
        assert!(domains.contains("tracker.bad.example"));
        assert!(!domains.contains("localhost"));
        assert!(!domains.contains("plainhost"));
        assert!(!domains.contains("not-a-block-entry.example"));
        assert_eq!(domains.len(), 2);
    }
}
