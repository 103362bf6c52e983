//! Cookie-consent banner detection and dismissal.
//!
//! There is no universal DOM contract for consent banners, so `resolve`
//! layers four strategies from most-specific to most-generic and runs all
//! of them in order, never short-circuiting: a banner clicked away by an
//! early strategy can re-render and still needs the forced-removal pass.
//!
//! Every strategy is best-effort. Failures are logged and swallowed; a
//! page whose banner survives is still worth capturing.

use crate::BrowserSession;
use tracing::{debug, warn};

/// Intent category to lowercase phrase variants, across languages.
///
/// The category taxonomy is documentation only: matching tests every
/// phrase from every category. Static for the process lifetime, never
/// mutated, so no synchronization is involved.
pub const CONSENT_TERMS: &[(&str, &[&str])] = &[
    (
        "accept",
        &[
            "accept",
            "accept all",
            "accept cookies",
            "accept all cookies",
            "akzeptieren",
            "alle akzeptieren",
            "accepteren",
            "alles accepteren",
            "accepter",
            "tout accepter",
            "aceptar",
            "aceptar todo",
            "accetta",
            "accetta tutto",
            "aceitar",
            "aceitar todos",
            "akceptuj",
            "zaakceptuj wszystkie",
            "acceptera alla",
            "godkänn alla",
            "accepter alle",
            "godta alle",
            "hyväksy kaikki",
        ],
    ),
    (
        "agree",
        &[
            "agree",
            "i agree",
            "agree all",
            "agree and close",
            "einverstanden",
            "ich stimme zu",
            "zustimmen",
            "j'accepte",
            "d'accord",
            "estoy de acuerdo",
            "de acuerdo",
            "sono d'accordo",
            "concordo",
            "akkoord",
            "ik ga akkoord",
            "zgadzam się",
            "jag godkänner",
        ],
    ),
    (
        "allow",
        &[
            "allow",
            "allow all",
            "allow cookies",
            "allow all cookies",
            "zulassen",
            "alle zulassen",
            "erlauben",
            "autoriser",
            "tout autoriser",
            "permitir",
            "permitir todas",
            "consenti",
            "consenti tutti",
            "toestaan",
            "alles toestaan",
            "zezwól na wszystkie",
            "tillåt alla",
            "tillad alle",
            "salli kaikki",
        ],
    ),
    (
        "consent",
        &[
            "consent",
            "i consent",
            "give consent",
            "consentir",
            "consentire",
            "toestemming geven",
            "wyrażam zgodę",
            "samtycker",
            "samtykker",
        ],
    ),
    (
        "acknowledge",
        &[
            "got it",
            "i understand",
            "understood",
            "verstanden",
            "alles klar",
            "j'ai compris",
            "compris",
            "entendido",
            "ho capito",
            "begrepen",
            "rozumiem",
            "jag förstår",
            "selvä",
        ],
    ),
    (
        "dismiss",
        &[
            "dismiss",
            "continue without",
            "schließen und weiter",
            "weiter ohne",
            "continuer sans",
            "continuar sin",
            "continua senza",
            "doorgaan zonder",
            "kontynuuj bez",
        ],
    ),
    (
        "confirm",
        &[
            "confirm",
            "confirm all",
            "confirm choices",
            "confirm my choices",
            "bestätigen",
            "auswahl bestätigen",
            "confirmer",
            "confirmar",
            "conferma",
            "bevestigen",
            "potwierdź",
            "bekräfta",
            "bekræft",
            "vahvista",
        ],
    ),
];

/// Categories replayed inside nested frames: the high-precision subset.
const FRAME_CATEGORIES: &[&str] = &["accept", "agree", "allow"];

/// Consent-management platforms recognized by signature markers. Clicking
/// these exact controls is authoritative; no phrase matching is involved.
struct KnownSystem {
    name: &'static str,
    /// `window.<global>` set by the platform's script, if any.
    global: Option<&'static str>,
    /// Signature container selector.
    container: &'static str,
    /// Exact accept-control selectors; all matches are clicked.
    accept: &'static [&'static str],
}

const KNOWN_SYSTEMS: &[KnownSystem] = &[
    KnownSystem {
        name: "onetrust",
        global: Some("OneTrust"),
        container: "#onetrust-banner-sdk",
        accept: &[
            "#onetrust-accept-btn-handler",
            "#accept-recommended-btn-handler",
        ],
    },
    KnownSystem {
        name: "cookiebot",
        global: Some("Cookiebot"),
        container: "#CybotCookiebotDialog",
        accept: &[
            "#CybotCookiebotDialogBodyLevelButtonLevelOptinAllowAll",
            "#CybotCookiebotDialogBodyButtonAccept",
        ],
    },
    KnownSystem {
        name: "quantcast",
        global: None,
        container: "#qc-cmp2-container",
        accept: &["#qc-cmp2-ui button[mode=\"primary\"]"],
    },
    KnownSystem {
        name: "didomi",
        global: Some("Didomi"),
        container: "#didomi-host",
        accept: &["#didomi-notice-agree-button"],
    },
    KnownSystem {
        name: "trustarc",
        global: Some("truste"),
        container: "#truste-consent-track",
        accept: &["#truste-consent-button"],
    },
    KnownSystem {
        name: "consentmanager",
        global: None,
        container: "#cmpbox",
        accept: &[".cmpboxbtnyes"],
    },
    KnownSystem {
        name: "klaro",
        global: None,
        container: ".klaro .cookie-notice",
        accept: &[".klaro .cm-btn-success"],
    },
    KnownSystem {
        name: "osano",
        global: None,
        container: ".cc-window",
        accept: &[".cc-btn.cc-allow", ".cc-btn.cc-dismiss"],
    },
];

/// Container patterns cleared by the forced-removal fallback, vendor
/// containers first, generic id/class fragments after.
const REMOVAL_SELECTORS: &[&str] = &[
    "#onetrust-consent-sdk",
    "#onetrust-banner-sdk",
    "#CybotCookiebotDialog",
    "#CybotCookiebotDialogBodyUnderlay",
    "#qc-cmp2-container",
    "#didomi-host",
    "#didomi-popup",
    "#truste-consent-track",
    "#cmpbox",
    "#cmpbox2",
    "#usercentrics-root",
    ".cc-window",
    ".cc-banner",
    ".klaro",
    "[id*='cookie-banner']",
    "[class*='cookie-banner']",
    "[id*='cookie-consent']",
    "[class*='cookie-consent']",
    "[id*='cookieconsent']",
    "[class*='cookieconsent']",
    "[id*='consent-banner']",
    "[class*='consent-banner']",
    "[id*='gdpr']",
    "[class*='gdpr']",
];

/// The static multilingual phrase table and its matching predicate.
pub struct ConsentTerms;

impl ConsentTerms {
    /// Every phrase from every category, flattened.
    pub fn phrases() -> impl Iterator<Item = &'static str> {
        CONSENT_TERMS
            .iter()
            .flat_map(|(_, phrases)| phrases.iter().copied())
    }

    /// Phrases of the reduced category set used inside nested frames.
    pub fn frame_phrases() -> impl Iterator<Item = &'static str> {
        CONSENT_TERMS
            .iter()
            .filter(|(category, _)| FRAME_CATEGORIES.contains(category))
            .flat_map(|(_, phrases)| phrases.iter().copied())
    }

    /// The matching predicate: trim, lowercase, then substring containment
    /// of any phrase from any category. Deliberately permissive; banner
    /// copy varies too widely for exact matching.
    pub fn matches(text: &str) -> bool {
        let text = text.trim().to_lowercase();
        if text.is_empty() {
            return false;
        }
        Self::phrases().any(|phrase| text.contains(phrase))
    }
}

/// Detect and dismiss consent banners on the session's page.
///
/// Never raises. All four strategies run unconditionally in order; each
/// failure is contained to its own step.
pub async fn resolve(session: &BrowserSession) {
    run_step(session, "known-systems", known_systems_script()).await;
    run_step(session, "generic-controls", generic_controls_script()).await;
    run_step(session, "forced-removal", forced_removal_script()).await;
    run_step(session, "frame-pass", frame_pass_script()).await;
}

async fn run_step(session: &BrowserSession, step: &str, script: String) {
    let evaluated =
        tokio::time::timeout(session.timeout(), session.page().evaluate(script.as_str())).await;

    match evaluated {
        Err(_) => warn!("consent step {step} timed out"),
        Ok(Err(e)) => warn!("consent step {step} failed: {e}"),
        Ok(Ok(value)) => match value.into_value::<serde_json::Value>() {
            Ok(counters) => debug!("consent step {step}: {counters}"),
            Err(e) => debug!("consent step {step}: unreadable result: {e}"),
        },
    }
}

fn json_array(items: impl Iterator<Item = &'static str>) -> String {
    let items: Vec<&str> = items.collect();
    serde_json::to_string(&items).unwrap_or_else(|_| "[]".to_string())
}

fn known_systems_json() -> String {
    let systems: Vec<serde_json::Value> = KNOWN_SYSTEMS
        .iter()
        .map(|system| {
            serde_json::json!({
                "name": system.name,
                "global": system.global,
                "container": system.container,
                "accept": system.accept,
            })
        })
        .collect();
    serde_json::Value::Array(systems).to_string()
}

/// Strategy 1: platforms identified by a global flag or signature
/// container get their exact accept controls clicked.
fn known_systems_script() -> String {
    const TEMPLATE: &str = r#"
(function() {
    const systems = __SYSTEMS__;
    const out = { detected: [], clicked: 0 };
    for (const sys of systems) {
        const present = (sys.global && window[sys.global] !== undefined)
            || (sys.container && document.querySelector(sys.container) !== null);
        if (!present) continue;
        out.detected.push(sys.name);
        for (const selector of sys.accept) {
            for (const el of document.querySelectorAll(selector)) {
                try { el.click(); out.clicked++; } catch (e) {}
            }
        }
    }
    return out;
})()
"#;
    TEMPLATE.replace("__SYSTEMS__", &known_systems_json())
}

/// Strategy 2: visible buttons and links whose text contains any phrase
/// from the term table. Candidates come from interactive elements plus a
/// constrained aria-label set.
fn generic_controls_script() -> String {
    const TEMPLATE: &str = r#"
(function() {
    const phrases = __PHRASES__;
    const out = { scanned: 0, clicked: 0 };
    const visible = (el) => {
        if (el.hidden || el.getAttribute('aria-hidden') === 'true') return false;
        const style = window.getComputedStyle(el);
        return style.display !== 'none'
            && style.visibility !== 'hidden'
            && style.opacity !== '0';
    };
    const textOf = (el) =>
        (el.innerText || el.value || el.getAttribute('aria-label') || '')
            .trim().toLowerCase();
    const candidates = new Set(document.querySelectorAll(
        'button, a, [role="button"], input[type="button"], input[type="submit"]'
    ));
    for (const el of document.querySelectorAll(
        '[aria-label*="accept" i], [aria-label*="agree" i], [aria-label*="cookie" i]'
    )) {
        candidates.add(el);
    }
    for (const el of candidates) {
        out.scanned++;
        if (!visible(el)) continue;
        const text = textOf(el);
        if (!text) continue;
        if (!phrases.some((phrase) => text.includes(phrase))) continue;
        try { el.click(); out.clicked++; } catch (e) {}
    }
    return out;
})()
"#;
    TEMPLATE.replace("__PHRASES__", &json_array(ConsentTerms::phrases()))
}

/// Strategy 3: remove known banner containers outright. Runs even after a
/// successful click; some banners re-render and must be cleared for the
/// screenshot to be clean.
fn forced_removal_script() -> String {
    const TEMPLATE: &str = r#"
(function() {
    const selectors = __SELECTORS__;
    const out = { removed: 0 };
    for (const selector of selectors) {
        let nodes;
        try { nodes = document.querySelectorAll(selector); } catch (e) { continue; }
        for (const el of nodes) {
            try { el.remove(); out.removed++; } catch (e) {}
        }
    }
    // Consent overlays commonly leave a scroll lock behind.
    try {
        document.body.style.removeProperty('overflow');
        document.documentElement.style.removeProperty('overflow');
    } catch (e) {}
    return out;
})()
"#;
    TEMPLATE.replace(
        "__SELECTORS__",
        &json_array(REMOVAL_SELECTORS.iter().copied()),
    )
}

/// Strategy 4: replay a reduced phrase pass inside each embedded frame.
/// Every frame is attempted on its own; a cross-origin frame denies
/// `contentDocument` access and is skipped without affecting the rest.
fn frame_pass_script() -> String {
    const TEMPLATE: &str = r#"
(function() {
    const phrases = __PHRASES__;
    const out = { frames: 0, reachable: 0, clicked: 0 };
    for (const frame of document.querySelectorAll('iframe')) {
        out.frames++;
        try {
            const doc = frame.contentDocument;
            if (!doc) continue;
            out.reachable++;
            for (const el of doc.querySelectorAll('button, a')) {
                const text = (el.innerText || el.value || '').trim().toLowerCase();
                if (!text) continue;
                if (!phrases.some((phrase) => text.includes(phrase))) continue;
                try { el.click(); out.clicked++; } catch (e) {}
            }
        } catch (e) {
            // cross-origin frame; skip
        }
    }
    return out;
})()
"#;
    TEMPLATE.replace("__PHRASES__", &json_array(ConsentTerms::frame_phrases()))
}
