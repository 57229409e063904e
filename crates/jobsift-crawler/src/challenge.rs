//! Verification challenge detection and resolution.
//!
//! Job boards front their result pages with interstitial verification
//! challenges. This module drives a bounded state machine over the live
//! page: scan for known challenge signatures, activate the verification
//! control when one is exposed, otherwise wait the challenge out, then
//! recheck whether real results have appeared. Every path terminates; an
//! unresolved challenge degrades to [`VerificationState::Failed`] and the
//! crawl proceeds with whatever the page gives it.

use jobsift_browser::Driver;
use once_cell::sync::Lazy;
use rand::Rng;
use scraper::{Html, Selector};
use std::time::{Duration, Instant};

/// Markup markers that indicate the real results page has rendered.
const SETTLED_MARKERS: &[&str] = &["job_seen_beacon", "jobsearch"];

/// Markup markers left behind by an unresolved challenge interstitial.
const RESIDUE_MARKERS: &[&str] = &["cf-browser-verification", "cf-challenge"];

/// Finds the verification control and reports whether it is enabled.
const CONTROL_ENABLED_JS: &str = r#"(() => {
    const controls = [...document.querySelectorAll('button, input[type="button"]')];
    const target = controls.find(el =>
        ((el.textContent || el.value || '').toLowerCase().includes('verify')));
    return !!target && !target.disabled;
})()"#;

/// Clicks the verification control through the DOM API. A scripted
/// `.click()` lands even when an overlay would intercept a pointer click.
const CONTROL_ACTIVATE_JS: &str = r#"(() => {
    const controls = [...document.querySelectorAll('button, input[type="button"]')];
    const target = controls.find(el =>
        ((el.textContent || el.value || '').toLowerCase().includes('verify')));
    if (!target || target.disabled) { return false; }
    target.click();
    return true;
})()"#;

static BUTTON_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("button").expect("valid selector"));

/// Where the resolver is in the challenge lifecycle.
///
/// Only [`VerificationState::Resolved`] and [`VerificationState::Failed`]
/// are terminal. `Failed` is soft: callers log it and continue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationState {
    /// No challenge observed yet; the page is being scanned
    None,
    /// A challenge signature matched the page
    Detected,
    /// An enabled verification control is being activated
    Interacting,
    /// Waiting out a passive challenge with no actionable control
    Waiting,
    /// Checking whether real results have appeared
    Recheck,
    /// The results page rendered; crawling may proceed
    Resolved,
    /// The recheck budget ran out with the challenge still up
    Failed,
}

impl std::fmt::Display for VerificationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::None => "none",
            Self::Detected => "detected",
            Self::Interacting => "interacting",
            Self::Waiting => "waiting",
            Self::Recheck => "recheck",
            Self::Resolved => "resolved",
            Self::Failed => "failed",
        };
        write!(f, "{name}")
    }
}

/// How a challenge signature is probed against a markup snapshot.
#[derive(Debug, Clone, Copy)]
pub enum Probe {
    /// A CSS selector must match
    Css(&'static str),
    /// A `<button>` whose text contains this (lowercased) fragment
    ButtonText(&'static str),
    /// The raw markup contains this text
    Text(&'static str),
}

/// One known challenge pattern.
#[derive(Debug, Clone, Copy)]
pub struct ChallengeSignature {
    /// Short name used in logs
    pub name: &'static str,
    /// How to detect this pattern on the page
    pub probe: Probe,
    /// Whether this pattern exposes a verification control worth clicking
    pub actionable: bool,
}

/// The built-in signature list, probed in order. First match wins.
#[must_use]
pub fn default_signatures() -> Vec<ChallengeSignature> {
    vec![
        ChallengeSignature {
            name: "verify-button",
            probe: Probe::ButtonText("verify"),
            actionable: true,
        },
        ChallengeSignature {
            name: "verify-input",
            probe: Probe::Css(r#"input[type="button"][value*="erify"]"#),
            actionable: true,
        },
        ChallengeSignature {
            name: "additional-verification-banner",
            probe: Probe::Text("Additional Verification Required"),
            actionable: false,
        },
        ChallengeSignature {
            name: "cf-browser-verification",
            probe: Probe::Css("div.cf-browser-verification"),
            actionable: false,
        },
        ChallengeSignature {
            name: "cf-challenge",
            probe: Probe::Css(r#"div[class*="cf-challenge"]"#),
            actionable: false,
        },
        ChallengeSignature {
            name: "checking-connection",
            probe: Probe::Text("Checking if the site connection is secure"),
            actionable: false,
        },
    ]
}

/// Timing knobs for the resolver. All fields are public so tests can run
/// the state machine against scripted drivers without real waits.
#[derive(Debug, Clone)]
pub struct ChallengeTiming {
    /// Per-signature scan budget, in milliseconds
    pub probe_timeout_ms: u64,
    /// Poll interval while waiting on the page, in milliseconds
    pub poll_interval_ms: u64,
    /// Pause bounds after activating a control, in milliseconds
    pub interact_pause_ms: (u64, u64),
    /// Pause bounds while waiting out a passive challenge, in milliseconds
    pub passive_pause_ms: (u64, u64),
    /// How long one recheck watches for results, in milliseconds
    pub recheck_timeout_ms: u64,
    /// How many failed rechecks before giving up
    pub max_rechecks: u32,
}

impl Default for ChallengeTiming {
    fn default() -> Self {
        Self {
            probe_timeout_ms: 5000,
            poll_interval_ms: 250,
            interact_pause_ms: (3000, 7000),
            passive_pause_ms: (5000, 10_000),
            recheck_timeout_ms: 20_000,
            max_rechecks: 3,
        }
    }
}

impl ChallengeTiming {
    /// Zero-wait timing for scripted drivers.
    #[must_use]
    pub fn immediate() -> Self {
        Self {
            probe_timeout_ms: 0,
            poll_interval_ms: 0,
            interact_pause_ms: (0, 0),
            passive_pause_ms: (0, 0),
            recheck_timeout_ms: 0,
            max_rechecks: 3,
        }
    }
}

/// Sleep for a duration drawn uniformly from `range` (in milliseconds).
pub(crate) async fn pause(range: (u64, u64)) {
    let (low, high) = range;
    let millis = if high > low {
        rand::thread_rng().gen_range(low..=high)
    } else {
        low
    };
    if millis > 0 {
        tokio::time::sleep(Duration::from_millis(millis)).await;
    }
}

/// Check one signature against a markup snapshot.
#[must_use]
pub fn signature_matches(html: &str, signature: &ChallengeSignature) -> bool {
    match signature.probe {
        Probe::Css(css) => {
            let Ok(selector) = Selector::parse(css) else {
                return false;
            };
            Html::parse_document(html).select(&selector).next().is_some()
        }
        Probe::ButtonText(fragment) => Html::parse_document(html)
            .select(&BUTTON_SELECTOR)
            .any(|button| {
                button
                    .text()
                    .collect::<String>()
                    .to_lowercase()
                    .contains(fragment)
            }),
        Probe::Text(text) => html.contains(text),
    }
}

/// Whether the snapshot shows the real results page.
#[must_use]
pub fn content_settled(html: &str) -> bool {
    SETTLED_MARKERS.iter().any(|marker| html.contains(marker))
}

/// Whether the snapshot still carries challenge interstitial markup.
#[must_use]
pub fn challenge_residue(html: &str) -> bool {
    RESIDUE_MARKERS.iter().any(|marker| html.contains(marker))
}

/// Drives the challenge state machine over one navigation event.
///
/// Created fresh per navigation; the resolver owns no page state beyond
/// the current [`VerificationState`].
pub struct ChallengeResolver<'a, D: Driver> {
    driver: &'a D,
    host: String,
    timing: ChallengeTiming,
    signatures: Vec<ChallengeSignature>,
    state: VerificationState,
}

impl<'a, D: Driver> ChallengeResolver<'a, D> {
    /// Create a resolver for the given driver and expected host.
    pub fn new(driver: &'a D, host: impl Into<String>) -> Self {
        Self {
            driver,
            host: host.into(),
            timing: ChallengeTiming::default(),
            signatures: default_signatures(),
            state: VerificationState::None,
        }
    }

    /// Replace the timing knobs.
    #[must_use]
    pub fn with_timing(mut self, timing: ChallengeTiming) -> Self {
        self.timing = timing;
        self
    }

    /// Replace the signature list.
    #[must_use]
    pub fn with_signatures(mut self, signatures: Vec<ChallengeSignature>) -> Self {
        self.signatures = signatures;
        self
    }

    /// The resolver's current state.
    #[must_use]
    pub fn state(&self) -> VerificationState {
        self.state
    }

    /// Run the state machine to a terminal state.
    ///
    /// Infallible by design: driver faults during probing count as
    /// non-matches, and an exhausted recheck budget returns
    /// [`VerificationState::Failed`] rather than an error.
    pub async fn resolve(&mut self) -> VerificationState {
        self.state = VerificationState::None;
        let mut active: Option<usize> = None;
        let mut failed_rechecks = 0u32;

        loop {
            match self.state {
                VerificationState::None => match self.scan().await {
                    Some(idx) => {
                        tracing::info!(
                            signature = self.signatures[idx].name,
                            "verification challenge detected"
                        );
                        active = Some(idx);
                        self.state = VerificationState::Detected;
                    }
                    None => {
                        tracing::debug!("no challenge signature matched");
                        self.state = VerificationState::Resolved;
                    }
                },
                VerificationState::Detected => {
                    let actionable = active.is_some_and(|idx| self.signatures[idx].actionable);
                    self.state = if actionable && self.control_enabled().await {
                        VerificationState::Interacting
                    } else {
                        VerificationState::Waiting
                    };
                }
                VerificationState::Interacting => {
                    self.activate_control().await;
                    pause(self.timing.interact_pause_ms).await;
                    self.state = VerificationState::Recheck;
                }
                VerificationState::Waiting => {
                    pause(self.timing.passive_pause_ms).await;
                    self.state = VerificationState::Recheck;
                }
                VerificationState::Recheck => {
                    if self.recheck().await {
                        self.state = VerificationState::Resolved;
                    } else {
                        failed_rechecks += 1;
                        if failed_rechecks >= self.timing.max_rechecks {
                            tracing::warn!(
                                rechecks = failed_rechecks,
                                "challenge still up after recheck budget, giving up"
                            );
                            self.state = VerificationState::Failed;
                        } else {
                            tracing::debug!(
                                recheck = failed_rechecks,
                                "challenge still up, retrying"
                            );
                            self.state = VerificationState::Detected;
                        }
                    }
                }
                VerificationState::Resolved | VerificationState::Failed => {
                    return self.state;
                }
            }
        }
    }

    /// Probe each signature in order, each with its own bounded wait.
    async fn scan(&self) -> Option<usize> {
        for (idx, signature) in self.signatures.iter().enumerate() {
            let deadline = Instant::now() + Duration::from_millis(self.timing.probe_timeout_ms);
            loop {
                match self.driver.content().await {
                    Ok(html) => {
                        if signature_matches(&html, signature) {
                            return Some(idx);
                        }
                    }
                    Err(e) => {
                        tracing::debug!("snapshot failed during challenge scan: {}", e);
                    }
                }
                if Instant::now() >= deadline {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(self.timing.poll_interval_ms)).await;
            }
        }
        None
    }

    async fn control_enabled(&self) -> bool {
        match self.driver.evaluate(CONTROL_ENABLED_JS).await {
            Ok(value) => value.as_bool().unwrap_or(false),
            Err(e) => {
                tracing::debug!("control probe failed: {}", e);
                false
            }
        }
    }

    async fn activate_control(&self) {
        match self.driver.evaluate(CONTROL_ACTIVATE_JS).await {
            Ok(value) if value.as_bool() == Some(true) => {
                tracing::info!("verification control activated");
            }
            Ok(_) => tracing::debug!("verification control was gone or disabled"),
            Err(e) => tracing::debug!("verification control activation failed: {}", e),
        }
    }

    /// Watch, bounded by the recheck budget, for the results page.
    ///
    /// Resolution means either real result markup appeared, or the session
    /// settled back on the expected host with no challenge residue left.
    async fn recheck(&self) -> bool {
        let deadline = Instant::now() + Duration::from_millis(self.timing.recheck_timeout_ms);
        loop {
            let html = self.driver.content().await.unwrap_or_default();
            if content_settled(&html) {
                return true;
            }
            if let Ok(url) = self.driver.current_url().await {
                if url.contains(&self.host) && !challenge_residue(&html) {
                    return true;
                }
            }
            if Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(Duration::from_millis(self.timing.poll_interval_ms)).await;
        }
    }
}
