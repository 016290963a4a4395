//! # Access Gate
//!
//! Decides whether the app's navigation chrome (the tab bar over the embedded
//! course browser) is visible, and whether the user is locked out.
//!
//! The gate consumes the browser's observations strictly in emission order.
//! Browsers fire several navigation events per redirect burst, so a single
//! `mobileapp=denied` observation must override a grant seen a moment
//! earlier. Only a home or login page clears the lockout (or a later
//! explicit grant).
//!
//! ## Transition rule (`NavStateChanged`)
//!
//! | Page class | Effect |
//! |------------|--------|
//! | Home | `blocked = false` |
//! | Login | `access_granted = false`, `blocked = false` |
//! | Course, `mobileapp=denied` | `blocked = true`, `access_granted = false` |
//! | Course, `mobileapp=granted` | `blocked = false`, `access_granted = true` |
//! | Course, no verdict / Other | none |
//!
//! Independently, a navigation to a different URL invalidates
//! `page_loaded` until the next `LoadEnd`.
//!
//! ## Visibility
//!
//! `access_granted && !blocked && page_loaded` and the current page is
//! neither home nor login. Recomputed on every call, never stored.

mod page;

pub use page::{GatePolicy, PageClass};

use crate::AccessVerdict;
use serde::{Deserialize, Serialize};

// =============================================================================
// OBSERVATIONS
// =============================================================================

/// Lifecycle event kinds reported by the embedded browser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObservationKind {
    NavStateChanged,
    LoadStart,
    LoadEnd,
    LoadError,
    /// Data posted from the loaded page (verification variant only).
    PageMessage(String),
}

/// One event from the embedded browser. Ephemeral, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationObservation {
    pub url: String,
    pub kind: ObservationKind,
}

impl NavigationObservation {
    #[must_use]
    pub fn new(url: impl Into<String>, kind: ObservationKind) -> Self {
        Self {
            url: url.into(),
            kind,
        }
    }

    #[must_use]
    pub fn nav(url: impl Into<String>) -> Self {
        Self::new(url, ObservationKind::NavStateChanged)
    }

    #[must_use]
    pub fn load_start(url: impl Into<String>) -> Self {
        Self::new(url, ObservationKind::LoadStart)
    }

    #[must_use]
    pub fn load_end(url: impl Into<String>) -> Self {
        Self::new(url, ObservationKind::LoadEnd)
    }

    #[must_use]
    pub fn load_error(url: impl Into<String>) -> Self {
        Self::new(url, ObservationKind::LoadError)
    }
}

// =============================================================================
// GATE STATE
// =============================================================================

/// Session-scoped gate state. Mutated only by [`reduce`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateState {
    pub current_url: String,
    pub access_granted: bool,
    pub blocked: bool,
    /// The current page finished loading.
    pub page_loaded: bool,
    /// A load is in flight (loading indicator shown).
    pub loading: bool,
    /// The last load failed.
    pub load_failed: bool,
}

impl Default for GateState {
    fn default() -> Self {
        Self {
            current_url: String::new(),
            access_granted: false,
            blocked: false,
            page_loaded: false,
            loading: true,
            load_failed: false,
        }
    }
}

impl GateState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the navigation chrome should be drawn right now.
    #[must_use]
    pub fn chrome_visible(&self, policy: &GatePolicy) -> bool {
        self.access_granted
            && !self.blocked
            && self.page_loaded
            && !policy.classify(&self.current_url).suppresses_chrome()
    }

    /// Apply a verdict to the access flags.
    fn apply_verdict(&mut self, verdict: AccessVerdict) {
        match verdict {
            AccessVerdict::Denied => {
                self.blocked = true;
                self.access_granted = false;
            }
            AccessVerdict::Granted => {
                self.blocked = false;
                self.access_granted = true;
            }
        }
    }
}

// =============================================================================
// REDUCER
// =============================================================================

/// The gate reducer: `(state, observation) -> state`.
///
/// Pure and total. Unknown URLs, missing query strings and messages that
/// carry no verdict leave the access flags untouched.
#[must_use]
pub fn reduce(
    state: &GateState,
    observation: &NavigationObservation,
    policy: &GatePolicy,
) -> GateState {
    let mut next = state.clone();

    match &observation.kind {
        ObservationKind::NavStateChanged => {
            if next.current_url != observation.url {
                next.page_loaded = false;
                next.current_url.clone_from(&observation.url);
            }

            match policy.classify(&observation.url) {
                PageClass::Home => next.blocked = false,
                PageClass::Login => {
                    next.access_granted = false;
                    next.blocked = false;
                }
                PageClass::Course => {
                    if let Some(verdict) = policy.verdict(&observation.url) {
                        next.apply_verdict(verdict);
                    }
                }
                PageClass::Other => {}
            }
        }
        ObservationKind::LoadStart => {
            next.loading = true;
            next.load_failed = false;
        }
        ObservationKind::LoadEnd => {
            next.loading = false;
            next.page_loaded = true;
            next.load_failed = false;
        }
        ObservationKind::LoadError => {
            next.loading = false;
            next.page_loaded = false;
            next.load_failed = true;
        }
        ObservationKind::PageMessage(data) => {
            if let (PageClass::Course, Some(verdict)) =
                (policy.classify(&next.current_url), message_verdict(data))
            {
                next.apply_verdict(verdict);
            }
        }
    }

    next
}

/// Extract a verdict from a page message of the form `mobileapp=<verdict>`.
fn message_verdict(data: &str) -> Option<AccessVerdict> {
    let (key, value) = data.trim().split_once('=')?;
    if key.trim() != crate::primitives::ACCESS_PARAM {
        return None;
    }
    AccessVerdict::from_token(value.trim())
}

// =============================================================================
// ACCESS GATE
// =============================================================================

/// Owned gate: the single reducer over one embedded-browser session.
#[derive(Debug, Clone, Default)]
pub struct AccessGate {
    policy: GatePolicy,
    state: GateState,
}

impl AccessGate {
    #[must_use]
    pub fn new(policy: GatePolicy) -> Self {
        Self {
            policy,
            state: GateState::new(),
        }
    }

    /// Apply one observation and return the resulting visibility.
    pub fn observe(&mut self, observation: &NavigationObservation) -> bool {
        let next = reduce(&self.state, observation, &self.policy);

        if next.access_granted != self.state.access_granted || next.blocked != self.state.blocked {
            tracing::info!(
                url = %observation.url,
                access_granted = next.access_granted,
                blocked = next.blocked,
                "access state changed"
            );
        }
        if next.load_failed && !self.state.load_failed {
            tracing::warn!(url = %observation.url, "course page failed to load");
        }

        self.state = next;
        let visible = self.chrome_visible();
        tracing::debug!(
            kind = ?observation.kind,
            url = %observation.url,
            page_loaded = self.state.page_loaded,
            visible,
            "gate observation"
        );
        visible
    }

    #[must_use]
    pub fn chrome_visible(&self) -> bool {
        self.state.chrome_visible(&self.policy)
    }

    #[must_use]
    pub fn is_blocked(&self) -> bool {
        self.state.blocked
    }

    #[must_use]
    pub fn state(&self) -> &GateState {
        &self.state
    }

    #[must_use]
    pub fn policy(&self) -> &GatePolicy {
        &self.policy
    }

    /// Classification of the page currently shown.
    #[must_use]
    pub fn current_page(&self) -> PageClass {
        self.policy.classify(&self.state.current_url)
    }
}

// =============================================================================
// TESTS
// =============================================================================
