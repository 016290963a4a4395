//! # Course Session
//!
//! One embedded-browser session: the access gate plus the optional delayed
//! verification.
//!
//! - Gate state is volatile, session-local state
//! - Never serialized to disk
//! - Discarded on `reset()`
//!
//! The session is the single reducer over both pieces of state. The host feeds
//! it observations in emission order and ticks it when the next verification
//! deadline passes.

use crate::gate::{AccessGate, GatePolicy, GateState, NavigationObservation, ObservationKind, PageClass};
use crate::primitives::CONTACT_TEAM_URL;
use crate::verification::{PageToken, VerificationRequest, VerificationScheduler};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// What the host renders after an observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateUpdate {
    pub chrome_visible: bool,
    /// Locked out: the access-denied view replaces the browser.
    pub blocked: bool,
    pub loading: bool,
    /// Loading indicator; never drawn over the access-denied view.
    pub show_loading: bool,
    pub load_failed: bool,
    /// The home page is pinned to the top and cannot scroll.
    pub scroll_locked: bool,
    pub page: PageClass,
}

/// Copy and contact link of the access-denied view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AccessDeniedNotice {
    pub title: &'static str,
    pub subtitle: &'static str,
    pub description: &'static str,
    pub contact_label: &'static str,
    pub contact_url: &'static str,
}

/// The access-denied view shown while the gate is blocked.
pub static ACCESS_DENIED_NOTICE: AccessDeniedNotice = AccessDeniedNotice {
    title: "אופס... נכנסת באין כניסה!",
    subtitle: "אינך זכאי להשתמש באפליקציית המובייל של הילוך מאה",
    description: "ניתן לפנות לצוות האתר לצורך שדרוג החבילה",
    contact_label: "צור קשר עם הצוות",
    contact_url: CONTACT_TEAM_URL,
};

impl GateUpdate {
    /// The access-denied view to draw, if any.
    #[must_use]
    pub fn access_denied(&self) -> Option<&'static AccessDeniedNotice> {
        self.blocked.then_some(&ACCESS_DENIED_NOTICE)
    }
}

/// A Session combines the access gate with the verification timer.
#[derive(Debug, Clone, Default)]
pub struct CourseSession {
    gate: AccessGate,
    /// Present only when delayed verification is enabled.
    verification: Option<VerificationScheduler>,
}

impl CourseSession {
    /// Create a session without delayed verification.
    #[must_use]
    pub fn new(policy: GatePolicy) -> Self {
        Self {
            gate: AccessGate::new(policy),
            verification: None,
        }
    }

    /// Create a session that verifies course pages `delay` after arrival.
    #[must_use]
    pub fn with_verification(policy: GatePolicy, delay: Duration) -> Self {
        Self {
            gate: AccessGate::new(policy),
            verification: Some(VerificationScheduler::new(delay)),
        }
    }

    /// Check if delayed verification is enabled.
    #[must_use]
    pub fn verifies_pages(&self) -> bool {
        self.verification.is_some()
    }

    /// Apply one observation.
    pub fn observe(&mut self, observation: &NavigationObservation, now: Instant) -> GateUpdate {
        self.gate.observe(observation);

        if observation.kind == ObservationKind::NavStateChanged {
            let page = self.gate.current_page();
            if let Some(scheduler) = self.verification.as_mut() {
                scheduler.observe_url(&observation.url);
                if page == PageClass::Course {
                    scheduler.arm(PageToken(observation.url.clone()), now);
                }
            }
        }

        self.update()
    }

    /// Fire the pending verification if it is due.
    pub fn tick(&mut self, now: Instant) -> Option<VerificationRequest> {
        let request = self.verification.as_mut()?.poll(now)?;
        tracing::info!(page = request.page.as_str(), "course page due for verification");
        Some(request)
    }

    /// When the host should tick next, if anything is pending.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.verification
            .as_ref()
            .and_then(VerificationScheduler::next_deadline)
    }

    /// Current render decision.
    #[must_use]
    pub fn update(&self) -> GateUpdate {
        let state = self.gate.state();
        let page = self.gate.current_page();
        GateUpdate {
            chrome_visible: self.gate.chrome_visible(),
            blocked: state.blocked,
            loading: state.loading,
            show_loading: state.loading && !state.blocked,
            load_failed: state.load_failed,
            scroll_locked: page == PageClass::Home,
            page,
        }
    }

    #[must_use]
    pub fn gate_state(&self) -> &GateState {
        self.gate.state()
    }

    #[must_use]
    pub fn chrome_visible(&self) -> bool {
        self.gate.chrome_visible()
    }

    /// Start a fresh browser session, keeping policy and verification delay.
    pub fn reset(&mut self) {
        self.gate = AccessGate::new(self.gate.policy().clone());
        if let Some(scheduler) = self.verification.as_mut() {
            scheduler.cancel();
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const COURSE: &str = "https://hiloch100.co.il/course";
    const GRANTED: &str = "https://hiloch100.co.il/course?mobileapp=granted";

    fn verifying() -> CourseSession {
        CourseSession::with_verification(GatePolicy::default(), Duration::from_secs(3))
    }

    #[test]
    fn plain_session_never_schedules() {
        let mut session = CourseSession::new(GatePolicy::default());
        let t0 = Instant::now();
        session.observe(&NavigationObservation::nav(COURSE), t0);
        assert!(!session.verifies_pages());
        assert_eq!(session.next_deadline(), None);
        assert_eq!(session.tick(t0 + Duration::from_secs(10)), None);
    }

    #[test]
    fn course_arrival_arms_verification() {
        let mut session = verifying();
        let t0 = Instant::now();
        session.observe(&NavigationObservation::nav(COURSE), t0);
        assert_eq!(session.next_deadline(), Some(t0 + Duration::from_secs(3)));

        let request = session.tick(t0 + Duration::from_secs(3)).expect("due");
        assert_eq!(request.page.as_str(), COURSE);
        assert_eq!(session.tick(t0 + Duration::from_secs(4)), None);
    }

    #[test]
    fn leaving_before_delay_cancels() {
        let mut session = verifying();
        let t0 = Instant::now();
        session.observe(&NavigationObservation::nav(COURSE), t0);
        session.observe(
            &NavigationObservation::nav("https://hiloch100.co.il/"),
            t0 + Duration::from_secs(1),
        );
        assert_eq!(session.next_deadline(), None);
        assert_eq!(session.tick(t0 + Duration::from_secs(5)), None);
    }

    #[test]
    fn moving_between_course_pages_rearms() {
        let mut session = verifying();
        let t0 = Instant::now();
        session.observe(&NavigationObservation::nav(COURSE), t0);
        let t1 = t0 + Duration::from_secs(2);
        session.observe(&NavigationObservation::nav(GRANTED), t1);
        assert_eq!(session.next_deadline(), Some(t1 + Duration::from_secs(3)));
    }

    #[test]
    fn load_events_do_not_cancel() {
        let mut session = verifying();
        let t0 = Instant::now();
        session.observe(&NavigationObservation::nav(GRANTED), t0);
        let update = session.observe(&NavigationObservation::load_end(GRANTED), t0);
        assert!(update.chrome_visible);
        assert_eq!(update.page, PageClass::Course);
        assert!(session.next_deadline().is_some());
    }

    #[test]
    fn denial_shows_notice_instead_of_spinner() {
        let mut session = CourseSession::new(GatePolicy::default());
        let t0 = Instant::now();
        let denied = "https://hiloch100.co.il/course?mobileapp=denied";
        session.observe(&NavigationObservation::load_start(denied), t0);
        let update = session.observe(&NavigationObservation::nav(denied), t0);

        assert!(update.blocked);
        assert!(update.loading);
        assert!(!update.show_loading);
        let notice = update.access_denied().expect("notice");
        assert_eq!(notice.contact_url, CONTACT_TEAM_URL);
        assert!(notice.contact_url.starts_with("https://wa.me/"));

        let update = session.observe(&NavigationObservation::nav(GRANTED), t0);
        assert!(update.access_denied().is_none());
        assert!(update.show_loading);
    }

    #[test]
    fn home_page_locks_scrolling() {
        let mut session = CourseSession::new(GatePolicy::default());
        let t0 = Instant::now();
        let update = session.observe(&NavigationObservation::nav("https://hiloch100.co.il/"), t0);
        assert!(update.scroll_locked);
        assert_eq!(update.page, PageClass::Home);

        let update = session.observe(&NavigationObservation::nav(COURSE), t0);
        assert!(!update.scroll_locked);
    }

    #[test]
    fn reset_clears_gate_and_timer() {
        let mut session = verifying();
        let t0 = Instant::now();
        session.observe(&NavigationObservation::nav(GRANTED), t0);
        session.observe(&NavigationObservation::load_end(GRANTED), t0);
        session.reset();
        assert!(!session.chrome_visible());
        assert_eq!(session.gate_state(), &GateState::new());
        assert_eq!(session.next_deadline(), None);
        assert!(session.verifies_pages());
    }
}
