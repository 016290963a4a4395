//! # Delayed Page Verification
//!
//! A cancellable scheduled action keyed by page identity. When the browser
//! settles on a course page, verification is armed to fire after a fixed
//! delay; any navigation away from that page before the delay elapses cancels
//! it.
//!
//! The scheduler never reads the clock and never spawns anything. The host
//! passes `now` in and decides how to wait (the CLI uses a tokio timer).

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Identity of the page a verification belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageToken(pub String);

impl PageToken {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A verification that came due.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationRequest {
    pub page: PageToken,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Pending {
    page: PageToken,
    due: Instant,
}

/// At most one pending verification at a time.
#[derive(Debug, Clone)]
pub struct VerificationScheduler {
    delay: Duration,
    pending: Option<Pending>,
}

impl VerificationScheduler {
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Schedule verification of `page` at `now + delay`.
    ///
    /// Arming the page that is already pending keeps the original deadline.
    /// Arming a different page replaces it.
    pub fn arm(&mut self, page: PageToken, now: Instant) {
        if self.pending.as_ref().is_some_and(|p| p.page == page) {
            return;
        }
        tracing::debug!(
            page = page.as_str(),
            delay_ms = self.delay.as_millis() as u64,
            "verification armed"
        );
        self.pending = Some(Pending {
            page,
            due: now.checked_add(self.delay).unwrap_or(now),
        });
    }

    /// Cancel the pending verification unless `url` is its page.
    ///
    /// Returns `true` if something was cancelled.
    pub fn observe_url(&mut self, url: &str) -> bool {
        match &self.pending {
            Some(p) if p.page.as_str() != url => {
                tracing::debug!(page = p.page.as_str(), url, "verification cancelled");
                self.pending = None;
                true
            }
            _ => false,
        }
    }

    /// Drop any pending verification.
    pub fn cancel(&mut self) {
        self.pending = None;
    }

    /// Fire the pending verification if it is due. Fires at most once.
    pub fn poll(&mut self, now: Instant) -> Option<VerificationRequest> {
        let due = self.pending.as_ref().is_some_and(|p| now >= p.due);
        if !due {
            return None;
        }
        self.pending
            .take()
            .map(|p| VerificationRequest { page: p.page })
    }

    /// When the pending verification comes due, if any.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|p| p.due)
    }

    #[must_use]
    pub fn pending_page(&self) -> Option<&PageToken> {
        self.pending.as_ref().map(|p| &p.page)
    }
}
