//! # Page Classification
//!
//! Every URL the embedded browser reports is reduced to a [`PageClass`]. The
//! classification never fails: an empty or unparseable URL is `Other`.

use crate::primitives::{
    ACCESS_PARAM, COURSE_PATH_MARKER, DEFAULT_SITE_ROOT, LOGIN_PATH_MARKER,
};
use crate::AccessVerdict;
use serde::{Deserialize, Serialize};
use url::Url;

/// Classification of a loaded URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageClass {
    /// The site root, with or without trailing slash.
    Home,
    /// Any page whose path contains `/login`.
    Login,
    /// Any page whose path contains `/course`.
    Course,
    Other,
}

impl PageClass {
    /// Home and login pages always hide the chrome.
    #[must_use]
    pub fn suppresses_chrome(self) -> bool {
        matches!(self, PageClass::Home | PageClass::Login)
    }
}

/// Site-specific parameters of the classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatePolicy {
    /// Root URL of the course site, stored without trailing slash.
    site_root: String,
}

impl Default for GatePolicy {
    fn default() -> Self {
        Self::new(DEFAULT_SITE_ROOT)
    }
}

impl GatePolicy {
    #[must_use]
    pub fn new(site_root: impl Into<String>) -> Self {
        let root: String = site_root.into();
        Self {
            site_root: trim_trailing_slash(&root).to_string(),
        }
    }

    #[must_use]
    pub fn site_root(&self) -> &str {
        &self.site_root
    }

    /// Classify a URL. Highest priority first: Home, Login, Course, Other.
    #[must_use]
    pub fn classify(&self, raw: &str) -> PageClass {
        let Some(url) = self.resolve(raw) else {
            return PageClass::Other;
        };
        if self.is_site_root(&url) {
            return PageClass::Home;
        }
        let path = url.path();
        if path.contains(LOGIN_PATH_MARKER) {
            PageClass::Login
        } else if path.contains(COURSE_PATH_MARKER) {
            PageClass::Course
        } else {
            PageClass::Other
        }
    }

    /// Same origin and path as the site root, with no query. Fragments and
    /// host case are ignored.
    fn is_site_root(&self, url: &Url) -> bool {
        let Ok(root) = Url::parse(&self.site_root) else {
            return false;
        };
        url.scheme() == root.scheme()
            && url.host_str() == root.host_str()
            && url.port_or_known_default() == root.port_or_known_default()
            && trim_trailing_slash(url.path()) == trim_trailing_slash(root.path())
            && url.query().is_none()
    }

    /// Read the `mobileapp` verdict from a URL's query string.
    ///
    /// Only the first occurrence counts. A missing query string, a missing or
    /// empty parameter and any unknown value all mean "no verdict".
    #[must_use]
    pub fn verdict(&self, raw: &str) -> Option<AccessVerdict> {
        let url = self.resolve(raw)?;
        let value = url
            .query_pairs()
            .find(|(key, _)| key == ACCESS_PARAM)
            .map(|(_, value)| value.into_owned())?;
        AccessVerdict::from_token(&value)
    }

    /// Parse an absolute URL, or resolve a relative reference against the
    /// site root the way the browser would.
    fn resolve(&self, raw: &str) -> Option<Url> {
        if raw.is_empty() {
            return None;
        }
        match Url::parse(raw) {
            Ok(url) => Some(url),
            Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse(&self.site_root)
                .ok()?
                .join(raw)
                .ok(),
            Err(_) => None,
        }
    }
}

fn trim_trailing_slash(s: &str) -> &str {
    s.strip_suffix('/').unwrap_or(s)
}
