//! # Fixed Primitives
//!
//! Hardcoded constants of the accompanied-driving rules and the remote course
//! contract. These are compiled into the binary and are immutable at runtime;
//! only the course URLs can be overridden through configuration.

/// Length of each accompanied-driving stage, in calendar months.
///
/// Stage 1 is full supervision, stage 2 is night-only supervision.
pub const STAGE_LENGTH_MONTHS: u32 = 3;

/// Days added to the selected start date before counting begins.
///
/// The day the fee was paid does not count: the period starts tomorrow.
pub const START_OFFSET_DAYS: u64 = 1;

/// The reminder shows when the remaining days are in `(0, REMINDER_WINDOW_DAYS]`.
pub const REMINDER_WINDOW_DAYS: u32 = 30;

/// Root of the remote course site. Exact match (with or without trailing
/// slash) classifies a URL as the home page.
pub const DEFAULT_SITE_ROOT: &str = "https://hiloch100.co.il";

/// The URL the embedded browser loads on start.
pub const DEFAULT_COURSE_URL: &str = "https://hiloch100.co.il/course";

/// Query parameter carrying the access verdict on course pages.
pub const ACCESS_PARAM: &str = "mobileapp";

/// Path fragment identifying the login page.
pub const LOGIN_PATH_MARKER: &str = "/login";

/// Path fragment identifying course pages.
pub const COURSE_PATH_MARKER: &str = "/course";

/// Contact link offered on the access-denied view (WhatsApp chat with the
/// site team, message prefilled).
pub const CONTACT_TEAM_URL: &str = "https://wa.me/9720584422101?text=%E2%80%8E%20%D7%A9%D7%9C%D7%95%D7%9D%2C%20%D7%90%D7%A9%D7%9E%D7%97%20%D7%9C%D7%94%D7%95%D7%A1%D7%99%D7%A3%20%D7%AA%D7%95%D7%9B%D7%9F%20%D7%9C%D7%97%D7%91%D7%99%D7%9C%D7%AA%20%D7%94%D7%94%D7%9B%D7%A0%D7%94%20%D7%9C%D7%98%D7%A1%D7%98%20%D7%A9%D7%9C%D7%99";

/// Default delay before a course page is verified, in milliseconds.
pub const DEFAULT_VERIFICATION_DELAY_MS: u64 = 3000;

/// Display format for dates (`DD/MM/YYYY`).
pub const DISPLAY_DATE_FORMAT: &str = "%d/%m/%Y";

/// Storage format for the start date.
pub const STORAGE_DATE_FORMAT: &str = "%Y-%m-%d";

/// Maximum length of an expense type label.
pub const MAX_EXPENSE_TYPE_LENGTH: usize = 128;

/// Maximum number of expenses kept in the ledger.
pub const MAX_EXPENSES: usize = 10_000;
