//! # hiloch-core
//!
//! The countdown and access-gating engine for the Hiloch companion app - THE LOGIC.
//!
//! Two cooperating subsystems:
//! - `system`: the accompanied-driving stage calculator, a pure function of a
//!   start date and "today"
//! - `gate`: the access gate state machine, a reducer over the navigation
//!   events of the embedded course browser
//!
//! Around them sit the delayed page verification (`verification`), the
//! per-browser `session`, and the persisted user data (`storage`, `profile`,
//! `expenses`).
//!
//! ## Architectural Constraints
//!
//! - Never reads the clock: "today" and "now" are always arguments
//! - Never initiates interaction; only reacts to explicit observations or ticks
//! - Has NO async, NO network dependencies (pure Rust)
//! - Integer arithmetic only

// =============================================================================
// MODULES
// =============================================================================

pub mod expenses;
pub mod gate;
pub mod primitives;
pub mod profile;
pub mod session;
pub mod storage;
pub mod system;
pub mod types;
pub mod verification;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{AccessVerdict, HilochError, StorageKey};

// =============================================================================
// RE-EXPORTS: Access Gate
// =============================================================================

pub use gate::{
    AccessGate, GatePolicy, GateState, NavigationObservation, ObservationKind, PageClass, reduce,
};
pub use session::{ACCESS_DENIED_NOTICE, AccessDeniedNotice, CourseSession, GateUpdate};
pub use verification::{PageToken, VerificationRequest, VerificationScheduler};

// =============================================================================
// RE-EXPORTS: Persistence
// =============================================================================

pub use expenses::{EXPENSE_TYPES, Expense, ExpenseDraft, ExpenseLedger, format_amount};
pub use profile::Profile;
pub use storage::{KeyValueStore, MemoryStore, RedbStore, StorageBackend};

// =============================================================================
// RE-EXPORTS: System (from system module)
// =============================================================================

pub use system::{
    CountdownReport, CountdownState, Motivation, Stage, StageProgress, StageWindow,
    compute_countdown, compute_stage_window, format_display_date, format_storage_date, parse_date,
    parse_date_in, should_remind,
};
