//! # System Module
//!
//! The accompanied-driving stage calculator.
//!
//! The calculator is pure and deterministic: it never reads the clock, so the
//! caller passes "today" explicitly. Presentation side effects (collapsing a
//! finished stage's panel and so on) are layered on top of its results by the
//! host.

mod stage;

pub use stage::*;
