//! Proactive guidance.
//!
//! Watches the conversation for stagnation, confusion, hesitation, low
//! engagement and completion readiness, and surfaces unsolicited hints.

mod action;
mod engine;

pub use action::{GuidanceAction, GuidanceKind, GuidancePriority, GuidanceTiming, GuidanceTrigger};
pub use engine::{GuidanceConfig, ProactiveGuidance};
