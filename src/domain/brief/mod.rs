//! The project brief assembled from conversation memory.

mod brief;

pub use brief::{BriefDraft, BriefField, BriefStatus};
