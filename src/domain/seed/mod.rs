//! Cross-study checks over a whole batch of studies
//!
//! The engine runs the structural checks for every study, then groups the
//! batch by feature and looks for overlapping pairs in each group.

mod engine;
mod overlap;

pub use engine::{Diagnostic, ValidationEngine, ValidationReport};
pub use overlap::{
    find_overlaps, overlaps, plain_sets_intersect, scalars_intersect, studies_overlap,
    target_sets_intersect, OverlapError,
};
