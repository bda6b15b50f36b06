//! Study priority classification
//!
//! Classifies how much of the stable population a study reaches so that
//! reviewers can focus on wide or emergency rollouts. Classification is a pure
//! function of the study, the processing options and the blocklists.

mod blocklist;
mod classifier;
mod processed;

pub use blocklist::{Blocklist, BlocklistError, Blocklists};
pub use classifier::{
    classify, Classification, PriorityDetails, ProcessingOptions, StudyChannelTarget,
    StudyPriority,
};
pub use processed::{group_by_name, ProcessedStudy, StudyReportFilter};
