//! Study files on disk

mod json_source;

pub use json_source::JsonStudySource;
