//! Workflow integration tests

pub mod pipeline;
pub mod process_files;
