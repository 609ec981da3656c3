//! stagemerge - hand-merge a list of workflow stages
//!
//! Descriptions and sub-steps are dragged between stages, an optional new
//! stage is assembled from pieces of the others, and the result is
//! committed or discarded as a whole.

pub mod app;
pub mod config;
pub mod logging;
pub mod merge;
pub mod replay;
pub mod stage_file;
pub mod types;
pub mod ui;
