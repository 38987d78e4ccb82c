//! Output module for persisting crawl results
//!
//! This module handles:
//! - Creating, truncating or resuming the CSV output file
//! - Appending whole pages of records
//! - Asking the operator what to do with an existing file

mod prompt;
mod sink;

pub use prompt::{Choice, ConflictResolver, InteractivePrompt, NoPrompt};
pub use sink::{read_resume_point, ConflictPolicy, ResumableSink, SinkError};
