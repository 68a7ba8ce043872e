//! File I/O, validation, and serialization for the arbor pipeline.

mod domain;
mod error;
mod reader;
mod writer;

pub use domain::{ExperimentName, LabeledPatterns, QueryPatterns};
pub use error::IoError;
pub use reader::PatternReader;
pub use writer::ResultWriter;
