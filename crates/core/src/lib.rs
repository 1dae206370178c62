//! Face detection, identity clustering, and avatar extraction.
//!
//! One media file goes in; out comes a report with one quality-filtered
//! face group per identity (or one entry per face in single-image mode),
//! each with a rendered avatar. See `pipeline::process_use_case` for the
//! entry point and `detection::infrastructure::model_bundle` for the
//! model wiring.

pub mod avatar;
pub mod detection;
pub mod error;
pub mod grouping;
pub mod media;
pub mod pipeline;
pub mod shared;

pub use error::ProcessError;
pub use pipeline::config::{PartialProcessorConfig, ProcessorConfig};
pub use pipeline::process_use_case::MediaProcessor;
pub use pipeline::report::ProcessReport;
