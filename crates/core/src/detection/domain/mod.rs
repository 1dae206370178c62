pub mod alignment;
pub mod face;
pub mod frame_analyzer;
pub mod observation;
pub mod suppression;
