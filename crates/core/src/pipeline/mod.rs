pub mod config;
pub mod frame_stage;
pub mod process_use_case;
pub mod report;
pub mod sampler;
pub mod workspace;
