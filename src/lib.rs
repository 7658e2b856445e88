pub mod cluster;
pub mod common;
pub mod confidence;
pub mod detection;
pub mod diffusion;
pub mod input;
pub mod pathscore;
pub mod pipeline;
pub mod refdata;
pub mod report;

/// Result type used throughout the crate
pub type Result<T> = anyhow::Result<T>;
