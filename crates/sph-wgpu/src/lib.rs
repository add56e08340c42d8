//! SPH-wgpu: runs SPH pipelines on wgpu
//!
//! This crate binds pipelines described with `sph-pipeline` to a wgpu device
//! and records their passes. It also ships the WGSL programs the SPH pipeline
//! refers to.

mod error;
mod pipeline_executor;

pub mod particle;
pub mod programs;

pub use error::ExecutorError;
pub use particle::ParticleRecord;
pub use pipeline_executor::{PipelineExecutor, aligned_buffer_size, check_limits, texture_format};
