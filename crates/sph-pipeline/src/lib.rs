//! SPH pipeline model
//!
//! This crate describes a multi-pass GPU pipeline that simulates a smoothed
//! particle hydrodynamics fluid and renders it into a texture. It owns the
//! declaration side only: resources, global exports, ordered stages of passes
//! and the combination pass. Executing the result on a GPU is the job of a
//! host runtime such as `sph-wgpu`.

pub mod config;
pub mod error;
pub mod pipelines;
pub mod program;
pub mod renderer;
pub mod sph;

pub use config::SimulationConfig;
pub use error::{ConfigError, PipelineError, ProgramError};
pub use renderer::{RendererState, configure_renderer};
