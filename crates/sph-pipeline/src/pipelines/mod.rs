//! Pipeline model
//!
//! A pipeline is declared through a [`PipelineBuilder`]: buffers and textures,
//! a table of global integer exports, then three ordered stages of GPU passes
//! and a terminal combination pass. The result is an immutable [`Pipeline`]
//! which can be compiled into an [`ExecutablePipeline`] once its programs are
//! loaded.

mod builder;
mod executable;
mod exports;
mod pipeline;
mod resources;
mod stages;

pub use builder::*;
pub use executable::*;
pub use exports::{ExportList, GlobalExport};
pub use pipeline::Pipeline;
pub use resources::*;
pub use stages::*;
