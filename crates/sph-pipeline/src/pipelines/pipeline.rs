//! Assembled pipeline description
//!
//! The output of [`super::PipelineBuilder::finish`]. It owns every buffer,
//! texture, stage and the export table; passes refer to resources by name.

use super::{BufferSpec, CombinationPass, GlobalExport, Pass, StageId, TextureSpec};
use serde::Serialize;

/// An immutable pipeline ready to be handed to a host runtime
#[derive(Debug, Clone, Serialize)]
pub struct Pipeline {
    buffers: Vec<BufferSpec>,
    textures: Vec<TextureSpec>,
    exports: GlobalExport,
    stages: [Vec<Pass>; 3],
    combination: CombinationPass,
}

impl Pipeline {
    pub(crate) fn new(buffers: Vec<BufferSpec>, textures: Vec<TextureSpec>, exports: GlobalExport, stages: [Vec<Pass>; 3], combination: CombinationPass) -> Self {
        Self {
            buffers,
            textures,
            exports,
            stages,
            combination,
        }
    }

    /// Buffers in declaration order
    pub fn buffers(&self) -> &[BufferSpec] {
        &self.buffers
    }

    /// Textures in declaration order
    pub fn textures(&self) -> &[TextureSpec] {
        &self.textures
    }

    pub fn buffer(&self, name: &str) -> Option<&BufferSpec> {
        self.buffers.iter().find(|buffer| buffer.name == name)
    }

    pub fn texture(&self, name: &str) -> Option<&TextureSpec> {
        self.textures.iter().find(|texture| texture.name == name)
    }

    /// The export table registered with the pipeline
    pub fn exports(&self) -> &GlobalExport {
        &self.exports
    }

    /// Passes of one stage in declaration order
    pub fn stage(&self, stage: StageId) -> &[Pass] {
        &self.stages[stage.index()]
    }

    pub fn combination(&self) -> &CombinationPass {
        &self.combination
    }

    /// Every stage pass in execution order: Setup, Simulation, Post
    pub fn passes(&self) -> impl Iterator<Item = &Pass> {
        self.stages.iter().flatten()
    }

    /// The passes executed each frame: Simulation then Post
    pub fn frame_passes(&self) -> impl Iterator<Item = &Pass> {
        StageId::ALL.into_iter().filter(|stage| stage.is_per_frame()).flat_map(|stage| self.stage(stage).iter())
    }

    pub fn find_pass(&self, name: &str) -> Option<(StageId, &Pass)> {
        StageId::ALL.into_iter().find_map(|stage| self.stage(stage).iter().find(|pass| pass.name() == name).map(|pass| (stage, pass)))
    }

    /// Total bytes reserved by the pipeline's buffers and textures
    pub fn memory_footprint(&self) -> u64 {
        let buffers: u64 = self.buffers.iter().map(|buffer| buffer.size).sum();
        let textures: u64 = self
            .textures
            .iter()
            .map(|texture| {
                (0..texture.mip_level_count())
                    .map(|level| (texture.width >> level).max(1) as u64 * (texture.height >> level).max(1) as u64 * texture.format.bytes_per_texel() as u64)
                    .sum::<u64>()
            })
            .sum();
        buffers + textures
    }
}
