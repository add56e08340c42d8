//! ExecutablePipeline compilation
//!
//! Turns an assembled [`Pipeline`] into a self-contained form with every
//! program loaded, bound to its pass's export snapshot and validated. A host
//! runtime needs nothing else to build GPU objects from the result.

use super::{BufferSpec, Pass, Pipeline, StageId, TextureSpec};
use crate::{
    error::ProgramError,
    program::{PreparedProgram, ProgramStage, prepare_program},
};
use serde::Serialize;
use std::collections::HashMap;

/// A pipeline whose programs are resolved and ready for a GPU runtime
#[derive(Debug, Clone, Serialize)]
pub struct ExecutablePipeline {
    /// Buffers in declaration order
    pub buffers: Vec<BufferSpec>,
    /// Textures in declaration order
    pub textures: Vec<TextureSpec>,
    /// Passes of Setup, Simulation and Post, indexed by [`StageId::index`]
    pub stages: [Vec<ExecutablePass>; 3],
    /// The terminal pass
    pub combination: ExecutableCombinationPass,
}

/// A stage pass with its prepared program
#[derive(Debug, Clone, Serialize)]
pub struct ExecutablePass {
    pub pass: Pass,
    /// WGSL source with the export prelude applied
    pub shader: String,
    /// Work group size declared by a compute entry point
    pub workgroup_size: Option<[u32; 3]>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExecutableCombinationPass {
    pub entry_point: Option<String>,
    /// WGSL source with the export prelude applied
    pub shader: String,
}

impl ExecutablePipeline {
    pub fn stage(&self, stage: StageId) -> &[ExecutablePass] {
        &self.stages[stage.index()]
    }

    /// Number of stage passes across all stages
    pub fn pass_count(&self) -> usize {
        self.stages.iter().map(Vec::len).sum()
    }
}

impl Pipeline {
    /// Loads and prepares every program of the pipeline
    ///
    /// Each distinct path is loaded once, then prepared separately for every
    /// pass that uses it since passes may carry different exports or entry points.
    ///
    /// # Arguments
    /// * `load_program_file` - Function returning the source of a program path
    /// * `minify` - Whether to minify the prepared programs
    ///
    /// # Returns
    /// An ExecutablePipeline, or the first program that failed to load or validate
    pub fn compile_programs(&self, load_program_file: impl Fn(&str) -> Result<String, std::io::Error>, minify: bool) -> Result<ExecutablePipeline, ProgramError> {
        ProgramCompiler::new(load_program_file, minify).compile(self)
    }
}

/// Caches raw program sources while a pipeline is compiled
struct ProgramCompiler<F> {
    load_program_file: F,
    minify: bool,
    sources: HashMap<String, String>,
}

impl<F: Fn(&str) -> Result<String, std::io::Error>> ProgramCompiler<F> {
    fn new(load_program_file: F, minify: bool) -> Self {
        Self {
            load_program_file,
            minify,
            sources: HashMap::new(),
        }
    }

    fn compile(mut self, pipeline: &Pipeline) -> Result<ExecutablePipeline, ProgramError> {
        let mut stages: [Vec<ExecutablePass>; 3] = Default::default();
        for stage in StageId::ALL {
            for pass in pipeline.stage(stage) {
                let location = pass.location();
                let program = self.prepare(&location.path, Some(&location.entry_point), pass.exports(), pass.program_stage())?;
                tracing::debug!(%stage, pass = pass.name(), bytes = program.source.len(), workgroup_size = ?program.workgroup_size, "prepared program");
                stages[stage.index()].push(ExecutablePass {
                    pass: pass.clone(),
                    shader: program.source,
                    workgroup_size: program.workgroup_size,
                });
            }
        }

        let combination = pipeline.combination();
        let shader = self.prepare(&combination.path, combination.entry_point.as_deref(), &combination.exports, ProgramStage::Fragment)?.source;

        tracing::info!(programs = self.sources.len(), "compiled pipeline programs");

        Ok(ExecutablePipeline {
            buffers: pipeline.buffers().to_vec(),
            textures: pipeline.textures().to_vec(),
            stages,
            combination: ExecutableCombinationPass {
                entry_point: combination.entry_point.clone(),
                shader,
            },
        })
    }

    fn prepare(&mut self, path: &str, entry_point: Option<&str>, exports: &super::GlobalExport, stage: ProgramStage) -> Result<PreparedProgram, ProgramError> {
        if !self.sources.contains_key(path) {
            let source = (self.load_program_file)(path).map_err(|source| ProgramError::Io { path: path.to_string(), source })?;
            self.sources.insert(path.to_string(), source);
        }
        let source = &self.sources[path];
        prepare_program(path, source, entry_point, exports, stage, self.minify)
    }
}
