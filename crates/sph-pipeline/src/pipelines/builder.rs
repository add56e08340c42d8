//! Pipeline assembly
//!
//! [`PipelineBuilder`] is the write-only object a pipeline constructor fills
//! in. Declarations must happen in a fixed order: resources and the global
//! export table first, then the Setup, Simulation and Post stages (each ended
//! before the next one is opened), then exactly one combination pass. Every
//! method validates its input immediately and returns an error instead of
//! recording a partial declaration.

use super::{
    BufferHandle, COMBINATION_PASS_NAME, CombinationPass, CompositePass, CompositeTarget, ComputePass, GlobalExport, Pass, Pipeline, ProgramLocation, ResourceRegistry, StageId,
    TextureFormat, TextureHandle, TextureSpec,
};
use crate::error::{PipelineError, Result};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
enum StageStatus {
    #[default]
    Pending,
    Open,
    Ended,
}

#[derive(Debug, Default)]
struct StageState {
    status: StageStatus,
    passes: Vec<Pass>,
}

/// Collects the declarations of one pipeline
#[derive(Debug, Default)]
pub struct PipelineBuilder {
    resources: ResourceRegistry,
    exports: Option<GlobalExport>,
    stages: [StageState; 3],
    combination: Option<CombinationPass>,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a buffer of `size` bytes
    ///
    /// # Errors
    /// * `OrderingViolation` once any stage has been opened
    /// * `DuplicateName` / `InvalidDimension` from the registry
    pub fn create_buffer(&mut self, name: &str, size: u64, clear_each_frame: bool) -> Result<BufferHandle> {
        self.ensure_declaring(name)?;
        self.resources.declare_buffer(name, size, clear_each_frame)
    }

    /// Starts declaring a texture; the declaration happens in [`TextureBuilder::build`]
    pub fn create_texture(&mut self, name: &str) -> TextureBuilder<'_> {
        TextureBuilder {
            pipeline: self,
            name: name.to_string(),
            format: TextureFormat::default(),
            width: None,
            height: None,
            mipmap: false,
            clear: true,
        }
    }

    /// Registers the global export table
    ///
    /// Must be called exactly once, before any stage is opened.
    pub fn set_global_export(&mut self, exports: GlobalExport) -> Result<()> {
        self.ensure_declaring("global export")?;
        if self.exports.is_some() {
            return Err(PipelineError::OrderingViolation("the global export table is already set".to_string()));
        }

        tracing::debug!(count = exports.len(), "set global export table");
        self.exports = Some(exports);
        Ok(())
    }

    /// Opens (or re-acquires) a stage for population
    ///
    /// # Errors
    /// `OrderingViolation` if the global export table is not set yet, if an
    /// earlier stage is still open, or if a later stage (or the combination
    /// pass) was already declared while this stage was never ended.
    pub fn for_stage(&mut self, stage: StageId) -> Result<StageBuilder<'_>> {
        let Some(exports) = self.exports.clone() else {
            return Err(PipelineError::OrderingViolation(format!("the global export table must be set before stage {stage} is populated")));
        };

        if let Some(open) = StageId::ALL[..stage.index()].iter().find(|earlier| self.stages[earlier.index()].status == StageStatus::Open) {
            return Err(PipelineError::OrderingViolation(format!("stage {open} must be ended before stage {stage} is opened")));
        }

        if self.stages[stage.index()].status != StageStatus::Ended {
            if let Some(later) = StageId::ALL[stage.index() + 1..].iter().find(|later| self.stages[later.index()].status != StageStatus::Pending) {
                return Err(PipelineError::OrderingViolation(format!("stage {stage} cannot be opened after stage {later}")));
            }
            if self.combination.is_some() {
                return Err(PipelineError::OrderingViolation(format!("stage {stage} cannot be opened after the combination pass")));
            }
            self.stages[stage.index()].status = StageStatus::Open;
        }

        Ok(StageBuilder { pipeline: self, stage, exports })
    }

    /// Starts declaring the combination pass
    ///
    /// # Errors
    /// * `OrderingViolation` if the global export table is not set
    /// * `StageNotClosed` if a stage is still open
    /// * `AlreadyCompiled` if the combination pass already exists
    pub fn create_combination_pass(&mut self, path: &str) -> Result<CombinationPassBuilder<'_>> {
        let Some(exports) = self.exports.clone() else {
            return Err(PipelineError::OrderingViolation("the global export table must be set before the combination pass".to_string()));
        };
        if let Some(open) = StageId::ALL.iter().find(|stage| self.stages[stage.index()].status == StageStatus::Open) {
            return Err(PipelineError::StageNotClosed(*open));
        }
        if self.combination.is_some() {
            return Err(PipelineError::AlreadyCompiled {
                pass: COMBINATION_PASS_NAME.to_string(),
            });
        }
        self.ensure_unique_pass(COMBINATION_PASS_NAME)?;

        Ok(CombinationPassBuilder {
            pipeline: self,
            path: path.to_string(),
            entry_point: None,
            exports,
        })
    }

    /// Read access to the resources declared so far
    pub fn resources(&self) -> &ResourceRegistry {
        &self.resources
    }

    /// Finalizes the declarations into an immutable [`Pipeline`]
    ///
    /// # Errors
    /// * `StageNotClosed` if a stage was opened but not ended
    /// * `MissingCombinationPass` if no combination pass was compiled
    pub fn finish(self) -> Result<Pipeline> {
        if let Some(open) = StageId::ALL.iter().find(|stage| self.stages[stage.index()].status == StageStatus::Open) {
            return Err(PipelineError::StageNotClosed(*open));
        }
        let Some(combination) = self.combination else {
            return Err(PipelineError::MissingCombinationPass);
        };

        let exports = self.exports.unwrap_or_default();
        let (buffers, textures) = self.resources.into_parts();
        let stages = self.stages.map(|state| state.passes);

        let pipeline = Pipeline::new(buffers, textures, exports, stages, combination);
        tracing::info!(
            buffers = pipeline.buffers().len(),
            textures = pipeline.textures().len(),
            passes = pipeline.passes().count(),
            bytes = pipeline.memory_footprint(),
            "assembled pipeline"
        );
        Ok(pipeline)
    }

    fn ensure_declaring(&self, what: &str) -> Result<()> {
        let started = self.stages.iter().any(|state| state.status != StageStatus::Pending) || self.combination.is_some();
        if started {
            return Err(PipelineError::OrderingViolation(format!("'{what}' must be declared before any stage is populated")));
        }
        Ok(())
    }

    fn ensure_unique_pass(&self, name: &str) -> Result<()> {
        let taken = self.stages.iter().flat_map(|state| state.passes.iter()).any(|pass| pass.name() == name) || (self.combination.is_some() && name == COMBINATION_PASS_NAME);
        if taken {
            return Err(PipelineError::DuplicateName {
                kind: "pass",
                name: name.to_string(),
            });
        }
        Ok(())
    }

    fn push_pass(&mut self, stage: StageId, pass: Pass) {
        tracing::debug!(%stage, pass = pass.name(), path = %pass.location().path, entry_point = %pass.location().entry_point, "compiled pass");
        self.stages[stage.index()].passes.push(pass);
    }
}

/// Fluent declaration of a texture
#[derive(Debug)]
pub struct TextureBuilder<'a> {
    pipeline: &'a mut PipelineBuilder,
    name: String,
    format: TextureFormat,
    width: Option<u32>,
    height: Option<u32>,
    mipmap: bool,
    clear: bool,
}

impl TextureBuilder<'_> {
    pub fn format(mut self, format: TextureFormat) -> Self {
        self.format = format;
        self
    }

    pub fn width(mut self, width: u32) -> Self {
        self.width = Some(width);
        self
    }

    pub fn height(mut self, height: u32) -> Self {
        self.height = Some(height);
        self
    }

    pub fn mipmap(mut self, mipmap: bool) -> Self {
        self.mipmap = mipmap;
        self
    }

    /// Whether the texture is cleared every frame (default: true)
    pub fn clear(mut self, clear: bool) -> Self {
        self.clear = clear;
        self
    }

    /// Declares the texture
    ///
    /// # Errors
    /// * `InvalidDimension` if width or height is missing or zero
    /// * `OrderingViolation` once any stage has been opened
    /// * `DuplicateName` if the name is taken
    pub fn build(self) -> Result<TextureHandle> {
        let TextureBuilder {
            pipeline,
            name,
            format,
            width,
            height,
            mipmap,
            clear,
        } = self;
        let (Some(width), Some(height)) = (width, height) else {
            return Err(PipelineError::InvalidDimension {
                name,
                reason: "texture width and height must both be set".to_string(),
            });
        };

        pipeline.ensure_declaring(&name)?;
        pipeline.resources.declare_texture(TextureSpec {
            name,
            format,
            width,
            height,
            mipmap,
            clear_each_frame: clear,
        })
    }
}

/// Appends passes to one stage
#[derive(Debug)]
pub struct StageBuilder<'a> {
    pipeline: &'a mut PipelineBuilder,
    stage: StageId,
    exports: GlobalExport,
}

impl StageBuilder<'_> {
    pub fn stage(&self) -> StageId {
        self.stage
    }

    /// Starts a compute pass named `name`
    ///
    /// # Errors
    /// * `StageClosed` if the stage has been ended
    /// * `DuplicateName` if any pass of the pipeline already uses `name`
    pub fn create_compute(&mut self, name: &str) -> Result<ComputePassBuilder<'_>> {
        self.ensure_accepting(name)?;
        Ok(ComputePassBuilder {
            pipeline: &mut *self.pipeline,
            stage: self.stage,
            exports: self.exports.clone(),
            name: name.to_string(),
            location: None,
            work_groups: None,
        })
    }

    /// Starts a composite pass named `name`
    ///
    /// # Errors
    /// * `StageClosed` if the stage has been ended
    /// * `DuplicateName` if any pass of the pipeline already uses `name`
    pub fn create_composite(&mut self, name: &str) -> Result<CompositePassBuilder<'_>> {
        self.ensure_accepting(name)?;
        Ok(CompositePassBuilder {
            pipeline: &mut *self.pipeline,
            stage: self.stage,
            exports: self.exports.clone(),
            name: name.to_string(),
            location: None,
            targets: Vec::new(),
        })
    }

    /// Seals the stage; no pass can be added to it afterwards
    pub fn end(self) {
        let StageBuilder { pipeline, stage, .. } = self;
        let state = &mut pipeline.stages[stage.index()];
        if state.status != StageStatus::Ended {
            tracing::debug!(%stage, passes = state.passes.len(), "ended stage");
        }
        state.status = StageStatus::Ended;
    }

    fn ensure_accepting(&self, name: &str) -> Result<()> {
        if self.pipeline.stages[self.stage.index()].status == StageStatus::Ended {
            return Err(PipelineError::StageClosed {
                stage: self.stage,
                pass: name.to_string(),
            });
        }
        self.pipeline.ensure_unique_pass(name)
    }
}

/// Fluent declaration of a compute pass
#[derive(Debug)]
pub struct ComputePassBuilder<'a> {
    pipeline: &'a mut PipelineBuilder,
    stage: StageId,
    exports: GlobalExport,
    name: String,
    location: Option<ProgramLocation>,
    work_groups: Option<[u32; 3]>,
}

impl ComputePassBuilder<'_> {
    /// Binds the program path and entry point
    pub fn location(mut self, path: &str, entry_point: &str) -> Self {
        self.location = Some(ProgramLocation {
            path: path.to_string(),
            entry_point: entry_point.to_string(),
        });
        self
    }

    /// Sets the dispatch size in work groups
    ///
    /// # Errors
    /// `InvalidDimension` if any count is zero
    pub fn work_groups(mut self, x: u32, y: u32, z: u32) -> Result<Self> {
        if x == 0 || y == 0 || z == 0 {
            return Err(PipelineError::InvalidDimension {
                name: self.name,
                reason: format!("work group counts must be at least 1, got ({x}, {y}, {z})"),
            });
        }
        self.work_groups = Some([x, y, z]);
        Ok(self)
    }

    /// Registers the pass at the end of its stage
    ///
    /// # Errors
    /// * `MissingLocation` if [`Self::location`] was not called
    /// * `MissingWorkGroups` if [`Self::work_groups`] was not called
    pub fn compile(self) -> Result<()> {
        let ComputePassBuilder {
            pipeline,
            stage,
            exports,
            name,
            location,
            work_groups,
        } = self;
        let Some(location) = location else {
            return Err(PipelineError::MissingLocation { pass: name });
        };
        let Some(work_groups) = work_groups else {
            return Err(PipelineError::MissingWorkGroups { pass: name });
        };

        pipeline.push_pass(stage, Pass::Compute(ComputePass { name, location, work_groups, exports }));
        Ok(())
    }
}

/// Fluent declaration of a composite pass
#[derive(Debug)]
pub struct CompositePassBuilder<'a> {
    pipeline: &'a mut PipelineBuilder,
    stage: StageId,
    exports: GlobalExport,
    name: String,
    location: Option<ProgramLocation>,
    targets: Vec<CompositeTarget>,
}

impl CompositePassBuilder<'_> {
    /// Binds the program path and fragment entry point
    pub fn location(mut self, path: &str, entry_point: &str) -> Self {
        self.location = Some(ProgramLocation {
            path: path.to_string(),
            entry_point: entry_point.to_string(),
        });
        self
    }

    /// Binds output attachment `slot` to a declared texture
    ///
    /// # Errors
    /// * `UnknownResource` if the texture is not declared in this pipeline
    /// * `DuplicateTarget` if `slot` is already bound
    pub fn target(mut self, slot: u32, texture: &TextureHandle) -> Result<Self> {
        if self.pipeline.resources.texture(texture.name()).is_none() {
            return Err(PipelineError::UnknownResource {
                pass: self.name,
                kind: "texture",
                name: texture.name().to_string(),
            });
        }
        if self.targets.iter().any(|target| target.slot == slot) {
            return Err(PipelineError::DuplicateTarget { pass: self.name, slot });
        }

        self.targets.push(CompositeTarget {
            slot,
            texture: texture.name().to_string(),
        });
        Ok(self)
    }

    /// Registers the pass at the end of its stage
    ///
    /// # Errors
    /// * `MissingLocation` if [`Self::location`] was not called
    /// * `MissingTargets` if no target was bound
    pub fn compile(self) -> Result<()> {
        let CompositePassBuilder {
            pipeline,
            stage,
            exports,
            name,
            location,
            mut targets,
        } = self;
        let Some(location) = location else {
            return Err(PipelineError::MissingLocation { pass: name });
        };
        if targets.is_empty() {
            return Err(PipelineError::MissingTargets { pass: name });
        }

        targets.sort_by_key(|target| target.slot);
        pipeline.push_pass(stage, Pass::Composite(CompositePass { name, location, targets, exports }));
        Ok(())
    }
}

/// Fluent declaration of the combination pass
#[derive(Debug)]
pub struct CombinationPassBuilder<'a> {
    pipeline: &'a mut PipelineBuilder,
    path: String,
    entry_point: Option<String>,
    exports: GlobalExport,
}

impl CombinationPassBuilder<'_> {
    /// Selects a fragment entry point other than the program's only one
    pub fn entry_point(mut self, entry_point: &str) -> Self {
        self.entry_point = Some(entry_point.to_string());
        self
    }

    /// Registers the combination pass
    pub fn compile(self) -> Result<()> {
        let CombinationPassBuilder {
            pipeline,
            path,
            entry_point,
            exports,
        } = self;
        tracing::debug!(%path, "compiled combination pass");
        pipeline.combination = Some(CombinationPass { path, entry_point, exports });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipelines::ExportList;

    fn exports() -> GlobalExport {
        let mut list = ExportList::new();
        list.add_int("PARTICLE_COUNT", 64).unwrap().add_int("PARTICLE_GROUP_SIZE", 8).unwrap();
        list.build()
    }

    /// Builder with one texture, one buffer and the export table already set
    fn declared() -> (PipelineBuilder, TextureHandle) {
        let mut builder = PipelineBuilder::new();
        let texture = builder.create_texture("mainTexture").width(16).height(16).build().unwrap();
        builder.create_buffer("particles", 84 * 64, false).unwrap();
        builder.set_global_export(exports()).unwrap();
        (builder, texture)
    }

    fn compute(stage: &mut StageBuilder<'_>, name: &str) {
        stage.create_compute(name).unwrap().location("programs/test.wgsl", "main").work_groups(8, 1, 1).unwrap().compile().unwrap();
    }

    fn combine(builder: &mut PipelineBuilder) {
        builder.create_combination_pass("programs/post/combination.wgsl").unwrap().compile().unwrap();
    }

    #[test]
    fn test_passes_keep_declaration_order() {
        let (mut builder, _) = declared();
        let mut stage = builder.for_stage(StageId::Simulation).unwrap();
        for name in ["a", "b", "c"] {
            compute(&mut stage, name);
        }
        stage.end();
        combine(&mut builder);

        let pipeline = builder.finish().unwrap();
        let names: Vec<_> = pipeline.stage(StageId::Simulation).iter().map(Pass::name).collect();
        assert_eq!(names, ["a", "b", "c"]);
        assert!(pipeline.stage(StageId::Setup).is_empty());
    }

    #[test]
    fn test_end_is_terminal() {
        let (mut builder, texture) = declared();
        let mut stage = builder.for_stage(StageId::Setup).unwrap();
        compute(&mut stage, "initialize");
        stage.end();

        let mut stage = builder.for_stage(StageId::Setup).unwrap();
        assert!(matches!(stage.create_compute("late"), Err(PipelineError::StageClosed { stage: StageId::Setup, .. })));
        assert!(matches!(stage.create_composite("late"), Err(PipelineError::StageClosed { stage: StageId::Setup, .. })));
        drop(stage);

        let mut post = builder.for_stage(StageId::Post).unwrap();
        post.create_composite("copy").unwrap().location("programs/copy.wgsl", "copy").target(0, &texture).unwrap().compile().unwrap();
        post.end();
        combine(&mut builder);

        let pipeline = builder.finish().unwrap();
        assert_eq!(pipeline.stage(StageId::Setup).len(), 1);
    }

    #[test]
    fn test_compile_without_location_registers_nothing() {
        let (mut builder, _) = declared();
        let mut stage = builder.for_stage(StageId::Simulation).unwrap();
        let err = stage.create_compute("calculate-density-1").unwrap().work_groups(8, 1, 1).unwrap().compile().unwrap_err();
        assert_eq!(
            err,
            PipelineError::MissingLocation {
                pass: "calculate-density-1".to_string()
            }
        );

        // The name stays free because nothing was registered
        compute(&mut stage, "calculate-density-1");
        stage.end();
        combine(&mut builder);
        assert_eq!(builder.finish().unwrap().stage(StageId::Simulation).len(), 1);
    }

    #[test]
    fn test_compute_requires_positive_work_groups() {
        let (mut builder, _) = declared();
        let mut stage = builder.for_stage(StageId::Simulation).unwrap();
        let err = stage.create_compute("zero").unwrap().location("programs/test.wgsl", "main").work_groups(8, 0, 1).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidDimension { .. }));

        let err = stage.create_compute("unsized").unwrap().location("programs/test.wgsl", "main").compile().unwrap_err();
        assert!(matches!(err, PipelineError::MissingWorkGroups { .. }));
    }

    #[test]
    fn test_pass_names_are_unique_across_stages() {
        let (mut builder, _) = declared();
        let mut setup = builder.for_stage(StageId::Setup).unwrap();
        compute(&mut setup, "density");
        setup.end();

        let mut simulation = builder.for_stage(StageId::Simulation).unwrap();
        assert!(matches!(simulation.create_compute("density"), Err(PipelineError::DuplicateName { kind: "pass", .. })));
    }

    #[test]
    fn test_composite_targets() {
        let (mut builder, texture) = declared();
        let foreign = PipelineBuilder::new().create_texture("elsewhere").width(4).height(4).build().unwrap();

        let mut post = builder.for_stage(StageId::Post).unwrap();
        let err = post.create_composite("copy").unwrap().location("programs/copy.wgsl", "copy").target(0, &foreign).unwrap_err();
        assert_eq!(
            err,
            PipelineError::UnknownResource {
                pass: "copy".to_string(),
                kind: "texture",
                name: "elsewhere".to_string()
            }
        );

        let err = post.create_composite("copy").unwrap().target(0, &texture).unwrap().target(0, &texture).unwrap_err();
        assert!(matches!(err, PipelineError::DuplicateTarget { slot: 0, .. }));

        let err = post.create_composite("copy").unwrap().location("programs/copy.wgsl", "copy").compile().unwrap_err();
        assert!(matches!(err, PipelineError::MissingTargets { .. }));

        let err = post.create_composite("copy").unwrap().target(0, &texture).unwrap().compile().unwrap_err();
        assert!(matches!(err, PipelineError::MissingLocation { .. }));
    }

    #[test]
    fn test_stages_require_exports_first() {
        let mut builder = PipelineBuilder::new();
        builder.create_buffer("particles", 84, false).unwrap();
        assert!(matches!(builder.for_stage(StageId::Setup), Err(PipelineError::OrderingViolation(_))));
        assert!(matches!(builder.create_combination_pass("programs/post/combination.wgsl"), Err(PipelineError::OrderingViolation(_))));
    }

    #[test]
    fn test_resources_cannot_follow_stages() {
        let (mut builder, _) = declared();
        builder.for_stage(StageId::Setup).unwrap().end();

        assert!(matches!(builder.create_buffer("late", 4, false), Err(PipelineError::OrderingViolation(_))));
        assert!(matches!(builder.create_texture("late").width(4).height(4).build(), Err(PipelineError::OrderingViolation(_))));
        assert!(matches!(builder.set_global_export(exports()), Err(PipelineError::OrderingViolation(_))));
    }

    #[test]
    fn test_global_export_is_set_once() {
        let mut builder = PipelineBuilder::new();
        builder.set_global_export(exports()).unwrap();
        assert!(matches!(builder.set_global_export(exports()), Err(PipelineError::OrderingViolation(_))));
    }

    #[test]
    fn test_stage_order_is_enforced() {
        let (mut builder, _) = declared();
        let setup = builder.for_stage(StageId::Setup).unwrap();
        drop(setup);

        // Setup is open but was never ended
        assert!(matches!(builder.for_stage(StageId::Simulation), Err(PipelineError::OrderingViolation(_))));
        builder.for_stage(StageId::Setup).unwrap().end();

        builder.for_stage(StageId::Post).unwrap().end();
        // Simulation was skipped and can no longer be opened
        assert!(matches!(builder.for_stage(StageId::Simulation), Err(PipelineError::OrderingViolation(_))));
    }

    #[test]
    fn test_finish_requires_closed_stages() {
        let (mut builder, _) = declared();
        let mut stage = builder.for_stage(StageId::Simulation).unwrap();
        compute(&mut stage, "a");
        drop(stage);

        assert_eq!(builder.create_combination_pass("programs/post/combination.wgsl").unwrap_err(), PipelineError::StageNotClosed(StageId::Simulation));
        assert_eq!(builder.finish().unwrap_err(), PipelineError::StageNotClosed(StageId::Simulation));
    }

    #[test]
    fn test_exactly_one_combination_pass() {
        let (mut builder, _) = declared();
        combine(&mut builder);

        let err = builder.create_combination_pass("programs/post/other.wgsl").unwrap_err();
        assert_eq!(
            err,
            PipelineError::AlreadyCompiled {
                pass: COMBINATION_PASS_NAME.to_string()
            }
        );
        assert!(matches!(builder.for_stage(StageId::Post), Err(PipelineError::OrderingViolation(_))));

        let pipeline = builder.finish().unwrap();
        assert_eq!(pipeline.combination().path, "programs/post/combination.wgsl");
    }

    #[test]
    fn test_finish_requires_combination_pass() {
        let (builder, _) = declared();
        assert_eq!(builder.finish().unwrap_err(), PipelineError::MissingCombinationPass);
    }

    #[test]
    fn test_passes_bind_export_snapshot() {
        let mut list = ExportList::new();
        list.add_int("PARTICLE_COUNT", 64).unwrap();
        let exports = list.build();

        let mut builder = PipelineBuilder::new();
        builder.set_global_export(exports).unwrap();
        let mut stage = builder.for_stage(StageId::Simulation).unwrap();
        compute(&mut stage, "a");
        stage.end();

        // The list is frozen; later additions never reach compiled passes
        assert!(list.add_int("RENDER_WIDTH", 256).is_err());
        combine(&mut builder);

        let pipeline = builder.finish().unwrap();
        for pass in pipeline.passes() {
            assert_eq!(pass.exports().get("PARTICLE_COUNT"), Some(64));
            assert_eq!(pass.exports().get("RENDER_WIDTH"), None);
        }
        assert_eq!(pipeline.combination().exports.get("PARTICLE_COUNT"), Some(64));
    }

    #[test]
    fn test_texture_builder_defaults() {
        let mut builder = PipelineBuilder::new();
        let err = builder.create_texture("unsized").width(16).build().unwrap_err();
        assert!(matches!(err, PipelineError::InvalidDimension { .. }));

        builder.create_texture("mainTexture").width(16).height(8).build().unwrap();
        let texture = builder.resources().texture("mainTexture").unwrap();
        assert_eq!(texture.format, TextureFormat::Rgba16F);
        assert!(!texture.mipmap);
        assert!(texture.clear_each_frame);
    }
}
