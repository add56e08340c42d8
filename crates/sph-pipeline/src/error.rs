//! Configuration-time error types
//!
//! Every failure here happens while a pipeline is being declared. Nothing in
//! this module is raised during per-frame execution: a pipeline that fails to
//! assemble is never handed to the host.

use crate::pipelines::StageId;

/// Errors raised while declaring resources, exports, stages and passes
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PipelineError {
    /// A buffer, texture, export or pass name is already in use
    #[error("{kind} '{name}' is already declared")]
    DuplicateName { kind: &'static str, name: String },

    /// A size, dimension or dispatch count is zero or out of range
    #[error("invalid dimension for '{name}': {reason}")]
    InvalidDimension { name: String, reason: String },

    /// A pass was compiled without a program location
    #[error("pass '{pass}' has no program location")]
    MissingLocation { pass: String },

    /// A pass that may only exist once was compiled a second time
    #[error("pass '{pass}' has already been compiled")]
    AlreadyCompiled { pass: String },

    /// A pass was added to a stage after the stage was ended
    #[error("stage {stage} has been ended and cannot accept pass '{pass}'")]
    StageClosed { stage: StageId, pass: String },

    /// A pass referenced a resource that was never declared
    #[error("pass '{pass}' references undeclared {kind} '{name}'")]
    UnknownResource { pass: String, kind: &'static str, name: String },

    /// An export list was extended after it was built
    #[error("export list is finalized, cannot add '{name}'")]
    Finalized { name: String },

    /// A step was performed out of the required declaration order
    #[error("ordering violation: {0}")]
    OrderingViolation(String),

    /// A compute pass was compiled without a dispatch size
    #[error("compute pass '{pass}' has no work group counts")]
    MissingWorkGroups { pass: String },

    /// A composite pass was compiled without any output attachment
    #[error("composite pass '{pass}' has no output targets")]
    MissingTargets { pass: String },

    /// Two textures were bound to the same attachment slot of a composite pass
    #[error("composite pass '{pass}' binds slot {slot} twice")]
    DuplicateTarget { pass: String, slot: u32 },

    /// The pipeline was finished without its combination pass
    #[error("pipeline has no combination pass")]
    MissingCombinationPass,

    /// A stage was opened but never ended
    #[error("stage {0} was opened but never ended")]
    StageNotClosed(StageId),
}

/// Errors raised while loading and preparing the programs a pipeline references
#[derive(Debug, thiserror::Error)]
pub enum ProgramError {
    /// The program file could not be loaded
    #[error("failed to load program '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The program (with its export prelude) is not valid WGSL
    #[error("failed to parse program '{path}':\n{message}")]
    Parse { path: String, message: String },

    /// The program parsed but failed naga validation
    #[error("program '{path}' failed validation: {message}")]
    Validation { path: String, message: String },

    /// The entry point does not exist or belongs to another shader stage
    #[error("program '{path}' has no {stage} entry point '{entry_point}'")]
    MissingEntryPoint { path: String, entry_point: String, stage: &'static str },

    /// Minification produced a module naga could not write back out
    #[error("failed to minify program '{path}': {message}")]
    Minify { path: String, message: String },
}

/// Errors raised while loading a simulation configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse configuration: {0}")]
    Yaml(#[from] serde_norway::Error),

    #[error(transparent)]
    Invalid(#[from] PipelineError),
}

pub type Result<T, E = PipelineError> = std::result::Result<T, E>;
