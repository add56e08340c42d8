//! Stage and pass data model
//!
//! A frame is split into three fixed phases. Each phase holds passes in the
//! order they were compiled; nothing reorders them afterwards.

use super::GlobalExport;
use crate::program::ProgramStage;
use serde::Serialize;
use std::fmt;

/// One of the three ordered phases of a pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum StageId {
    /// Runs once when the pipeline is (re)initialized
    Setup,
    /// Runs once per frame, before Post
    Simulation,
    /// Runs once per frame, after Simulation
    Post,
}

impl StageId {
    /// All stages in execution order
    pub const ALL: [StageId; 3] = [StageId::Setup, StageId::Simulation, StageId::Post];

    /// Position of this stage in execution order
    pub fn index(self) -> usize {
        match self {
            StageId::Setup => 0,
            StageId::Simulation => 1,
            StageId::Post => 2,
        }
    }

    /// Returns true if this stage executes every frame
    pub fn is_per_frame(self) -> bool {
        !matches!(self, StageId::Setup)
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StageId::Setup => "Setup",
            StageId::Simulation => "Simulation",
            StageId::Post => "Post",
        };
        f.write_str(name)
    }
}

/// Where a pass finds its program
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ProgramLocation {
    /// Program path as understood by the host's program loader
    pub path: String,
    /// Entry point symbol inside the program
    pub entry_point: String,
}

/// A GPU dispatch over the pipeline's buffers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComputePass {
    pub name: String,
    pub location: ProgramLocation,
    /// Work group counts (x, y, z), each at least 1
    pub work_groups: [u32; 3],
    /// Exports bound when this pass was compiled
    pub exports: GlobalExport,
}

/// Output attachment of a composite pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompositeTarget {
    /// Attachment index (fragment output location)
    pub slot: u32,
    /// Name of the declared texture written at this slot
    pub texture: String,
}

/// A full-screen pass writing one or more declared textures
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompositePass {
    pub name: String,
    pub location: ProgramLocation,
    /// Output targets sorted by slot
    pub targets: Vec<CompositeTarget>,
    /// Exports bound when this pass was compiled
    pub exports: GlobalExport,
}

/// A compiled pass of a stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Pass {
    Compute(ComputePass),
    Composite(CompositePass),
}

impl Pass {
    pub fn name(&self) -> &str {
        match self {
            Pass::Compute(pass) => &pass.name,
            Pass::Composite(pass) => &pass.name,
        }
    }

    pub fn location(&self) -> &ProgramLocation {
        match self {
            Pass::Compute(pass) => &pass.location,
            Pass::Composite(pass) => &pass.location,
        }
    }

    /// The export snapshot this pass was compiled against
    pub fn exports(&self) -> &GlobalExport {
        match self {
            Pass::Compute(pass) => &pass.exports,
            Pass::Composite(pass) => &pass.exports,
        }
    }

    /// The shader stage the pass's entry point must belong to
    pub fn program_stage(&self) -> ProgramStage {
        match self {
            Pass::Compute(_) => ProgramStage::Compute,
            Pass::Composite(_) => ProgramStage::Fragment,
        }
    }
}

/// Name under which the combination pass is registered
pub const COMBINATION_PASS_NAME: &str = "combination";

/// The terminal full-screen pass merging the pipeline's textures into the host frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CombinationPass {
    /// Program path
    pub path: String,
    /// Fragment entry point; `None` selects the program's only fragment entry point
    pub entry_point: Option<String>,
    /// Exports bound when this pass was compiled
    pub exports: GlobalExport,
}
