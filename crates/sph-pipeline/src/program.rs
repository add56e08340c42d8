//! WGSL program preparation
//!
//! Programs are opaque to the pipeline model except for two things: the
//! global exports are bound into them as compile-time constants, and the
//! entry point a pass names must exist for the right shader stage. This
//! module injects the exports as a `const` prelude, validates the result with
//! `naga`, and optionally minifies it.

use crate::{error::ProgramError, pipelines::GlobalExport};
use std::fmt::Write;

/// Shader stage an entry point must belong to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProgramStage {
    /// Compute passes
    Compute,
    /// Composite and combination passes
    Fragment,
}

impl ProgramStage {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Compute => "compute",
            Self::Fragment => "fragment",
        }
    }

    fn naga_stage(&self) -> naga::ShaderStage {
        match self {
            Self::Compute => naga::ShaderStage::Compute,
            Self::Fragment => naga::ShaderStage::Fragment,
        }
    }
}

/// A program bound to its exports and checked against its pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedProgram {
    /// WGSL source to hand to the GPU driver
    pub source: String,
    /// Work group size of the selected entry point, for compute programs
    pub workgroup_size: Option<[u32; 3]>,
}

/// Renders the exports as WGSL constant declarations
///
/// One `const NAME: i32 = VALUE;` line per export, in insertion order.
pub fn export_prelude(exports: &GlobalExport) -> String {
    let mut prelude = String::new();
    for (name, value) in exports.iter() {
        // Writing into a String cannot fail
        let _ = writeln!(prelude, "const {name}: i32 = {value};");
    }
    prelude
}

/// Binds `exports` into a program and checks it can serve as a pass
///
/// # Arguments
/// * `path` - Program path, used in error messages
/// * `source` - WGSL source as loaded
/// * `entry_point` - Required entry point, or `None` to require exactly one entry point of `stage`
/// * `exports` - Export snapshot of the pass
/// * `stage` - Shader stage the entry point must belong to
/// * `minify` - Whether to minify the prepared source
///
/// # Returns
/// The WGSL source to hand to the GPU driver, with the entry point's work group size
pub fn prepare_program(path: &str, source: &str, entry_point: Option<&str>, exports: &GlobalExport, stage: ProgramStage, minify: bool) -> Result<PreparedProgram, ProgramError> {
    let code = format!("{}{source}", export_prelude(exports));

    let mut module = naga::front::wgsl::parse_str(&code).map_err(|e| ProgramError::Parse {
        path: path.to_string(),
        message: e.emit_to_string(&code),
    })?;

    let mut candidates = module.entry_points.iter().filter(|ep| ep.stage == stage.naga_stage());
    let selected = match entry_point {
        Some(name) => candidates.find(|ep| ep.name == name),
        None => candidates.next().filter(|_| candidates.next().is_none()),
    };
    let Some(selected) = selected else {
        return Err(ProgramError::MissingEntryPoint {
            path: path.to_string(),
            entry_point: entry_point.unwrap_or("<default>").to_string(),
            stage: stage.name(),
        });
    };
    let workgroup_size = (stage == ProgramStage::Compute).then_some(selected.workgroup_size);

    let mut validator = naga::valid::Validator::new(naga::valid::ValidationFlags::all(), naga::valid::Capabilities::all());
    validator.validate(&module).map_err(|e| ProgramError::Validation {
        path: path.to_string(),
        message: e.emit_to_string(&code),
    })?;

    if !minify {
        return Ok(PreparedProgram { source: code, workgroup_size });
    }

    wgsl_minifier::minify_module(&mut module);
    let minify_error = |message: String| ProgramError::Minify { path: path.to_string(), message };
    let info = validator.validate(&module).map_err(|e| minify_error(e.to_string()))?;
    let output = naga::back::wgsl::write_string(&module, &info, naga::back::wgsl::WriterFlags::empty()).map_err(|e| minify_error(e.to_string()))?;

    Ok(PreparedProgram {
        source: wgsl_minifier::minify_wgsl_source(&output),
        workgroup_size,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipelines::ExportList;

    const DENSITY: &str = r#"
@group(0) @binding(0) var<storage, read_write> values: array<f32>;

@compute @workgroup_size(PARTICLE_GROUP_SIZE)
fn calculate_density(@builtin(global_invocation_id) id: vec3<u32>) {
    if (id.x >= u32(PARTICLE_COUNT)) {
        return;
    }
    values[id.x] = f32(id.x);
}
"#;

    const COPY: &str = r#"
@fragment
fn copy_pixelbuffer(@builtin(position) position: vec4<f32>) -> @location(0) vec4<f32> {
    return vec4<f32>(position.xy / vec2<f32>(f32(RENDER_WIDTH), f32(RENDER_HEIGHT)), 0.0, 1.0);
}
"#;

    fn exports() -> GlobalExport {
        let mut list = ExportList::new();
        list.add_int("PARTICLE_COUNT", 9216)
            .unwrap()
            .add_int("PARTICLE_GROUP_SIZE", 96)
            .unwrap()
            .add_int("RENDER_WIDTH", 512)
            .unwrap()
            .add_int("RENDER_HEIGHT", 512)
            .unwrap();
        list.build()
    }

    #[test]
    fn test_export_prelude() {
        let prelude = export_prelude(&exports());
        assert_eq!(
            prelude,
            "const PARTICLE_COUNT: i32 = 9216;\nconst PARTICLE_GROUP_SIZE: i32 = 96;\nconst RENDER_WIDTH: i32 = 512;\nconst RENDER_HEIGHT: i32 = 512;\n"
        );
        assert!(export_prelude(&GlobalExport::default()).is_empty());
    }

    #[test]
    fn test_prepare_binds_exports() {
        let program = prepare_program("density.wgsl", DENSITY, Some("calculate_density"), &exports(), ProgramStage::Compute, false).unwrap();
        assert!(program.source.starts_with("const PARTICLE_COUNT: i32 = 9216;"));
        assert!(program.source.ends_with(DENSITY));
        assert_eq!(program.workgroup_size, Some([96, 1, 1]));
    }

    #[test]
    fn test_missing_export_fails_to_parse() {
        let err = prepare_program("density.wgsl", DENSITY, Some("calculate_density"), &GlobalExport::default(), ProgramStage::Compute, false).unwrap_err();
        assert!(matches!(err, ProgramError::Parse { .. }));
    }

    #[test]
    fn test_entry_point_must_match_stage() {
        let err = prepare_program("density.wgsl", DENSITY, Some("calculate_gradh"), &exports(), ProgramStage::Compute, false).unwrap_err();
        assert!(matches!(err, ProgramError::MissingEntryPoint { stage: "compute", .. }));

        let err = prepare_program("density.wgsl", DENSITY, Some("calculate_density"), &exports(), ProgramStage::Fragment, false).unwrap_err();
        assert!(matches!(err, ProgramError::MissingEntryPoint { stage: "fragment", .. }));
    }

    #[test]
    fn test_default_entry_point() {
        let program = prepare_program("copy.wgsl", COPY, None, &exports(), ProgramStage::Fragment, false).unwrap();
        assert_eq!(program.workgroup_size, None);
        assert!(prepare_program("copy.wgsl", COPY, None, &exports(), ProgramStage::Compute, false).is_err());
    }

    #[test]
    fn test_minify_keeps_entry_point() {
        let program = prepare_program("density.wgsl", DENSITY, Some("calculate_density"), &exports(), ProgramStage::Compute, true).unwrap();
        assert!(program.source.contains("calculate_density"));
        assert!(program.source.len() < export_prelude(&exports()).len() + DENSITY.len());
        assert_eq!(program.workgroup_size, Some([96, 1, 1]));
    }
}
