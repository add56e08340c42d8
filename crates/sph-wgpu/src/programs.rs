//! Built-in WGSL programs of the SPH pipeline
//!
//! The programs are embedded at compile time. Every program handed out by
//! [`load_builtin_program`] starts with `programs/common.wgsl`, which declares
//! the particle record and the smoothing kernel, exactly as
//! [`sph::load_program_file`] assembles them from disk.

use sph_pipeline::sph;

const COMMON: &str = include_str!("../programs/common.wgsl");

const PROGRAMS: &[(&str, &str)] = &[
    (sph::INITIALIZE_PARTICLES.path, include_str!("../programs/initialize.wgsl")),
    (sph::CALCULATE_DENSITY.path, include_str!("../programs/simulation/density.wgsl")),
    (sph::CALCULATE_GRADH.path, include_str!("../programs/simulation/gradh.wgsl")),
    (sph::CALCULATE_ACCELERATION.path, include_str!("../programs/simulation/acceleration.wgsl")),
    (sph::INTEGRATE_VELOCITY.path, include_str!("../programs/simulation/integrate-velocity.wgsl")),
    (sph::INTEGRATE_POSITION.path, include_str!("../programs/simulation/integrate-position.wgsl")),
    (sph::DRAW_PARTICLES.path, include_str!("../programs/rendering/draw-particles.wgsl")),
    (sph::COPY_PIXELBUFFER.path, include_str!("../programs/rendering/copy.wgsl")),
    (sph::COMBINATION_PROGRAM, include_str!("../programs/post/combination.wgsl")),
];

/// Paths of every built-in program
pub fn builtin_program_paths() -> impl Iterator<Item = &'static str> {
    PROGRAMS.iter().map(|(path, _)| *path)
}

/// Program loader for [`sph_pipeline::pipelines::Pipeline::compile_programs`]
///
/// # Arguments
/// * `path` - Program path as used by the SPH pipeline
///
/// # Returns
/// The program source, or a `NotFound` error for a path that is not built in
pub fn load_builtin_program(path: &str) -> Result<String, std::io::Error> {
    PROGRAMS
        .iter()
        .find(|(name, _)| *name == path)
        .map(|(_, source)| format!("{COMMON}\n{source}"))
        .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::NotFound, format!("no built-in program at '{path}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sph_pipeline::{SimulationConfig, pipelines::StageId};

    #[test]
    fn test_every_pass_has_a_builtin_program() {
        let pipeline = sph::assemble(&SimulationConfig::STANDARD).unwrap();
        for pass in pipeline.passes() {
            assert!(load_builtin_program(&pass.location().path).is_ok(), "{}", pass.location().path);
        }
        assert!(load_builtin_program(&pipeline.combination().path).is_ok());
        assert_eq!(builtin_program_paths().count(), PROGRAMS.len());
    }

    #[test]
    fn test_builtin_programs_match_disk() {
        let root = std::path::Path::new(env!("CARGO_MANIFEST_DIR"));
        for path in builtin_program_paths() {
            assert_eq!(load_builtin_program(path).unwrap(), sph::load_program_file(root, path).unwrap(), "{path}");
        }
    }

    #[test]
    fn test_unknown_program() {
        let err = load_builtin_program("programs/missing.wgsl").unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    }

    #[test]
    fn test_builtin_programs_validate() {
        for config in [SimulationConfig::STANDARD, SimulationConfig::COMPACT] {
            let executable = sph::assemble(&config).unwrap().compile_programs(load_builtin_program, false).unwrap();
            assert_eq!(executable.stage(StageId::Setup).len(), 3);
            assert_eq!(executable.stage(StageId::Simulation).len(), 9);
            assert_eq!(executable.stage(StageId::Post).len(), 2);
        }
    }

    #[test]
    fn test_builtin_programs_minify() {
        let executable = sph::assemble(&SimulationConfig::COMPACT).unwrap().compile_programs(load_builtin_program, true).unwrap();
        let density = &executable.stage(StageId::Simulation)[0];
        assert!(density.shader.contains(sph::CALCULATE_DENSITY.entry_point));
    }
}
