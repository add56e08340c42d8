//! The SPH fluid pipeline
//!
//! One parameterized constructor replaces the per-resolution variants. The
//! Simulation stage runs the density, gradH, acceleration and velocity chain
//! twice around a single position update, so the second half recomputes the
//! forces at the moved positions before the frame is final.

use crate::{
    config::SimulationConfig,
    error::{PipelineError, Result},
    pipelines::{ExportList, Pipeline, PipelineBuilder, StageBuilder, StageId, TextureFormat},
};
use std::path::Path;

/// Name of the particle state buffer
pub const PARTICLE_BUFFER: &str = "particles";
/// Name of the splatted color buffer
pub const PIXEL_BUFFER: &str = "pixelbuffer";
/// Name of the texture the pixel buffer is copied into
pub const MAIN_TEXTURE: &str = "mainTexture";

/// A program path and entry point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Kernel {
    pub path: &'static str,
    pub entry_point: &'static str,
}

pub const INITIALIZE_PARTICLES: Kernel = Kernel {
    path: "programs/initialize.wgsl",
    entry_point: "initialize_particles",
};
pub const CALCULATE_DENSITY: Kernel = Kernel {
    path: "programs/simulation/density.wgsl",
    entry_point: "calculate_density",
};
pub const CALCULATE_GRADH: Kernel = Kernel {
    path: "programs/simulation/gradh.wgsl",
    entry_point: "calculate_gradh",
};
pub const CALCULATE_ACCELERATION: Kernel = Kernel {
    path: "programs/simulation/acceleration.wgsl",
    entry_point: "calculate_acceleration",
};
pub const INTEGRATE_VELOCITY: Kernel = Kernel {
    path: "programs/simulation/integrate-velocity.wgsl",
    entry_point: "integrate_velocity",
};
pub const INTEGRATE_POSITION: Kernel = Kernel {
    path: "programs/simulation/integrate-position.wgsl",
    entry_point: "integrate_position",
};
pub const DRAW_PARTICLES: Kernel = Kernel {
    path: "programs/rendering/draw-particles.wgsl",
    entry_point: "draw_particles",
};
pub const COPY_PIXELBUFFER: Kernel = Kernel {
    path: "programs/rendering/copy.wgsl",
    entry_point: "copy_pixelbuffer",
};
pub const COMBINATION_PROGRAM: &str = "programs/post/combination.wgsl";
/// Declarations shared by every SPH program: the particle record and the smoothing kernel
pub const COMMON_PROGRAM: &str = "programs/common.wgsl";

const SETUP_PASSES: [(&str, Kernel); 3] = [
    ("initialize-particles", INITIALIZE_PARTICLES),
    ("initialize-density", CALCULATE_DENSITY),
    ("initialize-gradh", CALCULATE_GRADH),
];

const SIMULATION_PASSES: [(&str, Kernel); 9] = [
    ("calculate-density-1", CALCULATE_DENSITY),
    ("calculate-gradh-1", CALCULATE_GRADH),
    ("calculate-acceleration-1", CALCULATE_ACCELERATION),
    ("calculate-velocity-1", INTEGRATE_VELOCITY),
    ("calculate-position", INTEGRATE_POSITION),
    ("calculate-density-2", CALCULATE_DENSITY),
    ("calculate-gradh-2", CALCULATE_GRADH),
    ("calculate-acceleration-2", CALCULATE_ACCELERATION),
    ("calculate-velocity-2", INTEGRATE_VELOCITY),
];

/// Declares the whole SPH pipeline into `pipeline`
///
/// Resources come first, then the export table, the three stages and the
/// combination pass. Every compute pass dispatches one work group row of
/// `particle_group_count` groups.
///
/// # Arguments
/// * `pipeline` - A fresh builder
/// * `config` - Particle and resolution parameters
pub fn configure_pipeline(pipeline: &mut PipelineBuilder, config: &SimulationConfig) -> Result<()> {
    config.validate()?;

    let main_texture = pipeline
        .create_texture(MAIN_TEXTURE)
        .format(TextureFormat::Rgba16F)
        .width(config.render_width)
        .height(config.render_height)
        .mipmap(false)
        .clear(false)
        .build()?;

    pipeline.create_buffer(PARTICLE_BUFFER, config.particle_buffer_size(), false)?;
    pipeline.create_buffer(PIXEL_BUFFER, config.pixel_buffer_size(), true)?;

    pipeline.set_global_export(global_exports(config)?)?;

    let mut setup = pipeline.for_stage(StageId::Setup)?;
    add_compute_passes(&mut setup, &SETUP_PASSES, config)?;
    setup.end();

    let mut simulation = pipeline.for_stage(StageId::Simulation)?;
    add_compute_passes(&mut simulation, &SIMULATION_PASSES, config)?;
    simulation.end();

    let mut post = pipeline.for_stage(StageId::Post)?;
    add_compute_passes(&mut post, &[("draw-particles", DRAW_PARTICLES)], config)?;
    post.create_composite("copy-pixelbuffer")?
        .location(COPY_PIXELBUFFER.path, COPY_PIXELBUFFER.entry_point)
        .target(0, &main_texture)?
        .compile()?;
    post.end();

    pipeline.create_combination_pass(COMBINATION_PROGRAM)?.compile()
}

/// Builds and returns the SPH pipeline for `config`
pub fn assemble(config: &SimulationConfig) -> Result<Pipeline> {
    let mut pipeline = PipelineBuilder::new();
    configure_pipeline(&mut pipeline, config)?;
    pipeline.finish()
}

/// The constants every SPH program is compiled against
pub fn global_exports(config: &SimulationConfig) -> Result<crate::pipelines::GlobalExport> {
    let export = |name: &str, value: u64| {
        i32::try_from(value).map_err(|_| PipelineError::InvalidDimension {
            name: name.to_string(),
            reason: format!("{value} does not fit an i32 export"),
        })
    };

    let mut list = ExportList::new();
    list.add_int("PARTICLE_COUNT", export("PARTICLE_COUNT", config.particle_count())?)?
        .add_int("PARTICLE_GROUP_SIZE", export("PARTICLE_GROUP_SIZE", config.particle_group_size as u64)?)?
        .add_int("RENDER_WIDTH", export("RENDER_WIDTH", config.render_width as u64)?)?
        .add_int("RENDER_HEIGHT", export("RENDER_HEIGHT", config.render_height as u64)?)?;
    Ok(list.build())
}

/// Program loader for a directory holding the SPH programs
///
/// Each program is returned with [`COMMON_PROGRAM`] prepended, matching what
/// the programs expect to find in scope.
///
/// # Arguments
/// * `root` - Directory the program paths are relative to
/// * `path` - Program path as used by the pipeline
pub fn load_program_file(root: &Path, path: &str) -> Result<String, std::io::Error> {
    let read = |relative: &str| {
        std::fs::read_to_string(root.join(relative)).map_err(|e| std::io::Error::new(e.kind(), format!("{}: {e}", root.join(relative).display())))
    };
    let common = read(COMMON_PROGRAM)?;
    let source = read(path)?;
    Ok(format!("{common}\n{source}"))
}

fn add_compute_passes(stage: &mut StageBuilder<'_>, passes: &[(&str, Kernel)], config: &SimulationConfig) -> Result<()> {
    for (name, kernel) in passes {
        stage
            .create_compute(name)?
            .location(kernel.path, kernel.entry_point)
            .work_groups(config.particle_group_count, 1, 1)?
            .compile()?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipelines::Pass;

    fn names(pipeline: &Pipeline, stage: StageId) -> Vec<&str> {
        pipeline.stage(stage).iter().map(Pass::name).collect()
    }

    #[test]
    fn test_stage_layout() {
        let pipeline = assemble(&SimulationConfig::STANDARD).unwrap();

        assert_eq!(names(&pipeline, StageId::Setup), ["initialize-particles", "initialize-density", "initialize-gradh"]);
        assert_eq!(
            names(&pipeline, StageId::Simulation),
            [
                "calculate-density-1",
                "calculate-gradh-1",
                "calculate-acceleration-1",
                "calculate-velocity-1",
                "calculate-position",
                "calculate-density-2",
                "calculate-gradh-2",
                "calculate-acceleration-2",
                "calculate-velocity-2",
            ]
        );
        assert_eq!(names(&pipeline, StageId::Post), ["draw-particles", "copy-pixelbuffer"]);
        assert_eq!(pipeline.combination().path, COMBINATION_PROGRAM);
    }

    #[test]
    fn test_acceleration_runs_once_per_half_step() {
        let pipeline = assemble(&SimulationConfig::STANDARD).unwrap();
        let accelerations = pipeline.stage(StageId::Simulation).iter().filter(|pass| pass.location().entry_point == CALCULATE_ACCELERATION.entry_point).count();
        assert_eq!(accelerations, 2);
    }

    #[test]
    fn test_resource_sizes() {
        let pipeline = assemble(&SimulationConfig::STANDARD).unwrap();
        assert_eq!(pipeline.buffer(PARTICLE_BUFFER).unwrap().size, 774_144);
        assert!(!pipeline.buffer(PARTICLE_BUFFER).unwrap().clear_each_frame);
        assert_eq!(pipeline.buffer(PIXEL_BUFFER).unwrap().size, 2_097_152);
        assert!(pipeline.buffer(PIXEL_BUFFER).unwrap().clear_each_frame);

        let texture = pipeline.texture(MAIN_TEXTURE).unwrap();
        assert_eq!((texture.width, texture.height, texture.format), (512, 512, TextureFormat::Rgba16F));
        assert!(!texture.mipmap);
        assert!(!texture.clear_each_frame);

        let compact = assemble(&SimulationConfig::COMPACT).unwrap();
        assert_eq!(compact.buffer(PARTICLE_BUFFER).unwrap().size, 84 * 4096);
        assert_eq!(compact.buffer(PIXEL_BUFFER).unwrap().size, 8 * 256 * 256);
    }

    #[test]
    fn test_every_pass_sees_the_exports() {
        let pipeline = assemble(&SimulationConfig::COMPACT).unwrap();
        for pass in pipeline.passes() {
            assert_eq!(pass.exports(), pipeline.exports());
            if let Pass::Compute(compute) = pass {
                assert_eq!(compute.work_groups, [64, 1, 1]);
            }
        }
        assert_eq!(pipeline.exports().get("PARTICLE_COUNT"), Some(4096));
        assert_eq!(pipeline.exports().get("PARTICLE_GROUP_SIZE"), Some(64));
        assert_eq!(pipeline.exports().get("RENDER_WIDTH"), Some(256));
        assert_eq!(pipeline.exports().get("RENDER_HEIGHT"), Some(256));
    }

    #[test]
    fn test_copy_targets_main_texture() {
        let pipeline = assemble(&SimulationConfig::STANDARD).unwrap();
        let Some((StageId::Post, Pass::Composite(copy))) = pipeline.find_pass("copy-pixelbuffer") else {
            panic!("copy-pixelbuffer is not a Post composite pass");
        };
        assert_eq!(copy.targets.len(), 1);
        assert_eq!(copy.targets[0].slot, 0);
        assert_eq!(copy.targets[0].texture, MAIN_TEXTURE);
    }

    #[test]
    fn test_shipped_programs_load_from_disk() {
        let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("../sph-wgpu");
        for config in [SimulationConfig::STANDARD, SimulationConfig::COMPACT] {
            let executable = assemble(&config).unwrap().compile_programs(|path| load_program_file(&root, path), false).unwrap();
            assert_eq!(executable.pass_count(), 14);
            assert!(executable.combination.shader.contains("struct Particle"));
        }

        // Without the shared declarations next to it, loading fails
        let err = load_program_file(&root.join("programs"), "initialize.wgsl").unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
        assert!(err.to_string().contains("common.wgsl"));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = SimulationConfig {
            particle_group_count: 0,
            ..SimulationConfig::STANDARD
        };
        assert!(matches!(assemble(&config), Err(PipelineError::InvalidDimension { .. })));
    }
}
