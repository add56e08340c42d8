//! Pipeline analysis tool
//!
//! Assembles the SPH pipeline for a configuration and dumps the result to
//! stdout. With `--programs` the referenced WGSL programs are loaded from a
//! directory and validated as well, and the compiled pipeline is dumped
//! instead.

use clap::Parser;
use sph_pipeline::{RendererState, SimulationConfig, configure_renderer, sph};
use std::path::PathBuf;

#[derive(Parser)]
#[command(version, about = "Assembles the SPH pipeline and dumps its structure")]
struct Args {
    /// YAML configuration file; overrides --preset
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Built-in configuration (standard, compact)
    #[arg(long, short, default_value = "standard")]
    preset: String,

    /// Directory program paths are resolved against; must hold programs/common.wgsl
    #[arg(long)]
    programs: Option<PathBuf>,

    /// Minify the prepared programs (requires --programs)
    #[arg(long)]
    minify: bool,

    /// Print JSON instead of the debug representation
    #[arg(long)]
    json: bool,

    /// Log every declared resource and compiled pass
    #[arg(long, short)]
    verbose: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let level = if args.verbose { tracing::Level::DEBUG } else { tracing::Level::INFO };
    let subscriber = tracing_subscriber::fmt().with_max_level(level).with_writer(std::io::stderr).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = match &args.config {
        Some(path) => SimulationConfig::from_file(path)?,
        None => SimulationConfig::preset(&args.preset.to_lowercase()).ok_or_else(|| format!("Invalid preset '{}'. Valid presets: standard, compact", args.preset))?,
    };
    tracing::info!(particles = config.particle_count(), width = config.render_width, height = config.render_height, "analyzing configuration");

    let mut renderer = RendererState::default();
    configure_renderer(&mut renderer);

    let pipeline = sph::assemble(&config)?;

    match &args.programs {
        Some(dir) => {
            let executable = pipeline.compile_programs(|path| sph::load_program_file(dir, path), args.minify)?;
            dump(&renderer, &executable, args.json)?;
        }
        None => dump(&renderer, &pipeline, args.json)?,
    }

    Ok(())
}

fn dump(renderer: &RendererState, pipeline: &(impl serde::Serialize + std::fmt::Debug), json: bool) -> Result<(), serde_json::Error> {
    if json {
        let document = serde_json::json!({ "renderer": renderer, "pipeline": pipeline });
        println!("{}", serde_json::to_string_pretty(&document)?);
    } else {
        println!("{renderer:#?}");
        println!("{pipeline:#?}");
    }
    Ok(())
}
