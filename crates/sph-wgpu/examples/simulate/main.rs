//! Headless SPH simulation
//!
//! Assembles the SPH pipeline, runs its Setup stage once and a number of
//! frames on the GPU, then saves the last frame as an image and prints a few
//! statistics read back from the particle buffer.
//!
//! # Usage
//! ```bash
//! simulate output.png --frames 240 --preset compact
//! ```

use clap::Parser;
use sph_pipeline::{RendererState, SimulationConfig, configure_renderer, sph};
use sph_wgpu::{ParticleRecord, PipelineExecutor, programs::load_builtin_program};
use std::path::PathBuf;

/// Format of the frame the combination pass writes into
const OUTPUT_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

#[derive(Parser)]
#[command(version, about = "Runs the SPH pipeline headless and saves the final frame")]
struct Args {
    /// Output image file path
    output: PathBuf,

    /// Number of frames to simulate
    #[arg(long, short, default_value = "120")]
    frames: u32,

    /// Built-in configuration (standard, compact)
    #[arg(long, short, default_value = "standard")]
    preset: String,

    /// YAML configuration file; overrides --preset
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Minify programs before handing them to the driver
    #[arg(long)]
    minify: bool,

    /// Log every bound resource and pass
    #[arg(long, short)]
    verbose: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let level = if args.verbose { tracing::Level::DEBUG } else { tracing::Level::INFO };
    let subscriber = tracing_subscriber::fmt().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = match &args.config {
        Some(path) => SimulationConfig::from_file(path)?,
        None => SimulationConfig::preset(&args.preset.to_lowercase()).ok_or_else(|| format!("Invalid preset '{}'. Valid presets: standard, compact", args.preset))?,
    };

    let mut renderer = RendererState::default();
    configure_renderer(&mut renderer);
    tracing::debug!(?renderer, "renderer state");

    let pipeline = sph::assemble(&config)?;
    let executable = pipeline.compile_programs(load_builtin_program, args.minify)?;

    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: wgpu::Backends::PRIMARY,
        ..Default::default()
    });
    let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
        power_preference: wgpu::PowerPreference::HighPerformance,
        compatible_surface: None,
        force_fallback_adapter: false,
    }))?;
    let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
        label: None,
        required_features: wgpu::Features::empty(),
        required_limits: wgpu::Limits::default(),
        memory_hints: wgpu::MemoryHints::default(),
        trace: Default::default(),
    }))?;
    tracing::info!(adapter = ?adapter.get_info().name, "GPU initialized");

    let executor = PipelineExecutor::new(&executable, &device, OUTPUT_FORMAT)?;

    let frame_texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Frame"),
        size: wgpu::Extent3d {
            width: config.render_width,
            height: config.render_height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: OUTPUT_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    });
    let frame_view = frame_texture.create_view(&wgpu::TextureViewDescriptor::default());

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("Setup") });
    executor.initialize(&mut encoder);
    queue.submit(std::iter::once(encoder.finish()));

    for _ in 0..args.frames {
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("Frame") });
        executor.frame(&mut encoder, &frame_view);
        queue.submit(std::iter::once(encoder.finish()));
    }
    device.poll(wgpu::PollType::Wait)?;
    tracing::info!(frames = args.frames, "simulation finished");

    let particles_buffer = executor.buffer(sph::PARTICLE_BUFFER).ok_or("particle buffer is not bound")?;
    let bytes = read_buffer(&device, &queue, particles_buffer)?;
    let particles = ParticleRecord::from_bytes(&bytes).ok_or("particle buffer is not a whole number of records")?;
    let count = particles.len() as f32;
    let mean_density = particles.iter().map(|p| p.density).sum::<f32>() / count;
    let mean_height = particles.iter().map(|p| p.position[1]).sum::<f32>() / count;
    let max_speed = particles.iter().map(ParticleRecord::speed).fold(0.0, f32::max);
    println!("{} particles: mean density {mean_density:.1}, mean height {mean_height:.3}, max speed {max_speed:.3}", particles.len());

    let image = read_frame(&device, &queue, &frame_texture)?;
    image.save(&args.output)?;
    println!("Saved frame to: {}", args.output.display());

    Ok(())
}

/// Copies a GPU buffer into host memory
fn read_buffer(device: &wgpu::Device, queue: &wgpu::Queue, source: &wgpu::Buffer) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    let staging = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Readback Buffer"),
        size: source.size(),
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("Readback Encoder") });
    encoder.copy_buffer_to_buffer(source, 0, &staging, 0, source.size());
    queue.submit(std::iter::once(encoder.finish()));

    map_and_read(device, &staging)
}

/// Copies an RGBA8 texture into an image, dropping the row padding wgpu requires
fn read_frame(device: &wgpu::Device, queue: &wgpu::Queue, texture: &wgpu::Texture) -> Result<image::RgbaImage, Box<dyn std::error::Error>> {
    let wgpu::Extent3d { width, height, .. } = texture.size();
    let row_bytes = width * 4;
    let padded_row_bytes = row_bytes.next_multiple_of(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT);

    let staging = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Frame Readback Buffer"),
        size: (padded_row_bytes * height) as u64,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("Frame Copy Encoder") });
    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &staging,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(padded_row_bytes),
                rows_per_image: Some(height),
            },
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );
    queue.submit(std::iter::once(encoder.finish()));

    let padded = map_and_read(device, &staging)?;
    let pixels = padded
        .chunks(padded_row_bytes as usize)
        .flat_map(|row| &row[..row_bytes as usize])
        .copied()
        .collect::<Vec<_>>();

    Ok(image::RgbaImage::from_raw(width, height, pixels).ok_or("Failed to create RGBA8 image from data")?)
}

fn map_and_read(device: &wgpu::Device, buffer: &wgpu::Buffer) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    let buffer_slice = buffer.slice(..);
    let (sender, receiver) = futures_intrusive::channel::shared::oneshot_channel();
    buffer_slice.map_async(wgpu::MapMode::Read, move |v| {
        let _ = sender.send(v);
    });

    device.poll(wgpu::PollType::Wait)?;

    pollster::block_on(receiver.receive()).ok_or("Failed to map buffer for reading")??;

    let data = buffer_slice.get_mapped_range().to_vec();
    buffer.unmap();
    Ok(data)
}
