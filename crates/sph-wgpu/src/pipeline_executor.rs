//! Pipeline execution engine for SPH-wgpu
//!
//! This module binds an [`ExecutablePipeline`] to wgpu resources and records
//! its passes. Every pass is its own wgpu compute or render pass, so the pass
//! boundary orders the buffer writes of one pass before the reads of the next.
//!
//! Binding convention, shared with the built-in programs:
//! * compute passes see every buffer as `read_write` storage at `@group(0) @binding(i)`
//! * composite passes see the same buffers as `read` storage
//! * the combination pass sees every texture as `texture_2d<f32>` at `@group(0) @binding(i)`
//!
//! where `i` is the declaration index of the resource.

use crate::ExecutorError;
use sph_pipeline::pipelines::{CompositePass, ComputePass, ExecutableCombinationPass, ExecutablePass, ExecutablePipeline, Pass, StageId, TextureFormat};

/// Vertex stage shared by every full-screen pass
const FULLSCREEN_VERTEX: &str = include_str!("../programs/fullscreen.wgsl");
const FULLSCREEN_ENTRY_POINT: &str = "fullscreen_vertex";

/// Maps a declared texture format to its wgpu equivalent
pub fn texture_format(format: TextureFormat) -> wgpu::TextureFormat {
    match format {
        TextureFormat::Rgba8 => wgpu::TextureFormat::Rgba8Unorm,
        TextureFormat::Rgba16F => wgpu::TextureFormat::Rgba16Float,
        TextureFormat::Rgba32F => wgpu::TextureFormat::Rgba32Float,
        TextureFormat::R16F => wgpu::TextureFormat::R16Float,
        TextureFormat::R32F => wgpu::TextureFormat::R32Float,
        TextureFormat::Rg16F => wgpu::TextureFormat::Rg16Float,
        TextureFormat::Rg32F => wgpu::TextureFormat::Rg32Float,
    }
}

/// Size of the GPU allocation backing a declared buffer
pub fn aligned_buffer_size(size: u64) -> u64 {
    size.next_multiple_of(wgpu::COPY_BUFFER_ALIGNMENT)
}

/// Checks that every resource and pass of `pipeline` fits within `limits`
///
/// # Arguments
/// * `pipeline` - The pipeline about to be bound
/// * `limits` - Limits of the target device
///
/// # Returns
/// The first violated limit, if any
pub fn check_limits(pipeline: &ExecutablePipeline, limits: &wgpu::Limits) -> Result<(), ExecutorError> {
    let buffer_limit = (limits.max_storage_buffer_binding_size as u64).min(limits.max_buffer_size);
    for buffer in &pipeline.buffers {
        let size = aligned_buffer_size(buffer.size);
        if size > buffer_limit {
            return Err(ExecutorError::BufferTooLarge {
                name: buffer.name.clone(),
                size,
                limit: buffer_limit,
            });
        }
    }

    for texture in &pipeline.textures {
        if texture.width > limits.max_texture_dimension_2d || texture.height > limits.max_texture_dimension_2d {
            return Err(ExecutorError::TextureTooLarge {
                name: texture.name.clone(),
                width: texture.width,
                height: texture.height,
                limit: limits.max_texture_dimension_2d,
            });
        }
    }

    let buffer_count = pipeline.buffers.len();
    for executable_pass in pipeline.stages.iter().flatten() {
        let pass = &executable_pass.pass;
        if buffer_count > limits.max_storage_buffers_per_shader_stage as usize {
            return Err(ExecutorError::TooManyBindings {
                pass: pass.name().to_string(),
                kind: "storage buffers",
                count: buffer_count,
                limit: limits.max_storage_buffers_per_shader_stage,
            });
        }

        match pass {
            Pass::Compute(compute) => {
                let limit = limits.max_compute_workgroups_per_dimension;
                if compute.work_groups.iter().any(|&count| count > limit) {
                    return Err(ExecutorError::DispatchTooLarge {
                        pass: compute.name.clone(),
                        work_groups: compute.work_groups,
                        limit,
                    });
                }
                if let Some(size) = executable_pass.workgroup_size {
                    check_workgroup_size(&compute.name, size, limits)?;
                }
            }
            Pass::Composite(composite) => {
                let mut extent = None;
                for target in &composite.targets {
                    if target.slot >= limits.max_color_attachments {
                        return Err(ExecutorError::TargetSlotOutOfRange {
                            pass: composite.name.clone(),
                            slot: target.slot,
                            limit: limits.max_color_attachments,
                        });
                    }
                    let Some(texture) = pipeline.textures.iter().find(|texture| texture.name == target.texture) else {
                        return Err(ExecutorError::UnknownTexture {
                            pass: composite.name.clone(),
                            texture: target.texture.clone(),
                        });
                    };

                    // All attachments of a render pass share one extent
                    let (expected_width, expected_height) = *extent.get_or_insert((texture.width, texture.height));
                    if (texture.width, texture.height) != (expected_width, expected_height) {
                        return Err(ExecutorError::TargetSizeMismatch {
                            pass: composite.name.clone(),
                            texture: texture.name.clone(),
                            width: texture.width,
                            height: texture.height,
                            expected_width,
                            expected_height,
                        });
                    }
                }
            }
        }
    }

    if pipeline.textures.len() > limits.max_sampled_textures_per_shader_stage as usize {
        return Err(ExecutorError::TooManyBindings {
            pass: sph_pipeline::pipelines::COMBINATION_PASS_NAME.to_string(),
            kind: "sampled textures",
            count: pipeline.textures.len(),
            limit: limits.max_sampled_textures_per_shader_stage,
        });
    }

    Ok(())
}

fn check_workgroup_size(pass: &str, size: [u32; 3], limits: &wgpu::Limits) -> Result<(), ExecutorError> {
    let per_dimension = [
        ("max_compute_workgroup_size_x", limits.max_compute_workgroup_size_x),
        ("max_compute_workgroup_size_y", limits.max_compute_workgroup_size_y),
        ("max_compute_workgroup_size_z", limits.max_compute_workgroup_size_z),
    ];
    for ((limit, max), extent) in per_dimension.into_iter().zip(size) {
        if extent > max {
            return Err(ExecutorError::WorkGroupTooLarge {
                pass: pass.to_string(),
                size,
                limit,
                max,
            });
        }
    }

    let invocations = size.iter().map(|&extent| extent as u64).product::<u64>();
    if invocations > limits.max_compute_invocations_per_workgroup as u64 {
        return Err(ExecutorError::WorkGroupTooLarge {
            pass: pass.to_string(),
            size,
            limit: "max_compute_invocations_per_workgroup",
            max: limits.max_compute_invocations_per_workgroup,
        });
    }
    Ok(())
}

#[derive(Debug)]
struct BoundBuffer {
    name: String,
    buffer: wgpu::Buffer,
    clear_each_frame: bool,
}

#[derive(Debug)]
struct BoundTexture {
    name: String,
    texture: wgpu::Texture,
    /// View of mip level 0, used both as attachment and for sampling
    view: wgpu::TextureView,
    clear_each_frame: bool,
}

/// A single pass bound to wgpu resources
#[derive(Debug)]
enum BoundPass {
    Compute {
        name: String,
        pipeline: wgpu::ComputePipeline,
        bind_group: wgpu::BindGroup,
        work_groups: [u32; 3],
    },
    Composite {
        name: String,
        pipeline: wgpu::RenderPipeline,
        bind_group: wgpu::BindGroup,
        /// Texture index per attachment slot
        targets: Vec<Option<usize>>,
    },
}

/// The combination pass bound to the host's output format
#[derive(Debug)]
struct BoundCombinationPass {
    pipeline: wgpu::RenderPipeline,
    bind_group: wgpu::BindGroup,
}

/// Creates the GPU objects of individual passes
struct PassBinder<'a> {
    device: &'a wgpu::Device,
    buffers: &'a [BoundBuffer],
    textures: &'a [BoundTexture],
    vertex_module: wgpu::ShaderModule,
}

impl PassBinder<'_> {
    fn bind(&self, executable_pass: &ExecutablePass) -> Result<BoundPass, ExecutorError> {
        match &executable_pass.pass {
            Pass::Compute(compute) => Ok(self.bind_compute(compute, &executable_pass.shader)),
            Pass::Composite(composite) => self.bind_composite(composite, &executable_pass.shader),
        }
    }

    fn bind_compute(&self, pass: &ComputePass, shader: &str) -> BoundPass {
        let shader_module = self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&pass.name),
            source: wgpu::ShaderSource::Wgsl(shader.into()),
        });

        let (bind_group_layout, bind_group) = self.bind_buffers(&pass.name, false, wgpu::ShaderStages::COMPUTE);
        let pipeline_layout = self.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(&pass.name),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = self.device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some(&pass.name),
            layout: Some(&pipeline_layout),
            module: &shader_module,
            entry_point: Some(&pass.location.entry_point),
            compilation_options: Default::default(),
            cache: None,
        });

        tracing::debug!(pass = %pass.name, work_groups = ?pass.work_groups, "bound compute pass");

        BoundPass::Compute {
            name: pass.name.clone(),
            pipeline,
            bind_group,
            work_groups: pass.work_groups,
        }
    }

    fn bind_composite(&self, pass: &CompositePass, shader: &str) -> Result<BoundPass, ExecutorError> {
        let slot_count = pass.targets.iter().map(|target| target.slot as usize + 1).max().unwrap_or(0);
        let mut targets = vec![None; slot_count];
        for target in &pass.targets {
            let index = self
                .textures
                .iter()
                .position(|texture| texture.name == target.texture)
                .ok_or_else(|| ExecutorError::UnknownTexture {
                    pass: pass.name.clone(),
                    texture: target.texture.clone(),
                })?;
            targets[target.slot as usize] = Some(index);
        }

        let (bind_group_layout, bind_group) = self.bind_buffers(&pass.name, true, wgpu::ShaderStages::FRAGMENT);
        let color_targets = targets.iter().map(|target| target.map(|index| self.textures[index].texture.format())).collect::<Vec<_>>();
        let pipeline = self.create_render_pipeline(&pass.name, shader, Some(&pass.location.entry_point), &bind_group_layout, &color_targets);

        tracing::debug!(pass = %pass.name, targets = pass.targets.len(), "bound composite pass");

        Ok(BoundPass::Composite {
            name: pass.name.clone(),
            pipeline,
            bind_group,
            targets,
        })
    }

    fn bind_combination(&self, pass: &ExecutableCombinationPass, output_format: wgpu::TextureFormat) -> BoundCombinationPass {
        let label = sph_pipeline::pipelines::COMBINATION_PASS_NAME;
        let bind_group_layout_entries = (0..self.textures.len() as u32)
            .map(|binding| wgpu::BindGroupLayoutEntry {
                binding,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: false },
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            })
            .collect::<Vec<_>>();
        let bind_group_layout = self.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(label),
            entries: &bind_group_layout_entries,
        });

        let bind_group_entries = self
            .textures
            .iter()
            .enumerate()
            .map(|(binding, texture)| wgpu::BindGroupEntry {
                binding: binding as u32,
                resource: wgpu::BindingResource::TextureView(&texture.view),
            })
            .collect::<Vec<_>>();
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout: &bind_group_layout,
            entries: &bind_group_entries,
        });

        let pipeline = self.create_render_pipeline(label, &pass.shader, pass.entry_point.as_deref(), &bind_group_layout, &[Some(output_format)]);

        BoundCombinationPass { pipeline, bind_group }
    }

    /// Every buffer in declaration order, as storage bindings of group 0
    fn bind_buffers(&self, label: &str, read_only: bool, visibility: wgpu::ShaderStages) -> (wgpu::BindGroupLayout, wgpu::BindGroup) {
        let bind_group_layout_entries = (0..self.buffers.len() as u32)
            .map(|binding| wgpu::BindGroupLayoutEntry {
                binding,
                visibility,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Storage { read_only },
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            })
            .collect::<Vec<_>>();
        let bind_group_layout = self.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(label),
            entries: &bind_group_layout_entries,
        });

        let bind_group_entries = self
            .buffers
            .iter()
            .enumerate()
            .map(|(binding, buffer)| wgpu::BindGroupEntry {
                binding: binding as u32,
                resource: buffer.buffer.as_entire_binding(),
            })
            .collect::<Vec<_>>();
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout: &bind_group_layout,
            entries: &bind_group_entries,
        });

        (bind_group_layout, bind_group)
    }

    /// A full-screen triangle pipeline running `entry_point` of `shader` as fragment stage
    fn create_render_pipeline(
        &self,
        label: &str,
        shader: &str,
        entry_point: Option<&str>,
        bind_group_layout: &wgpu::BindGroupLayout,
        color_formats: &[Option<wgpu::TextureFormat>],
    ) -> wgpu::RenderPipeline {
        let shader_module = self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(label),
            source: wgpu::ShaderSource::Wgsl(shader.into()),
        });
        let pipeline_layout = self.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(label),
            bind_group_layouts: &[bind_group_layout],
            push_constant_ranges: &[],
        });

        let color_targets = color_formats
            .iter()
            .map(|format| {
                format.map(|format| wgpu::ColorTargetState {
                    format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })
            })
            .collect::<Vec<_>>();

        self.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(label),
            layout: Some(&pipeline_layout),
            cache: None,
            vertex: wgpu::VertexState {
                module: &self.vertex_module,
                buffers: &[],
                compilation_options: Default::default(),
                entry_point: Some(FULLSCREEN_ENTRY_POINT),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader_module,
                targets: &color_targets,
                compilation_options: Default::default(),
                entry_point,
            }),
            primitive: wgpu::PrimitiveState::default(),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            depth_stencil: None,
        })
    }
}

impl BoundPass {
    fn record(&self, encoder: &mut wgpu::CommandEncoder, textures: &[BoundTexture]) {
        match self {
            BoundPass::Compute {
                name,
                pipeline,
                bind_group,
                work_groups: [x, y, z],
            } => {
                let mut compute_pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                    label: Some(name),
                    timestamp_writes: None,
                });

                compute_pass.set_pipeline(pipeline);
                compute_pass.set_bind_group(0, bind_group, &[]);
                compute_pass.dispatch_workgroups(*x, *y, *z);
            }
            BoundPass::Composite { name, pipeline, bind_group, targets } => {
                let color_attachments = targets
                    .iter()
                    .map(|target| {
                        target.map(|index| wgpu::RenderPassColorAttachment {
                            view: &textures[index].view,
                            resolve_target: None,
                            ops: wgpu::Operations {
                                load: wgpu::LoadOp::Load,
                                store: wgpu::StoreOp::Store,
                            },
                        })
                    })
                    .collect::<Vec<_>>();

                let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some(name),
                    color_attachments: &color_attachments,
                    ..Default::default()
                });

                render_pass.set_pipeline(pipeline);
                render_pass.set_bind_group(0, bind_group, &[]);
                render_pass.draw(0..3, 0..1);
            }
        }
    }
}

/// An SPH pipeline bound to a wgpu device
///
/// Buffers and textures are allocated once here and live as long as the
/// executor. The Setup stage is recorded by [`PipelineExecutor::initialize`],
/// the Simulation and Post stages plus the combination pass by
/// [`PipelineExecutor::frame`].
#[derive(Debug)]
pub struct PipelineExecutor {
    buffers: Vec<BoundBuffer>,
    textures: Vec<BoundTexture>,
    setup_passes: Vec<BoundPass>,
    frame_passes: Vec<BoundPass>,
    combination: BoundCombinationPass,
}

impl PipelineExecutor {
    /// Binds a pipeline to GPU resources
    ///
    /// # Arguments
    /// * `pipeline` - The executable pipeline to bind
    /// * `device` - The wgpu device for resource creation
    /// * `output_format` - Format of the host frame the combination pass writes
    ///
    /// # Returns
    /// The bound executor, or the first device limit the pipeline exceeds
    pub fn new(pipeline: &ExecutablePipeline, device: &wgpu::Device, output_format: wgpu::TextureFormat) -> Result<Self, ExecutorError> {
        check_limits(pipeline, &device.limits())?;

        let buffers = pipeline
            .buffers
            .iter()
            .map(|spec| {
                let buffer = device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some(&spec.name),
                    size: aligned_buffer_size(spec.size),
                    usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::COPY_SRC,
                    mapped_at_creation: false,
                });
                tracing::debug!(name = %spec.name, size = buffer.size(), "allocated buffer");
                BoundBuffer {
                    name: spec.name.clone(),
                    buffer,
                    clear_each_frame: spec.clear_each_frame,
                }
            })
            .collect::<Vec<_>>();

        let textures = pipeline
            .textures
            .iter()
            .map(|spec| {
                let texture = device.create_texture(&wgpu::TextureDescriptor {
                    label: Some(&spec.name),
                    size: wgpu::Extent3d {
                        width: spec.width,
                        height: spec.height,
                        depth_or_array_layers: 1,
                    },
                    mip_level_count: spec.mip_level_count(),
                    sample_count: 1,
                    dimension: wgpu::TextureDimension::D2,
                    format: texture_format(spec.format),
                    usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_SRC | wgpu::TextureUsages::COPY_DST,
                    view_formats: &[],
                });
                let view = texture.create_view(&wgpu::TextureViewDescriptor {
                    label: Some(&spec.name),
                    mip_level_count: Some(1),
                    ..Default::default()
                });
                tracing::debug!(name = %spec.name, width = spec.width, height = spec.height, format = %spec.format, "allocated texture");
                BoundTexture {
                    name: spec.name.clone(),
                    texture,
                    view,
                    clear_each_frame: spec.clear_each_frame,
                }
            })
            .collect::<Vec<_>>();

        let binder = PassBinder {
            device,
            buffers: &buffers,
            textures: &textures,
            vertex_module: device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(FULLSCREEN_ENTRY_POINT),
                source: wgpu::ShaderSource::Wgsl(FULLSCREEN_VERTEX.into()),
            }),
        };

        let setup_passes = pipeline.stage(StageId::Setup).iter().map(|pass| binder.bind(pass)).collect::<Result<Vec<_>, _>>()?;
        let frame_passes = StageId::ALL
            .into_iter()
            .filter(|stage| stage.is_per_frame())
            .flat_map(|stage| pipeline.stage(stage))
            .map(|pass| binder.bind(pass))
            .collect::<Result<Vec<_>, _>>()?;
        let combination = binder.bind_combination(&pipeline.combination, output_format);

        tracing::info!(
            buffers = buffers.len(),
            textures = textures.len(),
            setup_passes = setup_passes.len(),
            frame_passes = frame_passes.len(),
            "bound pipeline"
        );

        Ok(Self {
            buffers,
            textures,
            setup_passes,
            frame_passes,
            combination,
        })
    }

    /// Records the Setup stage
    ///
    /// Every buffer is zeroed first, so calling this again restarts the
    /// simulation from its initial state.
    pub fn initialize(&self, encoder: &mut wgpu::CommandEncoder) {
        for buffer in &self.buffers {
            encoder.clear_buffer(&buffer.buffer, 0, None);
        }
        for pass in &self.setup_passes {
            pass.record(encoder, &self.textures);
        }
    }

    /// Records one frame: Simulation, Post, then the combination pass into `target`
    ///
    /// # Arguments
    /// * `encoder` - The command encoder to record commands into
    /// * `target` - View of the host frame, in the format given to [`PipelineExecutor::new`]
    pub fn frame(&self, encoder: &mut wgpu::CommandEncoder, target: &wgpu::TextureView) {
        for buffer in self.buffers.iter().filter(|buffer| buffer.clear_each_frame) {
            encoder.clear_buffer(&buffer.buffer, 0, None);
        }
        for texture in self.textures.iter().filter(|texture| texture.clear_each_frame) {
            let _ = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some(&texture.name),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &texture.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                ..Default::default()
            });
        }

        for pass in &self.frame_passes {
            pass.record(encoder, &self.textures);
        }

        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(sph_pipeline::pipelines::COMBINATION_PASS_NAME),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
            })],
            ..Default::default()
        });
        render_pass.set_pipeline(&self.combination.pipeline);
        render_pass.set_bind_group(0, &self.combination.bind_group, &[]);
        render_pass.draw(0..3, 0..1);
    }

    /// GPU buffer backing a declared buffer, e.g. for readback
    pub fn buffer(&self, name: &str) -> Option<&wgpu::Buffer> {
        self.buffers.iter().find(|buffer| buffer.name == name).map(|buffer| &buffer.buffer)
    }

    /// GPU texture backing a declared texture
    pub fn texture(&self, name: &str) -> Option<&wgpu::Texture> {
        self.textures.iter().find(|texture| texture.name == name).map(|texture| &texture.texture)
    }
}
