//! Variant-compiled GPU pipeline for body rendering.
//!
//! Two boolean knobs select the shader variant: lighting and HDR. They are
//! baked into the WGSL source as `const bool` switches prepended to a fixed
//! template, so each `(hdr, lighting)` pair compiles to its own pipeline.
//! Bodies rebuild their pipeline when the host toggles either knob.

use bytemuck::{Pod, Zeroable};

use orrery_core::GraphicsSettings;
use orrery_render::{DepthScheme, Gpu};

use crate::mesh::GridVertex;

/// WGSL template; the variant consts are prepended by [`compose_source`].
const BODY_SHADER_TEMPLATE: &str = include_str!("body_shader.wgsl");

/// The two compile-time knobs of the body shader.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ShaderVariant {
    pub hdr: bool,
    pub lighting: bool,
}

impl ShaderVariant {
    /// The variant matching the host's current graphics toggles.
    pub fn current(graphics: &GraphicsSettings) -> Self {
        Self {
            hdr: graphics.enable_hdr.get(),
            lighting: graphics.enable_lighting.get(),
        }
    }

    /// The color target the host binds for this variant: a float target in
    /// HDR mode, the regular swapchain format otherwise.
    pub fn target_format(&self) -> wgpu::TextureFormat {
        if self.hdr {
            wgpu::TextureFormat::Rgba16Float
        } else {
            wgpu::TextureFormat::Bgra8UnormSrgb
        }
    }
}

/// Bake the variant switches into compilable WGSL.
pub fn compose_source(variant: ShaderVariant) -> String {
    format!(
        "const ENABLE_HDR: bool = {};\nconst ENABLE_LIGHTING: bool = {};\n\n{}",
        variant.hdr, variant.lighting, BODY_SHADER_TEMPLATE
    )
}

/// Uniform block of the body shader. Field order matches the WGSL struct.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct BodyUniforms {
    /// Camera modelview with the body's world transform folded in.
    pub mat_model_view: [[f32; 4]; 4],
    /// Projection matrix.
    pub mat_projection: [[f32; 4]; 4],
    /// Triaxial radii in scene units.
    pub radii: [f32; 3],
    /// Real illuminance in HDR mode, 1 otherwise.
    pub sun_illuminance: f32,
    /// Unit vector from the body origin toward the Sun, world space.
    pub sun_direction: [f32; 3],
    /// Ambient floor multiplier; 1 for the Sun itself.
    pub ambient_brightness: f32,
    /// Reciprocal-depth normaliser.
    pub far_clip: f32,
    pub _padding: [f32; 3],
}

/// One compiled body pipeline, tagged with the variant it was built for.
pub struct BodyPipeline {
    pub variant: ShaderVariant,
    pub pipeline: wgpu::RenderPipeline,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl BodyPipeline {
    pub fn new(gpu: &Gpu, variant: ShaderVariant) -> Self {
        let source = compose_source(variant);
        let shader = gpu
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("body-shader"),
                source: wgpu::ShaderSource::Wgsl(source.into()),
            });

        let bind_group_layout =
            gpu.device
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("body-bgl"),
                    entries: &[
                        wgpu::BindGroupLayoutEntry {
                            binding: 0,
                            visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                            ty: wgpu::BindingType::Buffer {
                                ty: wgpu::BufferBindingType::Uniform,
                                has_dynamic_offset: false,
                                min_binding_size: std::num::NonZeroU64::new(
                                    std::mem::size_of::<BodyUniforms>() as u64,
                                ),
                            },
                            count: None,
                        },
                        wgpu::BindGroupLayoutEntry {
                            binding: 1,
                            visibility: wgpu::ShaderStages::FRAGMENT,
                            ty: wgpu::BindingType::Texture {
                                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                                view_dimension: wgpu::TextureViewDimension::D2,
                                multisampled: false,
                            },
                            count: None,
                        },
                        wgpu::BindGroupLayoutEntry {
                            binding: 2,
                            visibility: wgpu::ShaderStages::FRAGMENT,
                            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                            count: None,
                        },
                    ],
                });

        let pipeline_layout = gpu
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("body-pipeline-layout"),
                bind_group_layouts: &[&bind_group_layout],
                immediate_size: 0,
            });

        let pipeline = gpu
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("body-pipeline"),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_body"),
                    buffers: &[GridVertex::layout()],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                },
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleStrip,
                    strip_index_format: Some(wgpu::IndexFormat::Uint32),
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    ..Default::default()
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: DepthScheme::FORMAT,
                    depth_write_enabled: true,
                    depth_compare: DepthScheme::COMPARE_FUNCTION,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState::default(),
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some("fs_body"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: variant.target_format(),
                        blend: None,
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                }),
                multiview_mask: None,
                cache: None,
            });

        Self {
            variant,
            pipeline,
            bind_group_layout,
        }
    }
}
