//! Parametric sphere grid shared by every body of one plugin load.
//!
//! The mesh is only a latitude/longitude grid of `(u, v)` coordinates in
//! `[0,1]²`; the vertex shader expands each grid point onto the ellipsoid
//! given by the radii uniform. One triangle strip per grid column, stitched
//! together with repeated seed indices (degenerate triangles).

use std::cell::OnceCell;

use bytemuck::{Pod, Zeroable};

use orrery_render::Gpu;

/// Grid columns (longitude samples).
pub const GRID_RESOLUTION_X: u32 = 200;
/// Grid rows (latitude samples).
pub const GRID_RESOLUTION_Y: u32 = 100;

/// One grid vertex: a `(u, v)` coordinate, nothing else.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct GridVertex {
    pub grid_pos: [f32; 2],
}

impl GridVertex {
    /// Vertex buffer layout: one `vec2<f32>` at shader location 0.
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<GridVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x2,
            }],
        }
    }
}

/// GPU buffers for the sphere grid.
pub struct GpuGrid {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
}

/// The shared sphere grid: deterministic CPU arrays plus a lazily uploaded
/// GPU copy. Immutable after construction.
pub struct SphereGrid {
    vertices: Vec<GridVertex>,
    indices: Vec<u32>,
    gpu: OnceCell<GpuGrid>,
}

impl SphereGrid {
    pub fn new() -> Self {
        let nx = GRID_RESOLUTION_X;
        let ny = GRID_RESOLUTION_Y;

        // column-major: index = x * ny + y
        let mut vertices = Vec::with_capacity((nx * ny) as usize);
        for x in 0..nx {
            for y in 0..ny {
                vertices.push(GridVertex {
                    grid_pos: [
                        x as f32 / (nx - 1) as f32,
                        y as f32 / (ny - 1) as f32,
                    ],
                });
            }
        }

        let mut indices = Vec::with_capacity(((nx - 1) * (2 + 2 * ny)) as usize);
        for x in 0..nx - 1 {
            // leading seed index stitches this strip to the previous one
            indices.push(x * ny);
            for y in 0..ny {
                indices.push(x * ny + y);
                indices.push((x + 1) * ny + y);
            }
            // trailing seed: repeat the last index of the strip
            indices.push((x + 1) * ny + (ny - 1));
        }

        Self {
            vertices,
            indices,
            gpu: OnceCell::new(),
        }
    }

    pub fn vertices(&self) -> &[GridVertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    /// The GPU buffers, uploading them on first use.
    pub fn gpu(&self, gpu: &Gpu) -> &GpuGrid {
        self.gpu.get_or_init(|| {
            use wgpu::util::DeviceExt;

            let vertex_buffer = gpu
                .device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("sphere-grid-vertices"),
                    contents: bytemuck::cast_slice(&self.vertices),
                    usage: wgpu::BufferUsages::VERTEX,
                });
            let index_buffer = gpu
                .device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("sphere-grid-indices"),
                    contents: bytemuck::cast_slice(&self.indices),
                    usage: wgpu::BufferUsages::INDEX,
                });

            GpuGrid {
                vertex_buffer,
                index_buffer,
                index_count: self.indices.len() as u32,
            }
        })
    }
}

impl Default for SphereGrid {
    fn default() -> Self {
        Self::new()
    }
}
