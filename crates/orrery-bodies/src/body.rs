//! One renderable celestial body: a textured sphere with a pose, an
//! existence interval, and a raypickable surface.

use std::cell::{Cell, RefCell};
use std::path::Path;
use std::rc::{Rc, Weak};

use glam::{DMat4, DVec2, DVec3, Vec3};

use orrery_core::{
    CelestialAnchor, CelestialSurface, Drawable, GraphicsSettings, PluginError, Ray,
    SUN_CENTER_NAME, SolarSystem,
};
use orrery_render::{FrameState, Gpu, SurfaceTexture, TextureError};
use orrery_utils::ConnectionId;

use crate::mesh::SphereGrid;
use crate::shader::{BodyPipeline, BodyUniforms, ShaderVariant};

/// Illuminance on the Sun's own surface: total luminous power spread over
/// the Sun's sphere, projected into scene units via the observer scale.
pub fn sun_surface_illuminance(luminous_power: f64, observer_scale: f64, radius: f64) -> f64 {
    let scene_scale = 1.0 / observer_scale;
    luminous_power / (scene_scale * scene_scale * radius * radius * 4.0 * std::f64::consts::PI)
}

/// Lighting inputs for one body in one frame.
struct Illumination {
    sun_direction: Vec3,
    sun_illuminance: f32,
    ambient_brightness: f32,
}

/// A celestial body rendered as a textured sphere.
///
/// Owns its surface texture exclusively; shares the sphere grid with every
/// other body of the same plugin load. Registered with the solar-system
/// bookkeeping as a celestial surface and with the scene graph as a draw
/// node. Holds a weak back-reference to the Sun for lighting; when that
/// reference is stale, Sun-dependent lighting is skipped.
pub struct SimpleBody {
    anchor: CelestialAnchor,
    radii: DVec3,
    texture: SurfaceTexture,
    sun: Weak<RefCell<CelestialAnchor>>,
    visible: bool,

    graphics: Rc<GraphicsSettings>,
    solar_system: Rc<SolarSystem>,
    grid: Rc<SphereGrid>,

    // set by the property subscriptions below whenever lighting or HDR flips
    shader_dirty: Rc<Cell<bool>>,
    lighting_connection: ConnectionId,
    hdr_connection: ConnectionId,

    pipeline: Option<BodyPipeline>,
    uniform_buffer: Option<wgpu::Buffer>,
    bind_group: Option<wgpu::BindGroup>,
    bound_texture_generation: u64,
}

impl SimpleBody {
    /// Construct a body for `center_name`. Decodes the surface texture
    /// (blocking; runs during plugin load) and looks up the triaxial radii.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        graphics: Rc<GraphicsSettings>,
        solar_system: Rc<SolarSystem>,
        grid: Rc<SphereGrid>,
        texture_path: &str,
        center_name: &str,
        frame_name: &str,
        start_existence: f64,
        end_existence: f64,
    ) -> Result<Self, PluginError> {
        let radii = solar_system
            .radii_of(center_name)
            .ok_or_else(|| PluginError::UnknownCenter(center_name.to_string()))?;
        let texture = SurfaceTexture::from_file(texture_path)?;

        let shader_dirty = Rc::new(Cell::new(true));
        let dirty = shader_dirty.clone();
        let lighting_connection = graphics
            .enable_lighting
            .on_change()
            .connect(move |_| dirty.set(true));
        let dirty = shader_dirty.clone();
        let hdr_connection = graphics
            .enable_hdr
            .on_change()
            .connect(move |_| dirty.set(true));

        let sun = Rc::downgrade(&solar_system.sun());

        Ok(Self {
            anchor: CelestialAnchor::new(center_name, frame_name, start_existence, end_existence),
            radii,
            texture,
            sun,
            visible: true,
            graphics,
            solar_system,
            grid,
            shader_dirty,
            lighting_connection,
            hdr_connection,
            pipeline: None,
            uniform_buffer: None,
            bind_group: None,
            bound_texture_generation: 0,
        })
    }

    pub fn center_name(&self) -> &str {
        self.anchor.center_name()
    }

    pub fn frame_name(&self) -> &str {
        self.anchor.frame_name()
    }

    pub fn existence(&self) -> (f64, f64) {
        self.anchor.existence()
    }

    pub fn texture_path(&self) -> &Path {
        self.texture.path()
    }

    /// Generation counter of the surface texture; unchanged as long as the
    /// GPU copy is reused.
    pub fn texture_generation(&self) -> u64 {
        self.texture.generation()
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn set_world_transform(&mut self, transform: DMat4) {
        self.anchor.set_world_transform(transform);
    }

    /// Decode a replacement texture when `texture_path` differs from the
    /// current one; `None` when the path is unchanged, so settings reloads
    /// never reload GPU state needlessly. The result is applied separately
    /// via [`Self::configure`], which keeps a failing decode from touching
    /// the body at all.
    pub fn stage_texture(
        &self,
        texture_path: &str,
    ) -> Result<Option<SurfaceTexture>, TextureError> {
        if self.texture.path() == Path::new(texture_path) {
            return Ok(None);
        }
        SurfaceTexture::from_file(texture_path).map(Some)
    }

    /// Replace the surface texture with a staged decode.
    pub fn configure(&mut self, staged: SurfaceTexture) {
        self.texture.adopt(staged);
    }

    /// Apply updated anchor fields from a settings reload.
    pub fn set_anchor_data(&mut self, frame_name: &str, start_existence: f64, end_existence: f64) {
        self.anchor.set_frame_name(frame_name);
        self.anchor.set_existence(start_existence, end_existence);
    }

    /// Whether the next draw call will issue GPU work at `sim_time`.
    pub fn is_drawable_at(&self, sim_time: f64) -> bool {
        self.visible && self.anchor.is_in_existence(sim_time)
    }

    /// Whether the compiled pipeline no longer reflects the host's toggles.
    pub fn needs_shader_rebuild(&self) -> bool {
        let variant = ShaderVariant::current(&self.graphics);
        self.shader_dirty.get()
            || self
                .pipeline
                .as_ref()
                .is_none_or(|pipeline| pipeline.variant != variant)
    }

    fn illumination(&self, hdr: bool) -> Illumination {
        let mut sun_direction = Vec3::X;
        let mut sun_illuminance = 1.0_f32;
        let mut ambient_brightness = self.graphics.ambient_brightness.get();

        if self.anchor.center_name() == SUN_CENTER_NAME {
            if hdr {
                sun_illuminance = sun_surface_illuminance(
                    self.solar_system.sun_luminous_power.get(),
                    self.solar_system.observer_scale(),
                    self.radii.x,
                ) as f32;
            }
            ambient_brightness = 1.0;
        } else if self.sun.upgrade().is_some() {
            let position = self.anchor.position();
            if hdr {
                sun_illuminance = self.solar_system.sun_illuminance(position) as f32;
            }
            sun_direction = self.solar_system.sun_direction(position).as_vec3();
        }

        Illumination {
            sun_direction,
            sun_illuminance,
            ambient_brightness,
        }
    }
}

impl Drop for SimpleBody {
    fn drop(&mut self) {
        self.graphics
            .enable_lighting
            .on_change()
            .disconnect(self.lighting_connection);
        self.graphics
            .enable_hdr
            .on_change()
            .disconnect(self.hdr_connection);
    }
}

impl Drawable for SimpleBody {
    fn draw(&mut self, gpu: &Gpu, frame: &FrameState, pass: &mut wgpu::RenderPass<'_>) -> bool {
        if !self.is_drawable_at(frame.sim_time) {
            return true;
        }

        let _timing = tracing::trace_span!("Simple Planets").entered();

        let variant = ShaderVariant::current(&self.graphics);
        if self.needs_shader_rebuild() {
            self.pipeline = Some(BodyPipeline::new(gpu, variant));
            self.bind_group = None;
            self.shader_dirty.set(false);
        }

        let illumination = self.illumination(variant.hdr);
        let mat_model_view = frame.mat_model_view * self.anchor.world_transform().as_mat4();
        let uniforms = BodyUniforms {
            mat_model_view: mat_model_view.to_cols_array_2d(),
            mat_projection: frame.mat_projection.to_cols_array_2d(),
            radii: self.radii.as_vec3().to_array(),
            sun_illuminance: illumination.sun_illuminance,
            sun_direction: illumination.sun_direction.to_array(),
            ambient_brightness: illumination.ambient_brightness,
            far_clip: frame.far_clip,
            _padding: [0.0; 3],
        };

        let uniform_buffer = self.uniform_buffer.get_or_insert_with(|| {
            gpu.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("body-uniforms"),
                size: std::mem::size_of::<BodyUniforms>() as u64,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        });
        gpu.queue
            .write_buffer(uniform_buffer, 0, bytemuck::bytes_of(&uniforms));

        let texture_generation = self.texture.generation();
        if self.bind_group.is_none() || self.bound_texture_generation != texture_generation {
            let Some(pipeline) = self.pipeline.as_ref() else {
                return false;
            };
            let Some(uniform_buffer) = self.uniform_buffer.as_ref() else {
                return false;
            };
            let texture = self.texture.gpu(gpu);
            let bind_group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("body-bg"),
                layout: &pipeline.bind_group_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: uniform_buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(&texture.view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: wgpu::BindingResource::Sampler(&texture.sampler),
                    },
                ],
            });
            self.bind_group = Some(bind_group);
            self.bound_texture_generation = texture_generation;
        }

        let (Some(pipeline), Some(bind_group)) = (self.pipeline.as_ref(), self.bind_group.as_ref())
        else {
            return false;
        };
        let grid = self.grid.gpu(gpu);

        pass.set_pipeline(&pipeline.pipeline);
        pass.set_bind_group(0, bind_group, &[]);
        pass.set_vertex_buffer(0, grid.vertex_buffer.slice(..));
        pass.set_index_buffer(grid.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..grid.index_count, 0, 0..1);

        true
    }

    fn bounding_box(&self) -> Option<(DVec3, DVec3)> {
        None
    }
}

impl CelestialSurface for SimpleBody {
    fn center_name(&self) -> &str {
        self.anchor.center_name()
    }

    fn world_transform(&self) -> DMat4 {
        self.anchor.world_transform()
    }

    /// Sphere intersection with the equatorial radius. The rendered surface
    /// is the triaxial ellipsoid; picking approximates it as a sphere.
    fn intersect(&self, ray: &Ray) -> Option<DVec3> {
        let transform = self.anchor.world_transform().inverse();
        let origin = transform.transform_point3(ray.origin);
        let direction = transform.transform_vector3(ray.direction).normalize();

        let b = origin.dot(direction);
        let c = origin.dot(origin) - self.radii.x * self.radii.x;
        let det = b * b - c;

        if det < 0.0 {
            return None;
        }

        Some(origin + direction * (-b - det.sqrt()))
    }

    fn height(&self, _lng_lat: DVec2) -> f64 {
        0.0
    }

    fn radii(&self) -> DVec3 {
        self.radii
    }

    fn existence(&self) -> (f64, f64) {
        self.anchor.existence()
    }
}
