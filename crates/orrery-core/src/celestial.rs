//! Celestial anchors and the capability traits bodies implement.

use glam::{DMat4, DVec2, DVec3};
use orrery_render::{FrameState, Gpu};

/// A picking ray in world coordinates. World units may be enormous (tens of
/// billions of metres), so everything stays in double precision.
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    pub origin: DVec3,
    pub direction: DVec3,
}

impl Ray {
    pub fn new(origin: DVec3, direction: DVec3) -> Self {
        Self { origin, direction }
    }
}

/// A named celestial object with a pose in the world.
///
/// Carries the center and frame names, the half-open existence interval
/// `[start, end)` in seconds past J2000, and the double-precision world
/// transform the host updates as simulation time advances.
#[derive(Debug, Clone)]
pub struct CelestialAnchor {
    center_name: String,
    frame_name: String,
    start_existence: f64,
    end_existence: f64,
    world_transform: DMat4,
}

impl CelestialAnchor {
    pub fn new(
        center_name: impl Into<String>,
        frame_name: impl Into<String>,
        start_existence: f64,
        end_existence: f64,
    ) -> Self {
        Self {
            center_name: center_name.into(),
            frame_name: frame_name.into(),
            start_existence,
            end_existence,
            world_transform: DMat4::IDENTITY,
        }
    }

    pub fn center_name(&self) -> &str {
        &self.center_name
    }

    pub fn frame_name(&self) -> &str {
        &self.frame_name
    }

    pub fn set_frame_name(&mut self, frame_name: impl Into<String>) {
        self.frame_name = frame_name.into();
    }

    /// The `(start, end)` existence pair, seconds past J2000.
    pub fn existence(&self) -> (f64, f64) {
        (self.start_existence, self.end_existence)
    }

    pub fn set_existence(&mut self, start: f64, end: f64) {
        self.start_existence = start;
        self.end_existence = end;
    }

    /// Whether `time` lies within the half-open existence interval.
    pub fn is_in_existence(&self, time: f64) -> bool {
        self.start_existence <= time && time < self.end_existence
    }

    pub fn world_transform(&self) -> DMat4 {
        self.world_transform
    }

    pub fn set_world_transform(&mut self, transform: DMat4) {
        self.world_transform = transform;
    }

    /// World-space position, i.e. the transform's translation column.
    pub fn position(&self) -> DVec3 {
        self.world_transform.w_axis.truncate()
    }
}

/// Something the scene graph can render.
///
/// `draw` runs once per frame on the render-loop thread. It reports `false`
/// when nothing was drawn; the scene graph tolerates that silently so one
/// broken node cannot poison the frame.
pub trait Drawable {
    fn draw(&mut self, gpu: &Gpu, frame: &FrameState, pass: &mut wgpu::RenderPass<'_>) -> bool;

    /// Axis-aligned bounds in body-local coordinates, if the node has any.
    fn bounding_box(&self) -> Option<(DVec3, DVec3)>;
}

/// A celestial object that can be registered with the solar-system
/// bookkeeping and picked with a ray.
pub trait CelestialSurface {
    fn center_name(&self) -> &str;

    /// Double-precision world transform of the body.
    fn world_transform(&self) -> DMat4;

    /// Intersect a world-space ray with the surface. The hit, if any, is
    /// reported in body-local coordinates.
    fn intersect(&self, ray: &Ray) -> Option<DVec3>;

    /// Surface height above the reference ellipsoid at a longitude/latitude.
    fn height(&self, lng_lat: DVec2) -> f64;

    /// Triaxial radii in metres.
    fn radii(&self) -> DVec3;

    /// The `(start, end)` existence pair, seconds past J2000.
    fn existence(&self) -> (f64, f64);
}
