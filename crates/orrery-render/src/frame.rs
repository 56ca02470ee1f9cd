//! Per-frame camera state shared with every draw node.

use glam::Mat4;

/// Camera and timing state for the frame being rendered.
///
/// The host updates one instance per frame before walking the scene graph.
/// The matrices are the camera-relative modelview and the projection in
/// single precision; a body folds its own double-precision world transform
/// into the modelview at the last moment. `far_clip` normalises the
/// linear-distance depth the body shaders write, so enormous scenes keep a
/// usable depth ordering far beyond the projection far plane.
#[derive(Debug, Clone)]
pub struct FrameState {
    /// Camera-relative modelview matrix.
    pub mat_model_view: Mat4,
    /// Projection matrix.
    pub mat_projection: Mat4,
    /// Reciprocal-depth normaliser, in scene units.
    pub far_clip: f32,
    /// Current simulation epoch, seconds past J2000.
    pub sim_time: f64,
}

impl FrameState {
    pub fn new() -> Self {
        Self {
            mat_model_view: Mat4::IDENTITY,
            mat_projection: Mat4::IDENTITY,
            far_clip: 1.0e12,
            sim_time: 0.0,
        }
    }
}

impl Default for FrameState {
    fn default() -> Self {
        Self::new()
    }
}
