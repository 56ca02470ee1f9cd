//! Observable rendering toggles shared between the host and its plugins.

use std::rc::Rc;

use orrery_utils::Property;

/// Host-wide graphics switches.
///
/// Bodies subscribe to the lighting and HDR properties and rebuild their
/// shader variant when either flips.
pub struct GraphicsSettings {
    /// Physically-motivated lighting on or off.
    pub enable_lighting: Property<bool>,
    /// High-dynamic-range illumination on or off.
    pub enable_hdr: Property<bool>,
    /// Ambient floor multiplier applied to unlit parts of a surface.
    pub ambient_brightness: Property<f32>,
}

impl GraphicsSettings {
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            enable_lighting: Property::new(false),
            enable_hdr: Property::new(false),
            ambient_brightness: Property::new(0.2),
        })
    }
}
