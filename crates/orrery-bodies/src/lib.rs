//! Textured-sphere celestial body rendering for the orrery host.
//!
//! Draws a configurable set of planets, moons, and small bodies as textured
//! spheres, lit by the Sun, with optional HDR illumination. Bodies are
//! driven by the host settings document: every entry under the plugin's
//! `bodies` block names an anchor and an equirectangular surface texture.
//! Despite the name, moons work just as well as planets.

mod body;
mod config;
mod mesh;
mod plugin;
mod shader;

pub use body::{SimpleBody, sun_surface_illuminance};
pub use config::{BodiesConfig, BodyConfig, PLUGIN_SETTINGS_KEY};
pub use mesh::{GRID_RESOLUTION_X, GRID_RESOLUTION_Y, GpuGrid, GridVertex, SphereGrid};
pub use plugin::{BodiesPlugin, create, destroy};
pub use shader::{BodyPipeline, BodyUniforms, ShaderVariant, compose_source};
