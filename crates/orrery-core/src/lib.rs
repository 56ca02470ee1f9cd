//! Scene-integration services for the orrery host.
//!
//! Everything a render extension plugs into: the celestial anchor model and
//! the two capability traits bodies implement, the solar-system bookkeeping,
//! the selectable registry used for ray picking, the scene graph of draw
//! nodes, the observable graphics toggles, and the plugin ABI.

pub mod celestial;
pub mod graphics;
pub mod input;
pub mod plugin;
pub mod scene;
pub mod solar_system;

pub use celestial::{CelestialAnchor, CelestialSurface, Drawable, Ray};
pub use graphics::GraphicsSettings;
pub use input::{InputManager, Pick};
pub use plugin::{EnginePlugin, HostServices, PluginError};
pub use scene::{NodeId, SceneGraph};
pub use solar_system::{SUN_CENTER_NAME, SolarSystem};
