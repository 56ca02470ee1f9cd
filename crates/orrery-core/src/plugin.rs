//! Plugin ABI: the trait plugins implement and the service bundle the host
//! wires in before calling `init`.
//!
//! Dynamically loaded plugins additionally export two C-linkage factory
//! symbols, `create()` and `destroy(ptr)`; see the plugin crates for the
//! exported functions themselves.

use std::rc::Rc;

use orrery_config::{ConfigError, Settings};
use orrery_render::TextureError;

use crate::graphics::GraphicsSettings;
use crate::input::InputManager;
use crate::scene::SceneGraph;
use crate::solar_system::SolarSystem;

/// Everything a plugin may talk to, handed over at `init`.
#[derive(Clone)]
pub struct HostServices {
    pub settings: Rc<Settings>,
    pub solar_system: Rc<SolarSystem>,
    pub input_manager: Rc<InputManager>,
    pub scene_graph: Rc<SceneGraph>,
    pub graphics: Rc<GraphicsSettings>,
}

/// Fatal plugin activation errors. The host aborts the plugin on any of
/// these; no partial state is left behind.
#[derive(Debug, thiserror::Error)]
pub enum PluginError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A configured body names an anchor the settings do not define.
    #[error("there is no anchor \"{0}\" defined in the settings")]
    MissingAnchor(String),

    /// An anchor's existence interval is inverted.
    #[error("anchor \"{anchor}\" has an invalid existence interval ({start} > {end})")]
    InvalidExistence {
        anchor: String,
        start: f64,
        end: f64,
    },

    /// A configured center name is missing from the radii table.
    #[error("no radii known for center \"{0}\"")]
    UnknownCenter(String),

    #[error(transparent)]
    Texture(#[from] TextureError),
}

/// The lifecycle every plugin implements.
///
/// The host calls `init` once after wiring the services and `de_init`
/// before unloading the library. `init` is transactional: on error the
/// plugin must leave no bodies, nodes, or subscriptions behind.
pub trait EnginePlugin {
    fn init(&mut self, host: HostServices) -> Result<(), PluginError>;
    fn de_init(&mut self);
}
