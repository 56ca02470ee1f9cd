//! Plugin lifecycle: settings-driven creation, reconfiguration, and
//! teardown of simple bodies, plus the C-linkage factory exports.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use orrery_core::{CelestialSurface, EnginePlugin, HostServices, NodeId, PluginError};
use orrery_utils::ConnectionId;

use crate::body::SimpleBody;
use crate::config::{BodiesConfig, PLUGIN_SETTINGS_KEY};
use crate::mesh::SphereGrid;

struct BodyEntry {
    body: Rc<RefCell<SimpleBody>>,
    node: NodeId,
}

/// Live plugin state behind the signal subscriptions. Bodies are keyed by
/// their anchor name from the settings document.
struct PluginState {
    host: HostServices,
    config: BodiesConfig,
    grid: Rc<SphereGrid>,
    bodies: BTreeMap<String, BodyEntry>,
}

/// The simple-bodies plugin: renders configured celestial objects as
/// textured spheres and keeps them in sync with the host settings.
///
/// `init` reads the `"csp-simple-bodies"` block, creates one [`SimpleBody`] per
/// configured anchor, and registers each with the solar system, the input
/// manager, and the scene graph. Settings reloads reconcile the live set
/// against the new block; saves write the block back. `de_init` tears all
/// of it down again.
#[derive(Default)]
pub struct BodiesPlugin {
    state: Option<Rc<RefCell<PluginState>>>,
    on_load_connection: Option<ConnectionId>,
    on_save_connection: Option<ConnectionId>,
}

impl BodiesPlugin {
    pub fn new() -> Self {
        Self::default()
    }

    /// The live body for an anchor name, if one is active.
    pub fn body(&self, anchor_name: &str) -> Option<Rc<RefCell<SimpleBody>>> {
        let state = self.state.as_ref()?;
        let state = state.borrow();
        state.bodies.get(anchor_name).map(|entry| entry.body.clone())
    }

    pub fn body_count(&self) -> usize {
        self.state
            .as_ref()
            .map_or(0, |state| state.borrow().bodies.len())
    }

    fn disconnect(&mut self, host: &HostServices) {
        if let Some(id) = self.on_load_connection.take() {
            host.settings.on_load.disconnect(id);
        }
        if let Some(id) = self.on_save_connection.take() {
            host.settings.on_save.disconnect(id);
        }
    }
}

impl EnginePlugin for BodiesPlugin {
    fn init(&mut self, host: HostServices) -> Result<(), PluginError> {
        tracing::info!("Loading plugin...");

        let state = Rc::new(RefCell::new(PluginState {
            host: host.clone(),
            config: BodiesConfig::default(),
            grid: Rc::new(SphereGrid::new()),
            bodies: BTreeMap::new(),
        }));

        let weak = Rc::downgrade(&state);
        self.on_load_connection = Some(host.settings.on_load.connect(move |_| {
            if let Some(state) = weak.upgrade()
                && let Err(err) = reconcile(&state)
            {
                tracing::error!("Failed to reload body settings: {err}");
            }
        }));
        let weak = Rc::downgrade(&state);
        self.on_save_connection = Some(host.settings.on_save.connect(move |_| {
            if let Some(state) = weak.upgrade() {
                write_back(&state);
            }
        }));

        if let Err(err) = reconcile(&state) {
            dispose_all(&state);
            self.disconnect(&host);
            return Err(err);
        }

        self.state = Some(state);
        tracing::info!("Loading done.");
        Ok(())
    }

    fn de_init(&mut self) {
        let Some(state) = self.state.take() else {
            return;
        };
        tracing::info!("Unloading plugin...");

        let host = state.borrow().host.clone();
        dispose_all(&state);
        self.disconnect(&host);

        tracing::info!("Unloading done.");
    }
}

/// Bring the live body set in line with the current settings document.
///
/// Runs in three phases so reloads never recreate bodies that merely
/// changed configuration: surviving bodies are updated in place, departed
/// ones are disposed, and only genuinely new names get fresh bodies.
///
/// Every fallible step (anchor lookups, texture decodes, new-body
/// construction) runs before any live body is mutated or registered, so a
/// failing reload leaves the previous body set fully intact.
fn reconcile(state: &Rc<RefCell<PluginState>>) -> Result<(), PluginError> {
    let new_config: BodiesConfig = state
        .borrow()
        .host
        .settings
        .parse_plugin_block(PLUGIN_SETTINGS_KEY)?;

    let mut state = state.borrow_mut();
    let state = &mut *state;

    // validate the whole snapshot: anchors, staged texture decodes for
    // surviving bodies, and construction of genuinely new ones
    let mut anchors = BTreeMap::new();
    let mut staged_textures = BTreeMap::new();
    let mut created = Vec::new();
    for (name, body_config) in &new_config.bodies {
        let anchor = lookup_anchor(&state.host, name)?;
        match state.bodies.get(name) {
            // a different celestial object under the same name counts as
            // new; the old body is disposed below
            Some(entry) if entry.body.borrow().center_name() == anchor.center => {
                if let Some(staged) = entry.body.borrow().stage_texture(&body_config.texture)? {
                    staged_textures.insert(name.clone(), staged);
                }
            }
            _ => {
                let body = SimpleBody::new(
                    state.host.graphics.clone(),
                    state.host.solar_system.clone(),
                    state.grid.clone(),
                    &body_config.texture,
                    &anchor.center,
                    &anchor.frame,
                    anchor.start_existence,
                    anchor.end_existence,
                )?;
                created.push((name.clone(), Rc::new(RefCell::new(body))));
            }
        }
        anchors.insert(name.clone(), anchor);
    }

    // nothing below can fail; update bodies that survive, mark the rest
    let mut removed = Vec::new();
    for (name, entry) in &state.bodies {
        let Some(anchor) = anchors.get(name) else {
            removed.push(name.clone());
            continue;
        };
        let mut body = entry.body.borrow_mut();
        if body.center_name() != anchor.center {
            drop(body);
            removed.push(name.clone());
            continue;
        }
        if let Some(staged) = staged_textures.remove(name) {
            body.configure(staged);
        }
        body.set_anchor_data(&anchor.frame, anchor.start_existence, anchor.end_existence);
    }

    for name in removed {
        if let Some(entry) = state.bodies.remove(&name) {
            dispose_entry(&state.host, entry);
        }
    }

    for (name, body) in created {
        state.host.solar_system.register_body(body.clone());
        state.host.input_manager.register_selectable(body.clone());
        let node = state.host.scene_graph.attach(&name, body.clone());

        state.bodies.insert(name, BodyEntry { body, node });
    }

    state.config = new_config;
    Ok(())
}

fn lookup_anchor(
    host: &HostServices,
    name: &str,
) -> Result<orrery_config::Anchor, PluginError> {
    let anchor = host
        .settings
        .anchor(name)
        .ok_or_else(|| PluginError::MissingAnchor(name.to_string()))?;
    if !anchor.has_valid_existence() {
        return Err(PluginError::InvalidExistence {
            anchor: name.to_string(),
            start: anchor.start_existence,
            end: anchor.end_existence,
        });
    }
    Ok(anchor)
}

/// Write the active configuration back into the settings document so a
/// subsequent save persists it.
fn write_back(state: &Rc<RefCell<PluginState>>) {
    let state = state.borrow();
    match serde_json::to_value(&state.config) {
        Ok(block) => state.host.settings.set_plugin_block(PLUGIN_SETTINGS_KEY, block),
        Err(err) => tracing::error!("Failed to serialize body settings: {err}"),
    }
}

fn dispose_all(state: &Rc<RefCell<PluginState>>) {
    let mut state = state.borrow_mut();
    let state = &mut *state;
    while let Some((_, entry)) = state.bodies.pop_first() {
        dispose_entry(&state.host, entry);
    }
}

/// Scene-graph node goes first so no draw can observe a half-removed body.
fn dispose_entry(host: &HostServices, entry: BodyEntry) {
    host.scene_graph.detach(entry.node);
    let surface: Rc<RefCell<dyn CelestialSurface>> = entry.body.clone();
    host.solar_system.unregister_body(&surface);
    host.input_manager.unregister_selectable(&surface);
}

/// Host-side factory symbol for dynamic loading.
#[unsafe(no_mangle)]
pub extern "C" fn create() -> *mut BodiesPlugin {
    Box::into_raw(Box::new(BodiesPlugin::new()))
}

/// Counterpart of [`create`]. The pointer must have come from `create` and
/// must not be used afterwards.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn destroy(plugin: *mut BodiesPlugin) {
    if plugin.is_null() {
        return;
    }
    drop(unsafe { Box::from_raw(plugin) });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::{Path, PathBuf};

    use orrery_config::Settings;
    use orrery_core::{GraphicsSettings, InputManager, SceneGraph, SolarSystem};

    fn write_test_png(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        image::RgbaImage::from_pixel(4, 2, image::Rgba([30, 60, 90, 255]))
            .save(&path)
            .unwrap();
        path
    }

    struct Fixture {
        dir: tempfile::TempDir,
        host: HostServices,
    }

    fn fixture() -> Fixture {
        Fixture {
            dir: tempfile::tempdir().unwrap(),
            host: HostServices {
                settings: Settings::new(),
                solar_system: SolarSystem::new(),
                input_manager: InputManager::new(),
                scene_graph: SceneGraph::new(),
                graphics: GraphicsSettings::new(),
            },
        }
    }

    /// A settings document with one anchor and one configured body per
    /// `(name, center, frame)` entry, all sharing `texture`.
    fn settings_document(entries: &[(&str, &str, &str)], texture: &Path) -> String {
        let mut anchors = serde_json::Map::new();
        let mut bodies = serde_json::Map::new();
        for (name, center, frame) in entries {
            anchors.insert(
                name.to_string(),
                serde_json::json!({
                    "center": center,
                    "frame": frame,
                    "startExistence": -1.0e9,
                    "endExistence": 1.0e9,
                }),
            );
            bodies.insert(
                name.to_string(),
                serde_json::json!({ "texture": texture.to_str().unwrap() }),
            );
        }
        serde_json::json!({
            "anchors": anchors,
            "plugins": { PLUGIN_SETTINGS_KEY: { "bodies": bodies } },
        })
        .to_string()
    }

    #[test]
    fn test_init_registers_bodies_everywhere() {
        let fx = fixture();
        let texture = write_test_png(fx.dir.path(), "earth.png");
        let document = settings_document(
            &[("Earth", "Earth", "IAU_EARTH"), ("Moon", "Moon", "IAU_MOON")],
            &texture,
        );
        fx.host.settings.load_from_str(&document).unwrap();

        let mut plugin = BodiesPlugin::new();
        plugin.init(fx.host.clone()).unwrap();

        assert_eq!(plugin.body_count(), 2);
        assert_eq!(fx.host.solar_system.body_count(), 2);
        assert_eq!(fx.host.input_manager.selectable_count(), 2);
        assert_eq!(fx.host.scene_graph.node_count(), 2);

        let earth = plugin.body("Earth").unwrap();
        assert_eq!(earth.borrow().center_name(), "Earth");
        assert_eq!(earth.borrow().frame_name(), "IAU_EARTH");
        assert!(fx.host.solar_system.body_by_center("Moon").is_some());
    }

    #[test]
    fn test_reload_updates_surviving_bodies_in_place() {
        let fx = fixture();
        let texture = write_test_png(fx.dir.path(), "earth.png");
        let document = settings_document(&[("Earth", "Earth", "IAU_EARTH")], &texture);
        fx.host.settings.load_from_str(&document).unwrap();

        let mut plugin = BodiesPlugin::new();
        plugin.init(fx.host.clone()).unwrap();
        let before = plugin.body("Earth").unwrap();
        assert_eq!(before.borrow().texture_generation(), 0);

        let new_texture = write_test_png(fx.dir.path(), "earth_8k.png");
        let document = settings_document(&[("Earth", "Earth", "IAU_EARTH")], &new_texture);
        fx.host.settings.load_from_str(&document).unwrap();

        let after = plugin.body("Earth").unwrap();
        assert!(Rc::ptr_eq(&before, &after), "same body instance survives");
        assert_eq!(after.borrow().texture_generation(), 1);
        assert_eq!(after.borrow().texture_path(), new_texture);
        assert_eq!(fx.host.scene_graph.node_count(), 1);
    }

    #[test]
    fn test_reload_swaps_departed_bodies_for_new_ones() {
        let fx = fixture();
        let texture = write_test_png(fx.dir.path(), "surface.png");
        fx.host
            .settings
            .load_from_str(&settings_document(&[("Earth", "Earth", "IAU_EARTH")], &texture))
            .unwrap();

        let mut plugin = BodiesPlugin::new();
        plugin.init(fx.host.clone()).unwrap();
        let earth: Rc<RefCell<dyn CelestialSurface>> = plugin.body("Earth").unwrap();

        fx.host
            .settings
            .load_from_str(&settings_document(&[("Moon", "Moon", "IAU_MOON")], &texture))
            .unwrap();

        assert!(plugin.body("Earth").is_none());
        assert!(plugin.body("Moon").is_some());
        assert!(!fx.host.solar_system.is_body_registered(&earth));
        assert!(!fx.host.input_manager.is_selectable_registered(&earth));
        assert_eq!(fx.host.scene_graph.node_count(), 1);
        assert_eq!(fx.host.solar_system.body_count(), 1);
    }

    #[test]
    fn test_reload_is_a_fixpoint() {
        let fx = fixture();
        let texture = write_test_png(fx.dir.path(), "surface.png");
        let document = settings_document(&[("Earth", "Earth", "IAU_EARTH")], &texture);
        fx.host.settings.load_from_str(&document).unwrap();

        let mut plugin = BodiesPlugin::new();
        plugin.init(fx.host.clone()).unwrap();
        let before = plugin.body("Earth").unwrap();

        fx.host.settings.load_from_str(&document).unwrap();

        let after = plugin.body("Earth").unwrap();
        assert!(Rc::ptr_eq(&before, &after));
        assert_eq!(after.borrow().texture_generation(), 0, "texture not reloaded");
        assert_eq!(fx.host.scene_graph.node_count(), 1);
    }

    #[test]
    fn test_missing_anchor_fails_init_without_partial_state() {
        let fx = fixture();
        let texture = write_test_png(fx.dir.path(), "surface.png");
        // configured body "Phobos" has no anchor entry
        let document = serde_json::json!({
            "anchors": {
                "Earth": {
                    "center": "Earth", "frame": "IAU_EARTH",
                    "startExistence": 0.0, "endExistence": 1.0,
                },
            },
            "plugins": { PLUGIN_SETTINGS_KEY: { "bodies": {
                "Earth": { "texture": texture.to_str().unwrap() },
                "Phobos": { "texture": texture.to_str().unwrap() },
            } } },
        })
        .to_string();
        fx.host.settings.load_from_str(&document).unwrap();

        let mut plugin = BodiesPlugin::new();
        let err = plugin.init(fx.host.clone()).unwrap_err();
        assert!(matches!(err, PluginError::MissingAnchor(ref name) if name == "Phobos"));

        assert_eq!(plugin.body_count(), 0);
        assert_eq!(fx.host.solar_system.body_count(), 0);
        assert_eq!(fx.host.input_manager.selectable_count(), 0);
        assert_eq!(fx.host.scene_graph.node_count(), 0);
        assert_eq!(fx.host.settings.on_load.connection_count(), 0);
    }

    #[test]
    fn test_inverted_existence_is_rejected() {
        let fx = fixture();
        let texture = write_test_png(fx.dir.path(), "surface.png");
        let document = serde_json::json!({
            "anchors": {
                "Earth": {
                    "center": "Earth", "frame": "IAU_EARTH",
                    "startExistence": 100.0, "endExistence": 0.0,
                },
            },
            "plugins": { PLUGIN_SETTINGS_KEY: { "bodies": {
                "Earth": { "texture": texture.to_str().unwrap() },
            } } },
        })
        .to_string();
        fx.host.settings.load_from_str(&document).unwrap();

        let mut plugin = BodiesPlugin::new();
        let err = plugin.init(fx.host.clone()).unwrap_err();
        assert!(matches!(err, PluginError::InvalidExistence { .. }));
        assert_eq!(fx.host.solar_system.body_count(), 0);
    }

    #[test]
    fn test_failed_reload_keeps_the_previous_bodies() {
        let fx = fixture();
        let texture = write_test_png(fx.dir.path(), "surface.png");
        fx.host
            .settings
            .load_from_str(&settings_document(&[("Earth", "Earth", "IAU_EARTH")], &texture))
            .unwrap();

        let mut plugin = BodiesPlugin::new();
        plugin.init(fx.host.clone()).unwrap();

        // reload to a document without our plugin block; logged, not fatal
        fx.host
            .settings
            .load_from_str(r#"{ "anchors": {}, "plugins": {} }"#)
            .unwrap();

        assert_eq!(plugin.body_count(), 1);
        assert!(plugin.body("Earth").is_some());
        assert_eq!(fx.host.scene_graph.node_count(), 1);
    }

    #[test]
    fn test_failed_reload_mutates_no_surviving_body() {
        let fx = fixture();
        let texture = write_test_png(fx.dir.path(), "surface.png");
        fx.host
            .settings
            .load_from_str(&settings_document(
                &[("Earth", "Earth", "IAU_EARTH"), ("Moon", "Moon", "IAU_MOON")],
                &texture,
            ))
            .unwrap();

        let mut plugin = BodiesPlugin::new();
        plugin.init(fx.host.clone()).unwrap();
        let earth = plugin.body("Earth").unwrap();

        // this reload retextures Earth but drops Moon's anchor entry, so it
        // must fail as a whole; Earth keeps its old texture
        let new_texture = write_test_png(fx.dir.path(), "earth_8k.png");
        let document = serde_json::json!({
            "anchors": {
                "Earth": {
                    "center": "Earth", "frame": "IAU_EARTH",
                    "startExistence": -1.0e9, "endExistence": 1.0e9,
                },
            },
            "plugins": { PLUGIN_SETTINGS_KEY: { "bodies": {
                "Earth": { "texture": new_texture.to_str().unwrap() },
                "Moon": { "texture": texture.to_str().unwrap() },
            } } },
        })
        .to_string();
        fx.host.settings.load_from_str(&document).unwrap();

        assert_eq!(plugin.body_count(), 2);
        assert_eq!(earth.borrow().texture_generation(), 0);
        assert_eq!(earth.borrow().texture_path(), texture);
        assert!(plugin.body("Moon").is_some());
        assert_eq!(fx.host.scene_graph.node_count(), 2);
    }

    #[test]
    fn test_de_init_clears_everything() {
        let fx = fixture();
        let texture = write_test_png(fx.dir.path(), "surface.png");
        fx.host
            .settings
            .load_from_str(&settings_document(
                &[("Earth", "Earth", "IAU_EARTH"), ("Mars", "Mars", "IAU_MARS")],
                &texture,
            ))
            .unwrap();

        let mut plugin = BodiesPlugin::new();
        plugin.init(fx.host.clone()).unwrap();
        assert_eq!(plugin.body_count(), 2);

        plugin.de_init();

        assert_eq!(plugin.body_count(), 0);
        assert_eq!(fx.host.solar_system.body_count(), 0);
        assert_eq!(fx.host.input_manager.selectable_count(), 0);
        assert_eq!(fx.host.scene_graph.node_count(), 0);
        assert_eq!(fx.host.settings.on_load.connection_count(), 0);
        assert_eq!(fx.host.settings.on_save.connection_count(), 0);

        // a second de_init is a no-op
        plugin.de_init();
    }

    #[test]
    fn test_save_writes_the_block_back() {
        let fx = fixture();
        let texture = write_test_png(fx.dir.path(), "surface.png");
        fx.host
            .settings
            .load_from_str(&settings_document(&[("Earth", "Earth", "IAU_EARTH")], &texture))
            .unwrap();

        let mut plugin = BodiesPlugin::new();
        plugin.init(fx.host.clone()).unwrap();

        // clobber the block, then save; the plugin restores it
        fx.host
            .settings
            .set_plugin_block(PLUGIN_SETTINGS_KEY, serde_json::json!({}));
        let path = fx.dir.path().join("settings.json");
        fx.host.settings.save_to_file(&path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        let document: serde_json::Value = serde_json::from_str(&written).unwrap();
        let block = &document["plugins"][PLUGIN_SETTINGS_KEY];
        assert_eq!(
            block["bodies"]["Earth"]["texture"],
            serde_json::json!(texture.to_str().unwrap())
        );
    }

    #[test]
    fn test_create_and_destroy_round_trip() {
        let plugin = create();
        assert!(!plugin.is_null());
        unsafe { destroy(plugin) };
        unsafe { destroy(std::ptr::null_mut()) };
    }
}
