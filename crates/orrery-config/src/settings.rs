//! The settings document and its load/save service.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::Path;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use orrery_utils::Signal;

use crate::anchor::Anchor;
use crate::error::ConfigError;

/// On-disk shape of the settings document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
struct Document {
    /// All celestial anchors the host knows about, by name.
    anchors: BTreeMap<String, Anchor>,
    /// One opaque JSON block per plugin, by plugin key.
    plugins: BTreeMap<String, Value>,
}

/// The shared settings service.
///
/// Lives on the render-loop thread and is handed around as `Rc<Settings>`.
/// Loading a new document replaces the whole state and then emits
/// [`Settings::on_load`]; saving first emits [`Settings::on_save`] so every
/// plugin can write its block back, then persists the document.
pub struct Settings {
    doc: RefCell<Document>,
    /// Emitted after a document has been (re)loaded.
    pub on_load: Signal<()>,
    /// Emitted right before the document is written to disk.
    pub on_save: Signal<()>,
}

impl Settings {
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            doc: RefCell::new(Document::default()),
            on_load: Signal::new(),
            on_save: Signal::new(),
        })
    }

    /// Replace the document with the contents of a JSON file and emit
    /// `on_load`.
    pub fn load_from_file(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        self.load_from_str(&contents)?;
        tracing::info!("Loaded settings from {}", path.display());
        Ok(())
    }

    /// Replace the document with parsed JSON text and emit `on_load`.
    pub fn load_from_str(&self, json: &str) -> Result<(), ConfigError> {
        let doc: Document = serde_json::from_str(json).map_err(ConfigError::ParseError)?;
        *self.doc.borrow_mut() = doc;
        self.on_load.emit(&());
        Ok(())
    }

    /// Emit `on_save` (plugins write their blocks back) and persist the
    /// document as pretty JSON.
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        self.on_save.emit(&());
        let serialized =
            serde_json::to_string_pretty(&*self.doc.borrow()).map_err(ConfigError::SerializeError)?;
        std::fs::write(path, serialized).map_err(ConfigError::WriteError)?;
        tracing::info!("Saved settings to {}", path.display());
        Ok(())
    }

    /// Look up an anchor by name.
    pub fn anchor(&self, name: &str) -> Option<Anchor> {
        self.doc.borrow().anchors.get(name).cloned()
    }

    /// Insert or replace an anchor. Mainly used by the host during startup.
    pub fn set_anchor(&self, name: &str, anchor: Anchor) {
        self.doc.borrow_mut().anchors.insert(name.to_string(), anchor);
    }

    /// The raw JSON block for one plugin, if present.
    pub fn plugin_block(&self, key: &str) -> Option<Value> {
        self.doc.borrow().plugins.get(key).cloned()
    }

    /// Deserialize one plugin's block into its typed settings structure.
    pub fn parse_plugin_block<T: serde::de::DeserializeOwned>(
        &self,
        key: &str,
    ) -> Result<T, ConfigError> {
        let block = self
            .plugin_block(key)
            .ok_or_else(|| ConfigError::MissingPluginBlock(key.to_string()))?;
        serde_json::from_value(block).map_err(|source| ConfigError::InvalidPluginBlock {
            plugin: key.to_string(),
            source,
        })
    }

    /// Store one plugin's block, replacing any previous content.
    pub fn set_plugin_block(&self, key: &str, block: Value) {
        self.doc.borrow_mut().plugins.insert(key.to_string(), block);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    const DOC: &str = r#"{
        "anchors": {
            "Earth": {
                "center": "Earth",
                "frame": "IAU_EARTH",
                "startExistence": 0.0,
                "endExistence": 100.0
            }
        },
        "plugins": {
            "csp-simple-bodies": {
                "bodies": { "Earth": { "texture": "textures/earth.jpg" } }
            }
        }
    }"#;

    #[test]
    fn test_load_emits_on_load() {
        let settings = Settings::new();
        let loaded = Rc::new(Cell::new(0));
        let loaded2 = loaded.clone();
        settings.on_load.connect(move |_| loaded2.set(loaded2.get() + 1));

        settings.load_from_str(DOC).unwrap();
        assert_eq!(loaded.get(), 1);
        assert_eq!(settings.anchor("Earth").unwrap().frame, "IAU_EARTH");
    }

    #[test]
    fn test_handler_can_read_document_during_on_load() {
        let settings = Settings::new();
        let seen = Rc::new(Cell::new(false));
        let seen2 = seen.clone();
        let settings2 = settings.clone();
        settings.on_load.connect(move |_| {
            seen2.set(settings2.anchor("Earth").is_some());
        });

        settings.load_from_str(DOC).unwrap();
        assert!(seen.get());
    }

    #[test]
    fn test_plugin_block_lookup() {
        let settings = Settings::new();
        settings.load_from_str(DOC).unwrap();

        let block = settings.plugin_block("csp-simple-bodies").unwrap();
        assert!(block.get("bodies").is_some());
        assert!(settings.plugin_block("no-such-plugin").is_none());
    }

    #[test]
    fn test_parse_missing_block_is_an_error() {
        let settings = Settings::new();
        settings.load_from_str("{}").unwrap();

        let err = settings
            .parse_plugin_block::<Value>("csp-simple-bodies")
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingPluginBlock(_)));
    }

    #[test]
    fn test_save_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let settings = Settings::new();
        settings.load_from_str(DOC).unwrap();
        settings.save_to_file(&path).unwrap();

        let reread = Settings::new();
        reread.load_from_file(&path).unwrap();
        assert_eq!(reread.anchor("Earth"), settings.anchor("Earth"));
        assert_eq!(
            reread.plugin_block("csp-simple-bodies"),
            settings.plugin_block("csp-simple-bodies")
        );
    }

    #[test]
    fn test_save_emits_on_save_before_writing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let settings = Settings::new();
        settings.load_from_str("{}").unwrap();
        let settings2 = settings.clone();
        settings.on_save.connect(move |_| {
            settings2.set_plugin_block("late-block", serde_json::json!({"x": 1}));
        });

        settings.save_to_file(&path).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("late-block"), "on_save handlers must run first");
    }
}
