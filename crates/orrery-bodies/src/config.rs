//! Plugin settings codec.
//!
//! The plugin block in the host settings document maps anchor names to body
//! records. Unknown keys inside a record are tolerated on read and lost on
//! write-back.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Key of this plugin's block in the host settings document.
pub const PLUGIN_SETTINGS_KEY: &str = "csp-simple-bodies";

/// Settings for one body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyConfig {
    /// Path to the equirectangular surface texture, resolved against the
    /// host's working directory.
    pub texture: String,
}

/// The plugin's settings block: one body per configured anchor name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BodiesConfig {
    pub bodies: BTreeMap<String, BodyConfig>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_bodies_block() {
        let block = json!({
            "bodies": {
                "Earth": { "texture": "../share/textures/earth.jpg" },
                "Moon": { "texture": "../share/textures/moon.jpg" }
            }
        });

        let config: BodiesConfig = serde_json::from_value(block).unwrap();
        assert_eq!(config.bodies.len(), 2);
        assert_eq!(
            config.bodies["Earth"].texture,
            "../share/textures/earth.jpg"
        );
    }

    #[test]
    fn test_missing_bodies_key_fails() {
        assert!(serde_json::from_value::<BodiesConfig>(json!({})).is_err());
    }

    #[test]
    fn test_missing_texture_fails() {
        let block = json!({ "bodies": { "Earth": {} } });
        assert!(serde_json::from_value::<BodiesConfig>(block).is_err());
    }

    #[test]
    fn test_unknown_entry_keys_are_tolerated_and_lost() {
        let block = json!({
            "bodies": {
                "Earth": { "texture": "T", "legacyOption": 42 }
            }
        });

        let config: BodiesConfig = serde_json::from_value(block).unwrap();
        let written = serde_json::to_value(&config).unwrap();
        assert_eq!(written["bodies"]["Earth"]["texture"], "T");
        assert!(written["bodies"]["Earth"].get("legacyOption").is_none());
    }

    #[test]
    fn test_round_trip_is_identity_for_wellformed_input() {
        let block = json!({
            "bodies": {
                "Earth": { "texture": "earth.jpg" },
                "Mars": { "texture": "mars.jpg" }
            }
        });

        let config: BodiesConfig = serde_json::from_value(block.clone()).unwrap();
        assert_eq!(serde_json::to_value(&config).unwrap(), block);
    }
}
