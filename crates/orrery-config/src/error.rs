//! Configuration error types.

/// Errors that can occur when loading, saving, or parsing settings.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the settings file from disk.
    #[error("failed to read settings: {0}")]
    ReadError(#[source] std::io::Error),

    /// Failed to write the settings file to disk.
    #[error("failed to write settings: {0}")]
    WriteError(#[source] std::io::Error),

    /// Failed to parse JSON content.
    #[error("failed to parse settings: {0}")]
    ParseError(#[source] serde_json::Error),

    /// Failed to serialize settings to JSON.
    #[error("failed to serialize settings: {0}")]
    SerializeError(#[source] serde_json::Error),

    /// A plugin block that should be present is missing from the document.
    #[error("no settings block for plugin \"{0}\"")]
    MissingPluginBlock(String),

    /// A plugin block does not match the structure the plugin expects.
    #[error("invalid settings block for plugin \"{plugin}\": {source}")]
    InvalidPluginBlock {
        plugin: String,
        #[source]
        source: serde_json::Error,
    },
}
