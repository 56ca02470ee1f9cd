//! Host settings service.
//!
//! Holds the JSON settings document shared by the whole application: the
//! anchor table describing every celestial object the host knows about, and
//! one opaque JSON block per plugin. Plugins subscribe to the `on_load` and
//! `on_save` signals to reconcile their state against a freshly loaded
//! document and to write their block back before the document is persisted.

mod anchor;
mod error;
mod settings;

pub use anchor::Anchor;
pub use error::ConfigError;
pub use settings::Settings;
