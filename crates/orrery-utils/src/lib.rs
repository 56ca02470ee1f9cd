//! Small shared utilities: single-threaded signals and observable properties.

mod signal;

pub use signal::{ConnectionId, Property, Signal};
