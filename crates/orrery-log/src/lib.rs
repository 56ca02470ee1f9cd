//! Structured logging for the orrery host and its plugins.
//!
//! Console output with uptime timestamps and module targets via the
//! `tracing` ecosystem, plus an optional JSON file layer in debug builds
//! for post-mortem analysis. `RUST_LOG` overrides the default filter.

use std::path::Path;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber.
///
/// * `log_dir` - optional directory for a JSON log file (debug builds only)
/// * `debug_build` - enables the file layer
/// * `filter` - filter override, e.g. `"debug,wgpu=warn"`; `RUST_LOG` wins
///   over both this and the default
pub fn init_logging(log_dir: Option<&Path>, debug_build: bool, filter: Option<&str>) {
    let filter_str = filter.unwrap_or("info,wgpu=warn,naga=warn");
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter_str));

    let console_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(true)
        .with_level(true)
        .with_timer(fmt::time::uptime());

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer);

    if debug_build
        && let Some(log_dir) = log_dir
        && std::fs::create_dir_all(log_dir).is_ok()
        && let Ok(log_file) = std::fs::File::create(log_dir.join("orrery.log"))
    {
        let file_layer = fmt::layer()
            .with_writer(log_file)
            .with_ansi(false)
            .with_target(true)
            .with_timer(fmt::time::uptime())
            .json();

        subscriber.with(file_layer).init();
        return;
    }

    subscriber.init();
}

/// The default filter: `info` everywhere, `wgpu` and `naga` reduced to
/// warnings to keep frame logs readable.
pub fn default_env_filter() -> EnvFilter {
    EnvFilter::new("info,wgpu=warn,naga=warn")
}
