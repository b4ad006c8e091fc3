//! Logging setup for `circleci-flaky`.
//!
//! The ranking is the only thing written to stdout, so it can be piped or
//! redirected as-is. Progress and diagnostics from the scan (builds found,
//! reports parsed, clamped limits) go to stderr through [`init_tracing`].

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Install the stderr subscriber.
///
/// `level` applies unless `RUST_LOG` is set; `json` switches to one JSON
/// object per line for CI log collectors. Later calls are no-ops.
pub fn init_tracing(json: bool, level: Level) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    // Each layer is built on its own: they sit at different depths of the stack.
    let (plain, json_lines) = if json {
        let layer = fmt::layer().with_target(false).with_writer(std::io::stderr);
        (None, Some(layer.json()))
    } else {
        let layer = fmt::layer().with_target(false).with_writer(std::io::stderr);
        (Some(layer), None)
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(plain)
        .with(json_lines)
        .try_init()
        .ok();
}
