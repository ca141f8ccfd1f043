//! tracing subscriber setup
//!
//! Logs always go to stderr so stdout only carries the completion message.
//! `RUST_LOG` wins over the verbosity flags when set.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter directive for a verbosity level (-1 = quiet, 0 = default, 1+ = verbose)
pub fn default_directive(verbosity: i8) -> &'static str {
    match verbosity {
        i8::MIN..=-1 => "error",
        0 => "warn,site_extractor=info",
        1 => "warn,site_extractor=debug",
        _ => "debug,site_extractor=trace",
    }
}

/// Install the global subscriber; `json` switches to one JSON object per line
pub fn init(verbosity: i8, json: bool) -> Result<(), tracing_subscriber::util::TryInitError> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));

    let json_layer = json.then(|| {
        fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_current_span(true)
    });
    let text_layer = (!json).then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .compact()
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .try_init()
}
