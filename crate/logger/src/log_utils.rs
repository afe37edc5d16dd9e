use std::sync::Once;

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter applied when neither `RUST_LOG` nor an explicit value is provided.
pub const DEFAULT_LOG_FILTER: &str =
    "info,warden_server=info,warden_credentials=info,actix_web=info";

static LOG_INIT: Once = Once::new();

/// Initialise the global tracing subscriber once per process.
///
/// `RUST_LOG` always wins when it is set. Otherwise `rust_log` is used,
/// falling back to [`DEFAULT_LOG_FILTER`]. When `quiet` is true the filter is
/// still installed but nothing is written to stdout.
///
/// Later calls are no-ops, which lets every test call it freely.
pub fn log_init(rust_log: Option<&str>, quiet: bool) {
    LOG_INIT.call_once(|| {
        if std::env::var("RUST_BACKTRACE").is_err() {
            unsafe {
                std::env::set_var("RUST_BACKTRACE", "1");
            }
        }

        if std::env::var("RUST_LOG").is_err() {
            unsafe {
                std::env::set_var("RUST_LOG", rust_log.unwrap_or(DEFAULT_LOG_FILTER));
            }
        }

        tracing_setup(quiet);
    });
}

fn tracing_setup(quiet: bool) {
    let format = (!quiet).then(|| {
        tracing_subscriber::fmt::layer()
            .with_level(true)
            .with_target(true)
            .with_thread_ids(true)
            .with_line_number(true)
            .with_file(true)
            .with_ansi(true)
            .compact()
    });

    let (filter, _reload_handle) =
        tracing_subscriber::reload::Layer::new(EnvFilter::from_default_env());

    // another subscriber may already be installed by a test harness
    if let Err(e) = tracing_subscriber::registry()
        .with(filter)
        .with(format)
        .try_init()
    {
        tracing::debug!("tracing subscriber already initialised: {e}");
    }
}
