use std::path::PathBuf;

use tracing_subscriber::EnvFilter;

/// Initialise logging. The default level is `info`; when `debug` is enabled
/// the level becomes `debug` and can be overridden via the `RUST_LOG`
/// environment variable.
///
/// When `log_file` is provided all output is written to that file instead of
/// stderr. Calling this more than once is harmless; only the first call
/// installs a subscriber.
pub fn init(debug: bool, log_file: Option<PathBuf>) {
    // With debug logging disabled `RUST_LOG` is ignored so a stray variable in
    // the user's environment cannot make the overlay chatty.
    let level = if debug { "debug" } else { "info" };

    let filter = if debug {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    } else {
        EnvFilter::new(level)
    };

    match log_file.as_deref().and_then(split_log_path) {
        Some((dir, name)) => {
            let appender = tracing_appender::rolling::never(dir, name);
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(appender)
                .try_init();
        }
        None => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .try_init();
        }
    }
}

fn split_log_path(path: &std::path::Path) -> Option<(PathBuf, PathBuf)> {
    let name = path.file_name()?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Some((dir, PathBuf::from(name)))
}
