use golem_overlay::settings::Settings;
use std::process::ExitCode;

fn main() -> ExitCode {
    let path = Settings::default_path();
    let (settings, load_error) = match Settings::load(&path) {
        Ok(settings) => (settings, None),
        Err(err) => (Settings::default(), Some(err)),
    };
    golem_overlay::logging::init(settings.debug_logging, settings.log_file.clone());
    if let Some(err) = load_error {
        tracing::warn!("failed to read {path}: {err:#}; using defaults");
    }

    match golem_overlay::app::run(settings.sanitized()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err:#}");
            ExitCode::from(1)
        }
    }
}
