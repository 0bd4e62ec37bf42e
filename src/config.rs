use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "reqforge";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Version stamped on every generated task.
pub const GENERATOR_VERSION: &str = "1.0.0";

pub const DEFAULT_MAX_TASKS: usize = 50;
pub const MAX_TASKS_LIMIT: usize = 500;
pub const DEFAULT_REQUIREMENT_THRESHOLD: f32 = 0.5;

/// Get the application data directory (`<platform data dir>/reqforge`).
/// Falls back to the working directory when the platform reports none.
pub fn app_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Default location of the pretrained classifier artifacts.
pub fn models_dir() -> PathBuf {
    app_data_dir().join("models")
}

/// Log filter used when `RUST_LOG` is not set.
///
/// `LOG_LEVEL` accepts the usual names in any case (`INFO`, `debug`, ...);
/// this crate logs at that level, dependencies stay at `warn`.
pub fn default_log_filter() -> String {
    let level = std::env::var("LOG_LEVEL").unwrap_or_default();
    log_filter_for(&level)
}

fn log_filter_for(level: &str) -> String {
    let level = match level.trim().to_lowercase().as_str() {
        "trace" => "trace",
        "debug" => "debug",
        "warn" | "warning" => "warn",
        "error" | "critical" => "error",
        _ => "info",
    };
    format!("warn,reqforge={level},reqforge_lib={level}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn models_dir_under_app_data() {
        let models = models_dir();
        assert!(models.starts_with(app_data_dir()));
        assert!(models.ends_with("models"));
    }

    #[test]
    fn app_data_dir_is_named_after_app() {
        assert!(app_data_dir().ends_with(APP_NAME));
    }

    #[test]
    fn log_filter_maps_level_names() {
        assert_eq!(log_filter_for("DEBUG"), "warn,reqforge=debug,reqforge_lib=debug");
        assert_eq!(log_filter_for("WARNING"), "warn,reqforge=warn,reqforge_lib=warn");
        assert_eq!(log_filter_for(""), "warn,reqforge=info,reqforge_lib=info");
        assert_eq!(log_filter_for("nonsense"), "warn,reqforge=info,reqforge_lib=info");
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, env!("CARGO_PKG_VERSION"));
    }
}
