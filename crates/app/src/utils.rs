use shared::settings::AppSettings;
use std::path::PathBuf;

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("com.local", "Wellness Companion", "WellnessCompanion")
}

/// Get the config file path
pub fn config_path() -> Option<PathBuf> {
    project_dirs().map(|p| p.config_dir().join("settings.json"))
}

/// Load settings from disk or return defaults. The flag is false on a fresh
/// install (nothing readable on disk).
pub fn load_settings_or_default() -> (AppSettings, bool) {
    if let Some(path) = config_path() {
        if let Ok(contents) = std::fs::read_to_string(&path) {
            match serde_json::from_str::<AppSettings>(&contents) {
                Ok(settings) => return (settings, true),
                Err(e) => tracing::warn!("Ignoring unreadable {}: {}", path.display(), e),
            }
        }
    }
    (AppSettings::default(), false)
}

pub fn save_settings(settings: &AppSettings) {
    if let Some(path) = config_path() {
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        if let Ok(json) = serde_json::to_string_pretty(settings) {
            if let Err(e) = std::fs::write(&path, json) {
                tracing::warn!("Could not write {}: {}", path.display(), e);
            }
        }
    }
}

/// Where app state lives: the settings override, else the platform data dir.
pub fn data_dir(settings: &AppSettings) -> PathBuf {
    match &settings.data_dir {
        Some(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
        _ => services::JsonFileStore::default_dir(),
    }
}

/// Log filter: `RUST_LOG` wins over the settings file.
pub fn log_filter(settings: &AppSettings) -> String {
    std::env::var("RUST_LOG")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| settings.log_filter.clone())
}
