use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_SETTINGS_TOML: &str = include_str!("../settings.toml");

/// Operator configuration. Loaded in layers; later files win per key.
#[derive(Debug, Clone)]
pub struct Settings {
    pub api_base: String,
    pub system_languages: Vec<String>,
    pub history_limit: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base: String::new(),
            system_languages: Vec::new(),
            history_limit: 10,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct SettingsFile {
    api: Option<ApiSettings>,
    system: Option<SystemSettings>,
}

#[derive(Debug, Default, Deserialize)]
struct ApiSettings {
    base: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SystemSettings {
    languages: Option<Vec<String>>,
    histories: Option<usize>,
}

pub fn load_settings(extra_path: Option<&Path>) -> Result<Settings> {
    let mut settings = Settings::default();
    ensure_home_settings_file()?;

    let mut ordered_paths = Vec::new();
    ordered_paths.push(PathBuf::from("settings.toml"));
    ordered_paths.push(PathBuf::from("settings.local.toml"));

    if let Some(home) = home_dir() {
        ordered_paths.push(home.join("settings.toml"));
        ordered_paths.push(home.join("settings.local.toml"));
    }

    if let Some(extra) = extra_path {
        if !extra.exists() {
            return Err(anyhow!("settings file not found: {}", extra.display()));
        }
        ordered_paths.push(extra.to_path_buf());
    }

    for path in ordered_paths {
        if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("failed to read settings: {}", path.display()))?;
            let parsed: SettingsFile = toml::from_str(&content)
                .with_context(|| format!("failed to parse settings: {}", path.display()))?;
            settings.merge(parsed);
        }
    }

    Ok(settings)
}

impl Settings {
    fn merge(&mut self, incoming: SettingsFile) {
        if let Some(api) = incoming.api {
            if let Some(base) = api.base {
                if !base.trim().is_empty() {
                    self.api_base = base;
                }
            }
        }
        if let Some(system) = incoming.system {
            if let Some(languages) = system.languages {
                self.system_languages = languages;
            }
            if let Some(limit) = system.histories {
                if limit > 0 {
                    self.history_limit = limit;
                }
            }
        }
    }
}

fn ensure_home_settings_file() -> Result<()> {
    let Some(home) = home_dir() else {
        return Ok(());
    };
    fs::create_dir_all(&home)
        .with_context(|| format!("failed to create settings directory: {}", home.display()))?;
    let path = home.join("settings.toml");
    if !path.exists() {
        fs::write(&path, DEFAULT_SETTINGS_TOML)
            .with_context(|| format!("failed to write settings: {}", path.display()))?;
    }
    Ok(())
}

fn home_dir() -> Option<PathBuf> {
    std::env::var("HOME").ok().and_then(|home| {
        let home = home.trim();
        if home.is_empty() {
            None
        } else {
            Some(Path::new(home).join(".cpsr-label-rust"))
        }
    })
}
