use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use std::fs;

/// Tunables for the concurrency and UI layer.
///
/// Loaded from `dataverse.yaml` in the data directory; every field has a
/// default so a missing or partial file still yields a working setup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct UiSettings {
    /// Worker pool size; 0 means one worker per available core.
    pub worker_threads: usize,

    /// Quiet period for live-search debouncing, in milliseconds.
    pub search_debounce_ms: u64,

    /// Items per page on screens rendering big cards (franchises).
    pub page_size_big_cards: usize,

    /// Items per page on screens rendering small cards (genres).
    pub page_size_small_cards: usize,

    /// Directory log files are written to.
    pub log_dir: String,

    /// Log at debug level instead of info.
    pub debug_mode: bool,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            worker_threads: 0,
            search_debounce_ms: 250,
            page_size_big_cards: 18,
            page_size_small_cards: 28,
            log_dir: "logs".to_string(),
            debug_mode: false,
        }
    }
}

impl UiSettings {
    pub fn search_debounce(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.search_debounce_ms)
    }
}

/// Loads and saves the YAML settings file.
#[derive(Debug, Clone)]
pub struct SettingsManager {
    settings_path: Utf8PathBuf,
}

impl SettingsManager {
    /// Create a SettingsManager rooted at the given data directory.
    ///
    /// The directory is created if it does not exist.
    pub fn new<P: AsRef<Utf8Path>>(data_dir: P) -> Result<Self> {
        let data_dir = data_dir.as_ref().to_path_buf();

        if !data_dir.exists() {
            fs::create_dir_all(&data_dir)
                .with_context(|| format!("Failed to create data directory: {}", data_dir))?;
        }

        Ok(Self {
            settings_path: data_dir.join("dataverse.yaml"),
        })
    }

    /// Load the settings file, falling back to defaults if it is missing.
    ///
    /// A missing file is normal on first run; it is created with defaults so
    /// the user has something to edit.
    pub fn load(&self) -> Result<UiSettings> {
        if !self.settings_path.exists() {
            tracing::warn!(
                "Settings file not found at {}, writing defaults",
                self.settings_path
            );
            let defaults = UiSettings::default();
            self.save(&defaults)?;
            return Ok(defaults);
        }

        let file_contents = fs::read_to_string(&self.settings_path)
            .with_context(|| format!("Failed to read settings: {}", self.settings_path))?;

        let settings: UiSettings = serde_yaml_ng::from_str(&file_contents)
            .with_context(|| format!("Failed to parse settings: {}", self.settings_path))?;

        tracing::info!("Loaded settings from {}", self.settings_path);
        Ok(settings)
    }

    /// Save the settings file.
    pub fn save(&self, settings: &UiSettings) -> Result<()> {
        let yaml_string =
            serde_yaml_ng::to_string(settings).context("Failed to serialize settings to YAML")?;

        fs::write(&self.settings_path, yaml_string)
            .with_context(|| format!("Failed to write settings: {}", self.settings_path))?;

        tracing::info!("Saved settings to {}", self.settings_path);
        Ok(())
    }

    pub fn settings_path(&self) -> &Utf8Path {
        &self.settings_path
    }
}
