//! Configuration File Loading
//!
//! Finds, parses and validates configuration files. TOML is the default
//! format; files ending in `.json` are read as JSON.

use super::Config;
use crate::error::{Error, Result};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "replsend";

/// Configuration file loader
pub struct ConfigLoader {
    /// Base paths searched, without extension
    search_paths: Vec<PathBuf>,
    /// Formats tried for each base path, in order
    supported_formats: Vec<ConfigFormat>,
    /// Path of the file that was loaded, if any
    current_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Json,
}

impl ConfigFormat {
    /// Format implied by a file extension; TOML when unknown
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => ConfigFormat::Json,
            _ => ConfigFormat::Toml,
        }
    }

    fn extension(self) -> &'static str {
        match self {
            ConfigFormat::Toml => "toml",
            ConfigFormat::Json => "json",
        }
    }
}

impl ConfigLoader {
    /// Create a loader over the default search paths
    pub fn new() -> Self {
        Self {
            search_paths: Self::get_search_paths(),
            supported_formats: vec![ConfigFormat::Toml, ConfigFormat::Json],
            current_path: None,
        }
    }

    /// Load the first configuration found, or the defaults when there is none
    pub fn load(&mut self) -> Result<Config> {
        match self.find_and_load_config()? {
            Some((path, config)) => {
                info!("Loaded configuration from {}", path.display());
                self.current_path = Some(path);
                config.validate()?;
                Ok(config)
            }
            None => {
                debug!("No configuration file found, using defaults");
                Ok(Config::default())
            }
        }
    }

    /// Load and validate a specific file. A missing file is an error.
    pub fn load_from_path(&mut self, path: &Path) -> Result<Config> {
        let config = Self::load_config_file(path, ConfigFormat::from_path(path))?;
        config.validate()?;
        self.current_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Write a configuration, in the format implied by the extension
    pub fn save_to_path(&self, config: &Config, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = match ConfigFormat::from_path(path) {
            ConfigFormat::Json => serde_json::to_string_pretty(config).map_err(|e| e.to_string()),
            ConfigFormat::Toml => toml::to_string_pretty(config).map_err(|e| e.to_string()),
        }
        .map_err(|reason| Error::ConfigLoadFailed {
            path: path.to_path_buf(),
            reason,
        })?;

        fs::write(path, content)?;
        Ok(())
    }

    /// Find and load configuration from search paths
    fn find_and_load_config(&self) -> Result<Option<(PathBuf, Config)>> {
        for base in &self.search_paths {
            for format in &self.supported_formats {
                let config_path = base.with_extension(format.extension());
                if !config_path.exists() {
                    continue;
                }

                match Self::load_config_file(&config_path, *format) {
                    Ok(config) => return Ok(Some((config_path, config))),
                    Err(e) => {
                        // Keep searching; a broken file should not hide a good one
                        warn!("Failed to load config from {}: {}", config_path.display(), e);
                    }
                }
            }
        }

        Ok(None)
    }

    /// Parse one configuration file
    fn load_config_file(path: &Path, format: ConfigFormat) -> Result<Config> {
        let load_failed = |reason: String| Error::ConfigLoadFailed {
            path: path.to_path_buf(),
            reason,
        };

        let content = fs::read_to_string(path).map_err(|e| load_failed(e.to_string()))?;

        match format {
            ConfigFormat::Toml => {
                toml::from_str(&content).map_err(|e| load_failed(format!("TOML: {}", e)))
            }
            ConfigFormat::Json => {
                serde_json::from_str(&content).map_err(|e| load_failed(format!("JSON: {}", e)))
            }
        }
    }

    /// Default search paths, most specific first
    fn get_search_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        if let Ok(cwd) = env::current_dir() {
            paths.push(cwd.join(".replsend"));
        }

        if let Ok(xdg_config) = env::var("XDG_CONFIG_HOME") {
            paths.push(PathBuf::from(xdg_config).join(APP_DIR).join("config"));
        }

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join(APP_DIR).join("config"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".replsend"));
        }

        paths.dedup();
        paths
    }

    /// Where a new configuration file is written by default
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
            .join("config.toml")
    }

    /// Path of the file that was loaded, if any
    pub fn current_path(&self) -> Option<&Path> {
        self.current_path.as_deref()
    }

    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// Clear all search paths and add a single base path
    pub fn set_search_path(&mut self, path: PathBuf) {
        self.search_paths = vec![path];
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
