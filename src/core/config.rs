//! Configuration management with layered hierarchy

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_STATION: &str = "Vemagiri GIS";
pub const DEFAULT_ORGANIZATION: &str = "POWER GRID CORPORATION OF INDIA Ltd";
/// Day/month/year without padding, as en-IN renders calendar dates
pub const DEFAULT_DATE_FORMAT: &str = "%-d/%-m/%Y";

/// Keys accepted by `gatepass config set`
pub const CONFIG_KEYS: &[(&str, &str)] = &[
    ("api_url", "Base URL of the inventory REST API"),
    ("timeout_secs", "Request timeout in seconds"),
    ("station", "Substation name used as origin on gate passes"),
    ("organization", "Organization name printed on gate passes"),
    ("date_format", "chrono format string for gate pass dates"),
    ("prepared_by", "Default 'prepared by' name for new gate passes"),
];

/// Values as read from a single config file; every key optional
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigLayer {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub station: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prepared_by: Option<String>,
}

impl ConfigLayer {
    /// Load a layer from a YAML file; a missing or unreadable file is an empty layer
    pub fn read(path: &std::path::Path) -> Self {
        Self::try_read(path).unwrap_or_default()
    }

    /// Load a layer, reporting a file that exists but does not parse
    ///
    /// A missing or blank file is an empty layer.
    pub fn try_read(path: &std::path::Path) -> Result<Self, String> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(format!("Cannot read {}: {}", path.display(), e)),
        };
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yml::from_str(&contents)
            .map_err(|e| format!("Invalid config file {}: {}", path.display(), e))
    }

    /// Set a key from its string form
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), String> {
        match key {
            "api_url" => self.api_url = Some(value.to_string()),
            "timeout_secs" => {
                let secs = value
                    .parse::<u64>()
                    .map_err(|_| format!("timeout_secs must be a whole number, got '{}'", value))?;
                self.timeout_secs = Some(secs);
            }
            "station" => self.station = Some(value.to_string()),
            "organization" => self.organization = Some(value.to_string()),
            "date_format" => self.date_format = Some(value.to_string()),
            "prepared_by" => self.prepared_by = Some(value.to_string()),
            _ => return Err(format!("Unknown configuration key: {}", key)),
        }
        Ok(())
    }

    /// Remove a key; returns whether it was set
    pub fn unset(&mut self, key: &str) -> Result<bool, String> {
        let was_set = match key {
            "api_url" => self.api_url.take().is_some(),
            "timeout_secs" => self.timeout_secs.take().is_some(),
            "station" => self.station.take().is_some(),
            "organization" => self.organization.take().is_some(),
            "date_format" => self.date_format.take().is_some(),
            "prepared_by" => self.prepared_by.take().is_some(),
            _ => return Err(format!("Unknown configuration key: {}", key)),
        };
        Ok(was_set)
    }
}

/// Effective configuration after all layers are merged
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Config {
    pub api_url: String,
    pub timeout_secs: u64,
    pub station: String,
    pub organization: String,
    pub date_format: String,
    pub prepared_by: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            station: DEFAULT_STATION.to_string(),
            organization: DEFAULT_ORGANIZATION.to_string(),
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            prepared_by: None,
        }
    }
}

impl Config {
    /// Load configuration from all sources, merging in priority order
    pub fn load() -> Self {
        // 1. Built-in defaults
        let mut config = Config::default();

        // 2. Global user config (~/.config/gatepass/config.yaml)
        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                config.merge(ConfigLayer::read(&global_path));
            }
        }

        // 3. Environment variables
        config.merge(Self::env_layer(|key| std::env::var(key).ok()));

        config
    }

    /// Get the path to the global config file
    pub fn global_config_path() -> Option<PathBuf> {
        // GATEPASS_CONFIG_DIR lets tests and scripts point at a scratch directory
        if let Ok(dir) = std::env::var("GATEPASS_CONFIG_DIR") {
            return Some(PathBuf::from(dir).join("config.yaml"));
        }
        directories::ProjectDirs::from("", "", "gatepass")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    fn env_layer(lookup: impl Fn(&str) -> Option<String>) -> ConfigLayer {
        ConfigLayer {
            api_url: lookup("GATEPASS_API_URL"),
            timeout_secs: lookup("GATEPASS_TIMEOUT_SECS").and_then(|s| s.parse().ok()),
            prepared_by: lookup("GATEPASS_PREPARED_BY"),
            ..Default::default()
        }
    }

    /// Merge a layer into this config (layer takes precedence)
    pub fn merge(&mut self, layer: ConfigLayer) {
        if let Some(api_url) = layer.api_url {
            self.api_url = api_url;
        }
        if let Some(timeout) = layer.timeout_secs {
            self.timeout_secs = timeout;
        }
        if let Some(station) = layer.station {
            self.station = station;
        }
        if let Some(organization) = layer.organization {
            self.organization = organization;
        }
        if let Some(date_format) = layer.date_format {
            self.date_format = date_format;
        }
        if layer.prepared_by.is_some() {
            self.prepared_by = layer.prepared_by;
        }
    }

    /// Apply command-line overrides
    pub fn with_overrides(mut self, api_url: Option<String>, timeout_secs: Option<u64>) -> Self {
        self.merge(ConfigLayer {
            api_url,
            timeout_secs,
            ..Default::default()
        });
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    /// Look up a key's effective value as a display string
    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "api_url" => Some(self.api_url.clone()),
            "timeout_secs" => Some(self.timeout_secs.to_string()),
            "station" => Some(self.station.clone()),
            "organization" => Some(self.organization.clone()),
            "date_format" => Some(self.date_format.clone()),
            "prepared_by" => self.prepared_by.clone(),
            _ => None,
        }
    }
}
