//! Configuration file support for batch runs

use crate::error::{AreaLoadError, Result};
use crate::loads::{DistributionSettings, TwoWayRule};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level configuration for a batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Input batch JSON file path
    pub input_file: String,

    /// Output report path (optional, derived from the input if not specified)
    #[serde(default)]
    pub output_file: Option<String>,

    /// Distribution settings applied to every instance
    #[serde(default)]
    pub settings: DistributionSettings,
}

impl BatchConfig {
    pub fn new(input_file: String, output_file: Option<String>) -> Self {
        Self {
            input_file,
            output_file,
            settings: DistributionSettings::default(),
        }
    }

    /// Load configuration from a JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            AreaLoadError::ConfigError(format!("Failed to read config file: {}", e))
        })?;

        let config: BatchConfig = serde_json::from_str(&content).map_err(|e| {
            AreaLoadError::ConfigError(format!("Failed to parse config file: {}", e))
        })?;

        config.settings.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file
    pub fn to_file(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            AreaLoadError::ConfigError(format!("Failed to serialize config: {}", e))
        })?;

        std::fs::write(path, content).map_err(|e| {
            AreaLoadError::ConfigError(format!("Failed to write config file: {}", e))
        })?;

        Ok(())
    }

    /// Apply command-line overrides on top of the loaded settings
    pub fn with_overrides(
        mut self,
        angular_tolerance: Option<f64>,
        even_fallback: bool,
        two_way_rule: Option<TwoWayRule>,
    ) -> Result<Self> {
        if let Some(tolerance) = angular_tolerance {
            self.settings.angular_tolerance = tolerance;
        }
        if even_fallback {
            self.settings.even_fallback = true;
        }
        if let Some(rule) = two_way_rule {
            self.settings.two_way_rule = rule;
        }

        self.settings.validate()?;
        Ok(self)
    }

    /// Output path, defaulting to `<input stem>_loads.json` next to the input
    pub fn output_path(&self) -> std::path::PathBuf {
        match &self.output_file {
            Some(path) => path.into(),
            None => {
                let input = Path::new(&self.input_file);
                let stem = input
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or("batch");
                input.with_file_name(format!("{}_loads.json", stem))
            }
        }
    }
}
