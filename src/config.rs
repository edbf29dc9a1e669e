//! Workspace configuration stored in `.tabrecon/config.json`

use crate::error::{ReconError, Result};
use crate::store::EvictionPolicy;
use crate::value::{NormalizerConfig, DEFAULT_NULL_MARKERS};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconConfig {
    pub version: String,
    pub created: DateTime<Utc>,
    pub default_page_size: usize,
    pub case_insensitive: bool,
    pub null_markers: Vec<String>,
    pub eviction: EvictionPolicy,
}

impl Default for ReconConfig {
    fn default() -> Self {
        Self {
            version: crate::FORMAT_VERSION.to_string(),
            created: Utc::now(),
            default_page_size: crate::DEFAULT_PAGE_SIZE,
            case_insensitive: false,
            null_markers: DEFAULT_NULL_MARKERS.iter().map(|s| s.to_string()).collect(),
            eviction: EvictionPolicy::Manual,
        }
    }
}

impl ReconConfig {
    /// Read a config file; a missing file yields defaults
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content).map_err(|e| {
            ReconError::config(format!("Invalid config file '{}': {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        self.validate()?;
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.default_page_size == 0 {
            return Err(ReconError::config("default_page_size must be greater than 0"));
        }
        if let EvictionPolicy::MaxEntries { max: 0 } = self.eviction {
            return Err(ReconError::config("max_entries eviction needs max > 0"));
        }
        Ok(())
    }

    pub fn normalizer_config(&self) -> NormalizerConfig {
        NormalizerConfig {
            case_insensitive: self.case_insensitive,
            null_markers: self.null_markers.clone(),
        }
    }
}
