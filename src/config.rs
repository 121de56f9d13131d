use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::analyzer::AnalyzerConfig;
use crate::sampler::SamplerParams;

/// Host-tunable knobs, persisted as JSON.
///
/// The defaults reproduce the literal contract values: base weight 1,
/// error scale 10, ten words per feed, a four-key penalty for a position
/// left wrong, and a three-second idle cutoff on the session clock.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub base_weight: f64,
    pub error_scale: f64,
    pub default_count: usize,
    pub miss_penalty_keys: i64,
    pub idle_cutoff_secs: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_weight: 1.0,
            error_scale: 10.0,
            default_count: 10,
            miss_penalty_keys: 4,
            idle_cutoff_secs: 3.0,
        }
    }
}

impl Config {
    pub fn sampler_params(&self) -> SamplerParams {
        SamplerParams {
            base_weight: self.base_weight,
            error_scale: self.error_scale,
        }
    }

    pub fn analyzer_config(&self) -> AnalyzerConfig {
        AnalyzerConfig {
            miss_penalty_keys: self.miss_penalty_keys,
        }
    }

    /// Idle cutoff as a duration. A stored value that `Duration` cannot
    /// represent falls back to the three-second default instead of
    /// panicking.
    pub fn idle_cutoff(&self) -> Duration {
        Duration::try_from_secs_f64(self.idle_cutoff_secs)
            .unwrap_or_else(|_| Duration::from_secs(3))
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new() -> Self {
        let path = if let Some(pd) = ProjectDirs::from("", "", "keycoach") {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("keycoach_config.json")
        };
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        if let Ok(bytes) = fs::read(&self.path) {
            if let Ok(cfg) = serde_json::from_slice::<Config>(&bytes) {
                return cfg;
            }
        }
        Config::default()
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg).unwrap_or_default();
        fs::write(&self.path, data)
    }
}
