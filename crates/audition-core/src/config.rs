//! Serve defaults, loadable from `audition.yaml` and overridable from
//! the CLI.

use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const SUPPORTED_CONFIG_VERSION: u32 = 1;

pub const SINGLE_LOG_FILE: &str = "single_eval_log.csv";
pub const COMPARE_LOG_FILE: &str = "comp_eval_log.csv";
pub const CALIBRATION_LOG_FILE: &str = "criteria_test_log.csv";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub version: u32,
    /// Sample manifest CSV.
    #[serde(default = "default_manifest")]
    pub manifest: PathBuf,
    /// Root folder holding one subfolder of clips per model.
    #[serde(default = "default_audio_dir")]
    pub audio_dir: PathBuf,
    /// Folder the score logs are written to.
    #[serde(default = "default_out_dir")]
    pub out_dir: PathBuf,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_manifest() -> PathBuf {
    PathBuf::from("app_input/csv/list.csv")
}

fn default_audio_dir() -> PathBuf {
    PathBuf::from("app_input/audios")
}

fn default_out_dir() -> PathBuf {
    PathBuf::from("app_output")
}

fn default_port() -> u16 {
    8787
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: SUPPORTED_CONFIG_VERSION,
            manifest: default_manifest(),
            audio_dir: default_audio_dir(),
            out_dir: default_out_dir(),
            port: default_port(),
        }
    }
}

impl AppConfig {
    pub fn single_log_path(&self) -> PathBuf {
        self.out_dir.join(SINGLE_LOG_FILE)
    }

    pub fn compare_log_path(&self) -> PathBuf {
        self.out_dir.join(COMPARE_LOG_FILE)
    }

    pub fn calibration_log_path(&self) -> PathBuf {
        self.out_dir.join(CALIBRATION_LOG_FILE)
    }
}

pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| ConfigError(format!("failed to read config {}: {}", path.display(), e)))?;
    let cfg: AppConfig = serde_yaml::from_str(&raw)
        .map_err(|e| ConfigError(format!("failed to parse YAML: {}", e)))?;
    if cfg.version != SUPPORTED_CONFIG_VERSION {
        return Err(ConfigError(format!(
            "unsupported config version {} (supported: {})",
            cfg.version, SUPPORTED_CONFIG_VERSION
        )));
    }
    Ok(cfg)
}
