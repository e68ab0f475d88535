use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use finger_count_core::counting::domain::finger_counter::ThumbRule;
use finger_count_core::detection::infrastructure::onnx_hand_landmark_detector::DEFAULT_PRESENCE_THRESHOLD;
use finger_count_core::detection::infrastructure::onnx_palm_detector::DEFAULT_PALM_CONFIDENCE;
use finger_count_core::shared::constants::{DEFAULT_MAX_IMAGE_BYTES, DEFAULT_UPLOAD_DIR};

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 5000;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// How the thumb predicate treats the observed hand.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ThumbRuleSetting {
    #[default]
    FixedRight,
    HandednessAware,
}

impl From<ThumbRuleSetting> for ThumbRule {
    fn from(setting: ThumbRuleSetting) -> Self {
        match setting {
            ThumbRuleSetting::FixedRight => ThumbRule::FixedRight,
            ThumbRuleSetting::HandednessAware => ThumbRule::HandednessAware,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub upload_dir: PathBuf,
    pub model_dir: Option<PathBuf>,
    pub palm_model_url: Option<String>,
    pub landmark_model_url: Option<String>,
    pub palm_confidence: f64,
    pub presence_threshold: f64,
    pub thumb_rule: ThumbRuleSetting,
    /// Largest decoded image accepted, in bytes.
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            upload_dir: PathBuf::from(DEFAULT_UPLOAD_DIR),
            model_dir: None,
            palm_model_url: None,
            landmark_model_url: None,
            palm_confidence: DEFAULT_PALM_CONFIDENCE,
            presence_threshold: DEFAULT_PRESENCE_THRESHOLD,
            thumb_rule: ThumbRuleSetting::default(),
            max_upload_bytes: DEFAULT_MAX_IMAGE_BYTES,
        }
    }
}

impl ServerConfig {
    /// `<config dir>/FingerCount/server.json`, used when no path is given.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("FingerCount").join("server.json"))
    }

    /// Reads a JSON config file. Missing keys take their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&json).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Explicit path must exist; the default path is optional.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => match Self::default_path().filter(|p| p.exists()) {
                Some(path) => {
                    log::info!("Loading config from {}", path.display());
                    Self::load(&path)
                }
                None => Ok(Self::default()),
            },
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.palm_confidence) {
            return Err(ConfigError::Invalid(format!(
                "palm_confidence must be between 0.0 and 1.0, got {}",
                self.palm_confidence
            )));
        }
        if !(0.0..=1.0).contains(&self.presence_threshold) {
            return Err(ConfigError::Invalid(format!(
                "presence_threshold must be between 0.0 and 1.0, got {}",
                self.presence_threshold
            )));
        }
        if self.max_upload_bytes == 0 {
            return Err(ConfigError::Invalid(
                "max_upload_bytes must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Request body limit. Data URLs inflate images by a third, plus multipart framing.
    pub fn body_limit(&self) -> usize {
        self.max_upload_bytes
            .saturating_mul(4)
            .saturating_div(3)
            .saturating_add(64 * 1024)
    }
}
