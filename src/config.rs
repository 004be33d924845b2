use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::{Result, SubGeniusError};
use crate::request::{DEFAULT_SPEAKERS, ModelSize, SubtitleFormat, TranscriptionRequest};

/// Overrides `backend.url` when set.
pub const BACKEND_URL_ENV: &str = "SUBGENIUS_BACKEND_URL";

fn default_timeout_secs() -> u64 {
    3600
}

fn default_mux_language() -> String {
    "rus".to_string()
}

fn default_num_speakers() -> u8 {
    DEFAULT_SPEAKERS
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub defaults: DefaultsConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the subtitle service
    pub url: String,
    /// Request timeout; transcription of long videos takes a while
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Subtitle track language sent with the burn-in request
    #[serde(default = "default_mux_language")]
    pub mux_language: String,
}

/// Initial values of the configuration form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    pub language: String,
    pub model_size: ModelSize,
    pub format: SubtitleFormat,
    #[serde(default = "default_num_speakers")]
    pub num_speakers: u8,
    #[serde(default)]
    pub translate: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Where exported subtitles and videos are written
    pub dir: PathBuf,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:5000".to_string(),
            timeout_secs: default_timeout_secs(),
            mux_language: default_mux_language(),
        }
    }
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        let request = TranscriptionRequest::default();
        Self {
            language: request.language,
            model_size: request.model_size,
            format: request.format,
            num_speakers: request.num_speakers,
            translate: request.translate,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
        }
    }
}

impl DefaultsConfig {
    pub fn to_request(&self) -> TranscriptionRequest {
        TranscriptionRequest {
            language: self.language.clone(),
            model_size: self.model_size,
            format: self.format,
            num_speakers: self.num_speakers,
            translate: self.translate,
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| SubGeniusError::Config(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| SubGeniusError::Config(format!("Failed to parse config file: {}", e)))
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| SubGeniusError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| SubGeniusError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Explicit path, else `./config.toml` when present, else defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None if Path::new("config.toml").exists() => {
                info!("Found config.toml in current directory, loading...");
                Self::from_file("config.toml")?
            }
            None => Self::default(),
        };
        config.apply_env_override(std::env::var(BACKEND_URL_ENV).ok());
        Ok(config)
    }

    pub fn apply_env_override(&mut self, backend_url: Option<String>) {
        if let Some(url) = backend_url.filter(|u| !u.trim().is_empty()) {
            info!("Using backend URL from {}: {}", BACKEND_URL_ENV, url);
            self.backend.url = url;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_and_load_preserves_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.backend.url = "http://transcriber:8080".to_string();
        config.defaults.format = SubtitleFormat::Vtt;
        config.defaults.model_size = ModelSize::Medium;
        config.save_to_file(&path).unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.backend.url, "http://transcriber:8080");
        assert_eq!(loaded.defaults.format, SubtitleFormat::Vtt);
        assert_eq!(loaded.defaults.model_size, ModelSize::Medium);
        assert_eq!(loaded.backend.timeout_secs, 3600);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let config: Config = toml::from_str("[backend]\nurl = \"http://b:1\"\n").unwrap();
        assert_eq!(config.backend.url, "http://b:1");
        assert_eq!(config.backend.mux_language, "rus");
        assert_eq!(config.defaults.language, "ru");
        assert_eq!(config.defaults.num_speakers, 2);
        assert_eq!(config.output.dir, PathBuf::from("."));
    }

    #[test]
    fn env_override_replaces_url() {
        let mut config = Config::default();
        config.apply_env_override(Some("  ".to_string()));
        assert_eq!(config.backend.url, "http://localhost:5000");
        config.apply_env_override(Some("http://remote:5000".to_string()));
        assert_eq!(config.backend.url, "http://remote:5000");
    }

    #[test]
    fn unreadable_file_is_config_error() {
        let err = Config::from_file("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, SubGeniusError::Config(_)));
    }
}
