//! Transcription parameters and the configuration form that collects them.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Result, SubGeniusError};
use crate::language::resolve_language;
use crate::media::file_extension;

/// Extensions the backend can decode.
pub const ALLOWED_EXTENSIONS: &[&str] = &["mp4", "avi", "mov", "mkv"];

pub const MIN_SPEAKERS: u8 = 1;
pub const MAX_SPEAKERS: u8 = 5;
pub const DEFAULT_SPEAKERS: u8 = 2;

/// Unset (0) means the default count; anything else is clamped to 1..=5.
pub fn normalize_speakers(num_speakers: u8) -> u8 {
    if num_speakers == 0 {
        return DEFAULT_SPEAKERS;
    }
    let clamped = num_speakers.clamp(MIN_SPEAKERS, MAX_SPEAKERS);
    if clamped != num_speakers {
        warn!(
            "Speaker count {} out of range, using {}",
            num_speakers, clamped
        );
    }
    clamped
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ModelSize {
    /// Fast
    #[default]
    Base,
    /// Accurate
    Medium,
}

impl ModelSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Base => "base",
            Self::Medium => "medium",
        }
    }
}

impl FromStr for ModelSize {
    type Err = SubGeniusError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "base" => Ok(Self::Base),
            "medium" => Ok(Self::Medium),
            other => Err(SubGeniusError::Config(format!(
                "Unknown model size '{}', expected base or medium",
                other
            ))),
        }
    }
}

impl fmt::Display for ModelSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SubtitleFormat {
    #[default]
    Srt,
    Vtt,
    Txt,
}

impl SubtitleFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Srt => "srt",
            Self::Vtt => "vtt",
            Self::Txt => "txt",
        }
    }

    /// Format named by a subtitle file's extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        ext.parse()
    }
}

impl FromStr for SubtitleFormat {
    type Err = SubGeniusError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "srt" => Ok(Self::Srt),
            "vtt" => Ok(Self::Vtt),
            "txt" => Ok(Self::Txt),
            other => Err(SubGeniusError::Config(format!(
                "Unknown subtitle format '{}', expected srt, vtt or txt",
                other
            ))),
        }
    }
}

impl fmt::Display for SubtitleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters chosen by the user for one submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptionRequest {
    pub language: String,
    pub model_size: ModelSize,
    pub format: SubtitleFormat,
    pub num_speakers: u8,
    pub translate: bool,
}

impl Default for TranscriptionRequest {
    fn default() -> Self {
        Self {
            language: "ru".to_string(),
            model_size: ModelSize::Base,
            format: SubtitleFormat::Srt,
            num_speakers: DEFAULT_SPEAKERS,
            translate: false,
        }
    }
}

impl TranscriptionRequest {
    /// Resolve the language against the supported list and produce the
    /// multipart fields, plus a warning when the language was replaced.
    pub fn into_backend_params(self) -> (BackendParams, Option<String>) {
        let resolution = resolve_language(&self.language);
        let num_speakers = normalize_speakers(self.num_speakers);

        let params = BackendParams {
            model_size: self.model_size,
            language: resolution.code,
            format: self.format,
            num_speakers,
            translate: self.translate,
        };
        (params, resolution.warning)
    }
}

/// Form fields of `POST /generate-subtitles`, language already resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendParams {
    pub model_size: ModelSize,
    pub language: String,
    pub format: SubtitleFormat,
    pub num_speakers: u8,
    pub translate: bool,
}

impl BackendParams {
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("model_size", self.model_size.as_str().to_string()),
            ("language", self.language.clone()),
            ("format", self.format.as_str().to_string()),
            ("num_speakers", self.num_speakers.to_string()),
            (
                "translate",
                if self.translate { "true" } else { "false" }.to_string(),
            ),
        ]
    }
}

/// Local state of the player view.
#[derive(Debug, Clone)]
pub struct ConfigurationForm {
    file_name: String,
    params: TranscriptionRequest,
}

impl ConfigurationForm {
    pub fn new(file_name: impl Into<String>, defaults: TranscriptionRequest) -> Self {
        let mut form = Self {
            file_name: file_name.into(),
            params: defaults,
        };
        let speakers = form.params.num_speakers;
        form.set_num_speakers(speakers);
        form
    }

    pub fn params(&self) -> &TranscriptionRequest {
        &self.params
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn set_language(&mut self, language: impl Into<String>) {
        self.params.language = language.into();
    }

    pub fn set_model_size(&mut self, model_size: ModelSize) {
        self.params.model_size = model_size;
    }

    pub fn set_format(&mut self, format: SubtitleFormat) {
        self.params.format = format;
    }

    pub fn set_num_speakers(&mut self, num_speakers: u8) {
        self.params.num_speakers = normalize_speakers(num_speakers);
    }

    pub fn set_translate(&mut self, translate: bool) {
        self.params.translate = translate;
    }

    pub fn extension(&self) -> String {
        file_extension(&self.file_name)
    }

    pub fn is_extension_valid(&self) -> bool {
        ALLOWED_EXTENSIONS.contains(&self.extension().as_str())
    }

    /// Text shown over the preview when the extension is not accepted.
    pub fn extension_warning(&self) -> Option<String> {
        if self.is_extension_valid() {
            return None;
        }
        let ext = self.extension();
        let shown = if ext.is_empty() { "unknown" } else { ext.as_str() };
        Some(format!("Unsupported format: .{}", shown))
    }

    pub fn can_submit(&self, busy: bool) -> bool {
        !busy && self.is_extension_valid()
    }

    pub fn submit(&self, busy: bool) -> Result<TranscriptionRequest> {
        if busy {
            return Err(SubGeniusError::Busy);
        }
        if !self.is_extension_valid() {
            return Err(SubGeniusError::UnsupportedExtension(self.extension()));
        }
        debug!("Submitting transcription parameters: {:?}", self.params);
        Ok(self.params.clone())
    }
}
