use serde::Deserialize;
use tracing::warn;

use crate::error::{Result, SubGeniusError};
use crate::notice::{BACKEND_ERROR, PROCESSING_ERROR};
use crate::request::SubtitleFormat;
use crate::subtitle::SubtitleResult;

/// Body of a successful `POST /generate-subtitles`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    pub success: bool,
    pub content: Option<String>,
    pub format: Option<String>,
    pub duration: Option<DurationValue>,
    pub segments_count: Option<u64>,
    pub error: Option<String>,
}

/// The backend reports duration as `"12.34 seconds"`; plain numbers are accepted too.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum DurationValue {
    Seconds(f64),
    Text(String),
}

impl DurationValue {
    pub fn seconds(&self) -> f64 {
        match self {
            Self::Seconds(s) => *s,
            Self::Text(text) => text
                .split_whitespace()
                .next()
                .and_then(|n| n.parse::<f64>().ok())
                .unwrap_or(0.0),
        }
    }
}

impl GenerateResponse {
    pub fn into_result(self) -> Result<SubtitleResult> {
        let content = match self.content {
            Some(content) if self.success && !content.is_empty() => content,
            _ => {
                let message = self.error.unwrap_or_else(|| PROCESSING_ERROR.to_string());
                return Err(SubGeniusError::Processing(message));
            }
        };

        let format = match self.format.as_deref() {
            None | Some("") => SubtitleFormat::Srt,
            Some(tag) => tag.parse().unwrap_or_else(|_| {
                warn!("Backend returned unknown format '{}', treating as srt", tag);
                SubtitleFormat::Srt
            }),
        };

        Ok(SubtitleResult {
            content,
            format,
            duration: self.duration.map(|d| d.seconds()).unwrap_or(0.0),
            segments_count: self.segments_count.unwrap_or(0),
        })
    }
}

/// Error body shared by both endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    pub error: Option<String>,
    pub message: Option<String>,
    pub details: Option<String>,
}

impl ErrorBody {
    fn parse(body: &str) -> Self {
        serde_json::from_str(body).unwrap_or_default()
    }
}

/// Map a non-success `generate-subtitles` response to the message shown to the user.
pub fn generate_failure(status: u16, body: &str, language: &str) -> SubGeniusError {
    if status == 413 {
        return SubGeniusError::FileTooLarge;
    }

    let error_body = ErrorBody::parse(body);
    if status == 400
        && error_body
            .error
            .as_deref()
            .is_some_and(|e| e.contains("Unsupported language"))
    {
        return SubGeniusError::UnsupportedLanguage(language.to_string());
    }

    SubGeniusError::Backend(
        error_body
            .message
            .unwrap_or_else(|| BACKEND_ERROR.to_string()),
    )
}

/// Map a non-success `generate-video-with-subs` response.
pub fn mux_failure(body: &str) -> SubGeniusError {
    let error_body = ErrorBody::parse(body);
    SubGeniusError::Backend(
        error_body
            .details
            .or(error_body.error)
            .unwrap_or_else(|| BACKEND_ERROR.to_string()),
    )
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ModelStatus {
    pub size: String,
    pub loaded: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HealthReport {
    pub status: String,
    #[serde(default)]
    pub models_loaded: Vec<ModelStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_backend_success_body() {
        let body = r#"{
            "success": true,
            "duration": "12.34 seconds",
            "segments_count": 7,
            "format": "vtt",
            "content": "WEBVTT\n\n00:00.000 --> 00:01.000\nhi\n",
            "speakers": "auto",
            "request_id": "abc"
        }"#;
        let response: GenerateResponse = serde_json::from_str(body).unwrap();
        let result = response.into_result().unwrap();
        assert_eq!(result.format, SubtitleFormat::Vtt);
        assert_eq!(result.segments_count, 7);
        assert!((result.duration - 12.34).abs() < 1e-9);
        assert!(result.content.starts_with("WEBVTT"));
    }

    #[test]
    fn missing_metadata_gets_defaults() {
        let response: GenerateResponse =
            serde_json::from_str(r#"{"success": true, "content": "text", "duration": 3}"#).unwrap();
        let result = response.into_result().unwrap();
        assert_eq!(result.format, SubtitleFormat::Srt);
        assert_eq!(result.segments_count, 0);
        assert_eq!(result.duration, 3.0);
    }

    #[test]
    fn success_without_content_is_a_processing_error() {
        let response: GenerateResponse = serde_json::from_str(r#"{"success": true}"#).unwrap();
        assert!(matches!(
            response.into_result(),
            Err(SubGeniusError::Processing(m)) if m == PROCESSING_ERROR
        ));

        let response: GenerateResponse =
            serde_json::from_str(r#"{"success": false, "content": "x", "error": "boom"}"#).unwrap();
        assert!(matches!(
            response.into_result(),
            Err(SubGeniusError::Processing(m)) if m == "boom"
        ));
    }

    #[test]
    fn maps_generate_failures() {
        assert!(matches!(
            generate_failure(413, "<html>too big</html>", "ru"),
            SubGeniusError::FileTooLarge
        ));

        let body = r#"{"error": "Unsupported language: xx", "message": "bad"}"#;
        assert!(matches!(
            generate_failure(400, body, "xx"),
            SubGeniusError::UnsupportedLanguage(code) if code == "xx"
        ));

        let body = r#"{"error": "Invalid file format", "message": "Unsupported file extension: webm"}"#;
        assert_eq!(
            generate_failure(400, body, "ru").to_string(),
            "Unsupported file extension: webm"
        );

        assert_eq!(generate_failure(500, "not json", "ru").to_string(), BACKEND_ERROR);
    }

    #[test]
    fn maps_mux_failures() {
        assert_eq!(
            mux_failure(r#"{"error": "Internal server error", "details": "ffmpeg died"}"#).to_string(),
            "ffmpeg died"
        );
        assert_eq!(mux_failure(r#"{"error": "no subs"}"#).to_string(), "no subs");
        assert_eq!(mux_failure("").to_string(), BACKEND_ERROR);
    }

    #[test]
    fn duration_text_without_number_is_zero() {
        assert_eq!(DurationValue::Text("unknown".into()).seconds(), 0.0);
    }
}
