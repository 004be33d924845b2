// reqwest implementation of the subtitle backend

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client};
use std::time::Duration;
use tracing::{debug, error, info};

use super::response::{self, GenerateResponse, HealthReport};
use super::{MuxRequest, SubtitleBackend, VideoUpload};
use crate::config::BackendConfig;
use crate::error::{Result, SubGeniusError};
use crate::notice::PROCESSING_ERROR;
use crate::request::BackendParams;
use crate::subtitle::SubtitleResult;

pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Streams the file rather than loading it into memory.
    async fn video_part(video: &VideoUpload) -> Result<Part> {
        let file = tokio::fs::File::open(&video.path)
            .await
            .map_err(|_| SubGeniusError::FileNotFound(video.path.display().to_string()))?;

        let length = file.metadata().await?.len();
        if length != video.size {
            debug!(
                "{} is {} bytes on disk, {} when selected",
                video.name, length, video.size
            );
        }

        let part = Part::stream_with_length(Body::from(file), length)
            .file_name(video.name.clone())
            .mime_str(&video.mime)?;
        Ok(part)
    }

    async fn build_form(
        video: &VideoUpload,
        fields: Vec<(&'static str, String)>,
    ) -> Result<Form> {
        let mut form = Form::new().part("video", Self::video_part(video).await?);
        for (name, value) in fields {
            form = form.text(name, value);
        }
        Ok(form)
    }
}

#[async_trait]
impl SubtitleBackend for HttpBackend {
    async fn generate_subtitles(
        &self,
        video: &VideoUpload,
        params: &BackendParams,
    ) -> Result<SubtitleResult> {
        let url = self.endpoint("generate-subtitles");
        info!(
            "Requesting subtitles for {} ({} bytes) from {}",
            video.name, video.size, url
        );
        debug!("Transcription parameters: {:?}", params);

        let form = Self::build_form(video, params.form_fields()).await?;
        let response = self.client.post(&url).multipart(form).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Subtitle generation failed with {}: {}", status, body);
            return Err(response::generate_failure(
                status.as_u16(),
                &body,
                &params.language,
            ));
        }

        let body: GenerateResponse = response.json().await.map_err(|e| {
            error!("Malformed subtitle response: {}", e);
            SubGeniusError::Processing(PROCESSING_ERROR.to_string())
        })?;

        let result = body.into_result()?;
        info!(
            "Received {} subtitles: {} segments, {:.2}s",
            result.format, result.segments_count, result.duration
        );
        Ok(result)
    }

    async fn generate_video_with_subs(
        &self,
        video: &VideoUpload,
        request: &MuxRequest,
    ) -> Result<Vec<u8>> {
        let url = self.endpoint("generate-video-with-subs");
        info!("Requesting video with subtitles for {} from {}", video.name, url);

        let form = Self::build_form(video, request.form_fields()).await?;
        let response = self.client.post(&url).multipart(form).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Video generation failed with {}: {}", status, body);
            return Err(response::mux_failure(&body));
        }

        let bytes = response.bytes().await?;
        info!("Received video with subtitles ({} bytes)", bytes.len());
        Ok(bytes.to_vec())
    }

    async fn health(&self) -> Result<HealthReport> {
        let url = self.endpoint("health");
        debug!("Checking backend health at {}", url);

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SubGeniusError::Backend(format!(
                "Health check returned {}",
                status
            )));
        }
        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{ModelSize, SubtitleFormat};
    use axum::{
        extract::{Multipart, State},
        http::StatusCode,
        response::IntoResponse,
        routing::{get, post},
        Json, Router,
    };
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::net::TcpListener;
    use tokio::sync::Mutex;

    /// Text fields and the uploaded video as the server saw them.
    #[derive(Debug, Default, Clone)]
    struct Received {
        fields: HashMap<String, String>,
        video_name: Option<String>,
        video_type: Option<String>,
        video_bytes: Vec<u8>,
    }

    #[derive(Clone, Default)]
    struct ServerState {
        received: Arc<Mutex<Option<Received>>>,
    }

    async fn read_multipart(mut multipart: Multipart) -> Received {
        let mut received = Received::default();
        while let Some(field) = multipart.next_field().await.unwrap() {
            let name = field.name().unwrap_or_default().to_string();
            if name == "video" {
                received.video_name = field.file_name().map(str::to_string);
                received.video_type = field.content_type().map(str::to_string);
                received.video_bytes = field.bytes().await.unwrap().to_vec();
            } else {
                received.fields.insert(name, field.text().await.unwrap());
            }
        }
        received
    }

    async fn generate_ok(State(state): State<ServerState>, multipart: Multipart) -> impl IntoResponse {
        let received = read_multipart(multipart).await;
        let format = received.fields.get("format").cloned().unwrap_or_default();
        *state.received.lock().await = Some(received);
        Json(serde_json::json!({
            "success": true,
            "duration": "61.50 seconds",
            "segments_count": 2,
            "format": format,
            "content": "1\n00:00:00,000 --> 00:00:01,000\n[SPEAKER_1] Привет\n\n",
        }))
    }

    async fn too_large(multipart: Multipart) -> impl IntoResponse {
        let _ = read_multipart(multipart).await;
        (StatusCode::PAYLOAD_TOO_LARGE, "Request Entity Too Large")
    }

    async fn unsupported_language(multipart: Multipart) -> impl IntoResponse {
        let _ = read_multipart(multipart).await;
        (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": "Unsupported language", "message": "no"})),
        )
    }

    async fn mux_ok(State(state): State<ServerState>, multipart: Multipart) -> impl IntoResponse {
        let received = read_multipart(multipart).await;
        *state.received.lock().await = Some(received);
        ([("content-type", "video/mp4")], b"MUXED-VIDEO".to_vec())
    }

    async fn mux_failed(multipart: Multipart) -> impl IntoResponse {
        let _ = read_multipart(multipart).await;
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"error": "Internal server error", "details": "ffmpeg exited with 1"})),
        )
    }

    async fn health_ok() -> impl IntoResponse {
        Json(serde_json::json!({
            "status": "OK",
            "models_loaded": [{"size": "base", "loaded": true}, {"size": "medium", "loaded": false}],
            "python_environment": {"whisper_version": "unknown"}
        }))
    }

    async fn spawn_backend(router: Router<ServerState>) -> (String, ServerState) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let state = ServerState::default();
        let app = router.with_state(state.clone());
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        (format!("http://{addr}"), state)
    }

    fn backend(url: &str) -> HttpBackend {
        let mut backend = HttpBackend::new(&BackendConfig {
            url: format!("{}/", url),
            timeout_secs: 10,
            mux_language: "rus".to_string(),
        })
        .unwrap();
        assert_eq!(backend.base_url, url);
        backend.client = Client::builder().no_proxy().build().unwrap();
        backend
    }

    fn video_fixture(dir: &tempfile::TempDir) -> VideoUpload {
        let path = dir.path().join("video.mp4");
        std::fs::write(&path, b"fake mp4 payload").unwrap();
        VideoUpload {
            path,
            name: "video.mp4".to_string(),
            mime: "video/mp4".to_string(),
            size: 16,
        }
    }

    fn params(language: &str) -> BackendParams {
        BackendParams {
            model_size: ModelSize::Medium,
            language: language.to_string(),
            format: SubtitleFormat::Srt,
            num_speakers: 3,
            translate: false,
        }
    }

    #[tokio::test]
    async fn sends_multipart_and_parses_subtitles() {
        let (url, state) =
            spawn_backend(Router::new().route("/generate-subtitles", post(generate_ok))).await;
        let dir = tempfile::tempdir().unwrap();
        let video = video_fixture(&dir);

        let result = backend(&url)
            .generate_subtitles(&video, &params("en"))
            .await
            .unwrap();

        assert_eq!(result.segments_count, 2);
        assert!((result.duration - 61.5).abs() < 1e-9);
        assert!(result.content.contains("Привет"));

        let received = state.received.lock().await.clone().unwrap();
        assert_eq!(received.fields["model_size"], "medium");
        assert_eq!(received.fields["language"], "en");
        assert_eq!(received.fields["format"], "srt");
        assert_eq!(received.fields["num_speakers"], "3");
        assert_eq!(received.fields["translate"], "false");
        assert_eq!(received.video_name.as_deref(), Some("video.mp4"));
        assert_eq!(received.video_type.as_deref(), Some("video/mp4"));
        assert_eq!(received.video_bytes, b"fake mp4 payload");
    }

    #[tokio::test]
    async fn declared_length_follows_file_on_disk() {
        let (url, state) =
            spawn_backend(Router::new().route("/generate-subtitles", post(generate_ok))).await;
        let dir = tempfile::tempdir().unwrap();
        let mut video = video_fixture(&dir);
        std::fs::write(&video.path, b"a longer payload written after selection").unwrap();
        video.size = 4;

        backend(&url)
            .generate_subtitles(&video, &params("ru"))
            .await
            .unwrap();

        let received = state.received.lock().await.clone().unwrap();
        assert_eq!(
            received.video_bytes,
            b"a longer payload written after selection"
        );
    }

    #[tokio::test]
    async fn payload_too_large_maps_to_size_error() {
        let (url, _) =
            spawn_backend(Router::new().route("/generate-subtitles", post(too_large))).await;
        let dir = tempfile::tempdir().unwrap();

        let err = backend(&url)
            .generate_subtitles(&video_fixture(&dir), &params("ru"))
            .await
            .unwrap_err();
        assert!(matches!(err, SubGeniusError::FileTooLarge));
        assert_eq!(err.to_string(), "File too large! Maximum size: 5 GB");
    }

    #[tokio::test]
    async fn unsupported_language_names_the_code() {
        let (url, _) = spawn_backend(
            Router::new().route("/generate-subtitles", post(unsupported_language)),
        )
        .await;
        let dir = tempfile::tempdir().unwrap();

        let err = backend(&url)
            .generate_subtitles(&video_fixture(&dir), &params("ru"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Unsupported language: ru");
    }

    #[tokio::test]
    async fn mux_returns_blob() {
        let (url, state) =
            spawn_backend(Router::new().route("/generate-video-with-subs", post(mux_ok))).await;
        let dir = tempfile::tempdir().unwrap();
        let request = MuxRequest {
            subs_content: "WEBVTT\n".to_string(),
            subs_format: SubtitleFormat::Vtt,
            language: "rus".to_string(),
            filename: "video.mp4".to_string(),
        };

        let bytes = backend(&url)
            .generate_video_with_subs(&video_fixture(&dir), &request)
            .await
            .unwrap();
        assert_eq!(bytes, b"MUXED-VIDEO");

        let received = state.received.lock().await.clone().unwrap();
        assert_eq!(received.fields["subs_content"], "WEBVTT\n");
        assert_eq!(received.fields["subs_format"], "vtt");
        assert_eq!(received.fields["language"], "rus");
        assert_eq!(received.fields["filename"], "video.mp4");
    }

    #[tokio::test]
    async fn mux_failure_surfaces_details() {
        let (url, _) =
            spawn_backend(Router::new().route("/generate-video-with-subs", post(mux_failed))).await;
        let dir = tempfile::tempdir().unwrap();
        let request = MuxRequest {
            subs_content: "x".to_string(),
            subs_format: SubtitleFormat::Srt,
            language: "rus".to_string(),
            filename: "video.mp4".to_string(),
        };

        let err = backend(&url)
            .generate_video_with_subs(&video_fixture(&dir), &request)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "ffmpeg exited with 1");
    }

    #[tokio::test]
    async fn reads_health_report() {
        let (url, _) = spawn_backend(Router::new().route("/health", get(health_ok))).await;

        let report = backend(&url).health().await.unwrap();
        assert_eq!(report.status, "OK");
        assert_eq!(report.models_loaded.len(), 2);
        assert!(report.models_loaded[0].loaded);
    }

    #[tokio::test]
    async fn missing_video_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let mut video = video_fixture(&dir);
        video.path = dir.path().join("gone.mp4");

        let err = backend("http://127.0.0.1:9")
            .generate_subtitles(&video, &params("ru"))
            .await
            .unwrap_err();
        assert!(matches!(err, SubGeniusError::FileNotFound(_)));
    }
}
