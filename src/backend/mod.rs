// Backend access
//
// The transcription service is an external HTTP collaborator. Everything the
// workflow needs from it goes through the `SubtitleBackend` trait:
// - http: reqwest multipart implementation
// - response: wire formats and the mapping of failures to user messages

pub mod http;
pub mod response;

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;

pub use response::{HealthReport, ModelStatus};

use crate::config::BackendConfig;
use crate::error::Result;
use crate::media::MediaAsset;
use crate::request::{BackendParams, SubtitleFormat};
use crate::subtitle::SubtitleResult;

/// The video file as it is sent in the `video` multipart part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoUpload {
    pub path: PathBuf,
    pub name: String,
    pub mime: String,
    pub size: u64,
}

impl From<&MediaAsset> for VideoUpload {
    fn from(asset: &MediaAsset) -> Self {
        Self {
            path: asset.path.clone(),
            name: asset.name.clone(),
            mime: asset.mime.clone(),
            size: asset.size,
        }
    }
}

/// Form fields of `POST /generate-video-with-subs` besides the video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MuxRequest {
    pub subs_content: String,
    pub subs_format: SubtitleFormat,
    pub language: String,
    pub filename: String,
}

impl MuxRequest {
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("subs_content", self.subs_content.clone()),
            ("subs_format", self.subs_format.as_str().to_string()),
            ("language", self.language.clone()),
            ("filename", self.filename.clone()),
        ]
    }
}

#[async_trait]
pub trait SubtitleBackend: Send + Sync {
    /// Transcribe the video into subtitles.
    async fn generate_subtitles(
        &self,
        video: &VideoUpload,
        params: &BackendParams,
    ) -> Result<SubtitleResult>;

    /// Re-encode the video with the subtitles burned in; returns the file bytes.
    async fn generate_video_with_subs(
        &self,
        video: &VideoUpload,
        request: &MuxRequest,
    ) -> Result<Vec<u8>>;

    /// Service status and loaded models.
    async fn health(&self) -> Result<HealthReport>;
}

pub struct BackendFactory;

impl BackendFactory {
    pub fn create_http(config: &BackendConfig) -> Result<Arc<dyn SubtitleBackend>> {
        Ok(Arc::new(http::HttpBackend::new(config)?))
    }
}
