//! The upload → transcribe → edit → download workflow.
//!
//! [`WorkflowState`] is the single source of truth for which view is active.
//! It only changes through [`WorkflowState::reduce`]; the [`Controller`]
//! wraps it with the notice banner, loading flags and the backend calls.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::backend::{MuxRequest, SubtitleBackend, VideoUpload};
use crate::error::{Result, SubGeniusError};
use crate::media::{MediaAsset, UploadCandidate};
use crate::notice::{Notice, SAVE_SUCCESS};
use crate::object_url::ObjectUrls;
use crate::request::{BackendParams, TranscriptionRequest};
use crate::subtitle::{Download, SubtitleEditor, SubtitleResult};

#[derive(Debug, Default)]
pub enum WorkflowState {
    #[default]
    Idle,
    HasAsset {
        asset: MediaAsset,
    },
    HasResult {
        asset: MediaAsset,
        result: SubtitleResult,
        editor: SubtitleEditor,
    },
}

#[derive(Debug)]
pub enum Action {
    Upload(MediaAsset),
    GenerateSucceeded(SubtitleResult),
    Save(String),
    Reset,
}

impl Action {
    fn name(&self) -> &'static str {
        match self {
            Self::Upload(_) => "upload",
            Self::GenerateSucceeded(_) => "generate-succeeded",
            Self::Save(_) => "save",
            Self::Reset => "reset",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Upload,
    Player,
    Editor,
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Upload => "upload",
            Self::Player => "player",
            Self::Editor => "editor",
        })
    }
}

impl WorkflowState {
    pub fn reduce(self, action: Action) -> Self {
        match (self, action) {
            (Self::Idle, Action::Upload(asset)) => Self::HasAsset { asset },
            (Self::HasAsset { asset }, Action::GenerateSucceeded(result)) => {
                let editor = SubtitleEditor::new(result.content.clone());
                Self::HasResult {
                    asset,
                    result,
                    editor,
                }
            }
            (
                Self::HasResult {
                    asset,
                    mut result,
                    mut editor,
                },
                Action::Save(content),
            ) => {
                editor.sync(&content);
                result.content = content;
                Self::HasResult {
                    asset,
                    result,
                    editor,
                }
            }
            (_, Action::Reset) => Self::Idle,
            (state, action) => {
                warn!("Ignoring {} while {}", action.name(), state.name());
                state
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::HasAsset { .. } => "has-asset",
            Self::HasResult { .. } => "has-result",
        }
    }

    pub fn view(&self) -> View {
        match self {
            Self::Idle => View::Upload,
            Self::HasAsset { .. } => View::Player,
            Self::HasResult { .. } => View::Editor,
        }
    }

    pub fn asset(&self) -> Option<&MediaAsset> {
        match self {
            Self::Idle => None,
            Self::HasAsset { asset } | Self::HasResult { asset, .. } => Some(asset),
        }
    }

    pub fn result(&self) -> Option<&SubtitleResult> {
        match self {
            Self::HasResult { result, .. } => Some(result),
            _ => None,
        }
    }
}

/// Outcome of a backend call, tagged with the epoch it was started in.
#[derive(Debug)]
pub struct Completed<T> {
    epoch: u64,
    outcome: Result<T>,
}

/// A generation request detached from the controller while it is in flight.
#[derive(Debug)]
pub struct PendingGeneration {
    epoch: u64,
    video: VideoUpload,
    params: BackendParams,
}

impl PendingGeneration {
    pub fn params(&self) -> &BackendParams {
        &self.params
    }

    pub async fn run(self, backend: &dyn SubtitleBackend) -> Completed<SubtitleResult> {
        let outcome = backend.generate_subtitles(&self.video, &self.params).await;
        Completed {
            epoch: self.epoch,
            outcome,
        }
    }
}

#[derive(Debug)]
pub struct PendingVideoDownload {
    epoch: u64,
    video: VideoUpload,
    request: MuxRequest,
}

impl PendingVideoDownload {
    pub fn request(&self) -> &MuxRequest {
        &self.request
    }

    pub async fn run(self, backend: &dyn SubtitleBackend) -> Completed<Vec<u8>> {
        let outcome = backend
            .generate_video_with_subs(&self.video, &self.request)
            .await;
        Completed {
            epoch: self.epoch,
            outcome,
        }
    }
}

pub struct Controller {
    state: WorkflowState,
    notice: Option<Notice>,
    generating: bool,
    downloading_video: bool,
    /// Bumped on reset so late results from before the reset are dropped.
    epoch: u64,
    urls: ObjectUrls,
    backend: Arc<dyn SubtitleBackend>,
    mux_language: String,
}

impl Controller {
    pub fn new(backend: Arc<dyn SubtitleBackend>, mux_language: impl Into<String>) -> Self {
        Self {
            state: WorkflowState::Idle,
            notice: None,
            generating: false,
            downloading_video: false,
            epoch: 0,
            urls: ObjectUrls::new(),
            backend,
            mux_language: mux_language.into(),
        }
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    pub fn view(&self) -> View {
        self.state.view()
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    pub fn is_generating(&self) -> bool {
        self.generating
    }

    pub fn is_downloading_video(&self) -> bool {
        self.downloading_video
    }

    pub fn object_urls(&self) -> &ObjectUrls {
        &self.urls
    }

    pub fn backend(&self) -> Arc<dyn SubtitleBackend> {
        Arc::clone(&self.backend)
    }

    fn dispatch(&mut self, action: Action) {
        let from = self.state.name();
        let state = std::mem::take(&mut self.state);
        self.state = state.reduce(action);
        debug!("Workflow {} -> {}", from, self.state.name());
    }

    /// Accept a confirmed file from the upload view.
    pub fn upload(&mut self, candidate: UploadCandidate) -> Result<()> {
        if !matches!(self.state, WorkflowState::Idle) {
            return Err(SubGeniusError::InvalidState(
                "Reset before uploading another video".to_string(),
            ));
        }
        if !candidate.is_accepted() {
            return Err(SubGeniusError::InvalidFileType {
                name: candidate.name,
                mime: candidate.mime,
            });
        }

        info!("Uploaded {} ({} bytes)", candidate.name, candidate.size);
        self.notice = None;
        let asset = MediaAsset::open(candidate, &self.urls);
        self.dispatch(Action::Upload(asset));
        Ok(())
    }

    pub fn begin_generate(&mut self, request: TranscriptionRequest) -> Result<PendingGeneration> {
        if self.generating {
            return Err(SubGeniusError::Busy);
        }
        let video = match &self.state {
            WorkflowState::HasAsset { asset } => VideoUpload::from(asset),
            WorkflowState::Idle => {
                let err = SubGeniusError::NoMedia;
                self.notice = Some(Notice::from_error(&err));
                return Err(err);
            }
            WorkflowState::HasResult { .. } => {
                return Err(SubGeniusError::InvalidState(
                    "Subtitles were already generated for this video".to_string(),
                ));
            }
        };

        self.notice = None;
        let (params, warning) = request.into_backend_params();
        if let Some(warning) = warning {
            self.notice = Some(Notice::warning(warning));
        }

        self.generating = true;
        info!(
            "Generating {} subtitles for {} (model {}, language {})",
            params.format, video.name, params.model_size, params.language
        );
        Ok(PendingGeneration {
            epoch: self.epoch,
            video,
            params,
        })
    }

    pub fn finish_generate(&mut self, done: Completed<SubtitleResult>) -> Result<()> {
        if done.epoch != self.epoch {
            debug!("Discarding subtitles requested before the last reset");
            return Ok(());
        }

        self.generating = false;
        match done.outcome {
            Ok(result) => {
                self.dispatch(Action::GenerateSucceeded(result));
                Ok(())
            }
            Err(err) => {
                error!("Subtitle generation failed: {}", err);
                self.notice = Some(Notice::from_error(&err));
                Err(err)
            }
        }
    }

    pub async fn generate(&mut self, request: TranscriptionRequest) -> Result<()> {
        let pending = self.begin_generate(request)?;
        let backend = self.backend();
        let done = pending.run(backend.as_ref()).await;
        self.finish_generate(done)
    }

    pub fn editor(&self) -> Option<&SubtitleEditor> {
        match &self.state {
            WorkflowState::HasResult { editor, .. } => Some(editor),
            _ => None,
        }
    }

    pub fn editor_mut(&mut self) -> Option<&mut SubtitleEditor> {
        match &mut self.state {
            WorkflowState::HasResult { editor, .. } => Some(editor),
            _ => None,
        }
    }

    fn require_editor(&mut self) -> Result<&mut SubtitleEditor> {
        self.editor_mut()
            .ok_or_else(|| SubGeniusError::InvalidState("No subtitles to edit".to_string()))
    }

    /// Commit the editor draft and acknowledge it.
    pub fn save_edits(&mut self) -> Result<()> {
        let content = self.require_editor()?.save();
        info!("Saving edited subtitles ({} bytes)", content.len());
        self.dispatch(Action::Save(content));
        self.notice = Some(Notice::info(SAVE_SUCCESS));
        Ok(())
    }

    pub fn cancel_edits(&mut self) -> Result<()> {
        self.require_editor()?.cancel();
        Ok(())
    }

    /// The saved subtitle text as a `subtitles.<format>` download.
    pub fn export_subtitles(&self) -> Result<Download> {
        let result = self
            .state
            .result()
            .ok_or_else(|| SubGeniusError::InvalidState("No subtitles to export".to_string()))?;
        Ok(Download::new(
            result.export_file_name(),
            result.content.clone().into_bytes(),
            &self.urls,
        ))
    }

    pub fn can_download_video(&self) -> bool {
        !self.downloading_video
            && self
                .state
                .result()
                .is_some_and(|result| !result.content.is_empty())
    }

    pub fn begin_video_download(&mut self) -> Result<PendingVideoDownload> {
        if self.downloading_video {
            return Err(SubGeniusError::Busy);
        }
        let (asset, result) = match &self.state {
            WorkflowState::HasResult { asset, result, .. } => (asset, result),
            _ => {
                return Err(SubGeniusError::InvalidState(
                    "Generate subtitles before downloading the video".to_string(),
                ));
            }
        };
        if result.content.is_empty() {
            return Err(SubGeniusError::InvalidState(
                "Subtitle text is empty".to_string(),
            ));
        }

        let pending = PendingVideoDownload {
            epoch: self.epoch,
            video: VideoUpload::from(asset),
            request: MuxRequest {
                subs_content: result.content.clone(),
                subs_format: result.format,
                language: self.mux_language.clone(),
                filename: asset.name.clone(),
            },
        };
        self.downloading_video = true;
        info!("Requesting {} with burned-in subtitles", pending.video.name);
        Ok(pending)
    }

    /// Returns `None` when the download belongs to a workflow that was reset.
    pub fn finish_video_download(&mut self, done: Completed<Vec<u8>>) -> Result<Option<Download>> {
        if done.epoch != self.epoch {
            debug!("Discarding video requested before the last reset");
            return Ok(None);
        }

        self.downloading_video = false;
        match done.outcome {
            Ok(bytes) => {
                let name = self
                    .state
                    .asset()
                    .map(|asset| format!("with_subs_{}", asset.name))
                    .unwrap_or_else(|| "with_subs_video.mp4".to_string());
                Ok(Some(Download::new(name, bytes, &self.urls)))
            }
            Err(err) => {
                error!("Video download failed: {}", err);
                self.notice = Some(Notice::from_error(&err));
                Err(err)
            }
        }
    }

    pub async fn download_video_with_subtitles(&mut self) -> Result<Option<Download>> {
        let pending = self.begin_video_download()?;
        let backend = self.backend();
        let done = pending.run(backend.as_ref()).await;
        self.finish_video_download(done)
    }

    /// Back to the upload view from anywhere, releasing the media reference.
    pub fn reset(&mut self) {
        self.epoch += 1;
        self.dispatch(Action::Reset);
        self.notice = None;
        self.generating = false;
        self.downloading_video = false;
        info!("Workflow reset");
    }
}
