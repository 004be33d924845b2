//! Video intake: MIME validation, the upload panel and the media asset.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::{Result, SubGeniusError};
use crate::notice::{Notice, UPLOAD_TYPE_ERROR};
use crate::object_url::{ObjectUrl, ObjectUrls};

/// MIME types the upload panel accepts.
pub const ACCEPTED_MIME_TYPES: &[&str] = &["video/mp4", "video/avi", "video/quicktime"];

/// Guess a MIME type from the file extension, as a browser file picker would.
pub fn mime_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "mp4" | "m4v" => "video/mp4",
        "avi" => "video/avi",
        "mov" | "qt" => "video/quicktime",
        "mkv" => "video/x-matroska",
        "webm" => "video/webm",
        _ => "application/octet-stream",
    }
}

/// Last dot-separated part of a file name, lowercased; empty when there is none.
pub fn file_extension(name: &str) -> String {
    match name.rsplit_once('.') {
        Some((_, ext)) => ext.to_lowercase(),
        None => String::new(),
    }
}

/// A file offered to the upload panel, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadCandidate {
    pub path: PathBuf,
    pub name: String,
    pub mime: String,
    pub size: u64,
}

impl UploadCandidate {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let metadata = std::fs::metadata(path)
            .map_err(|_| SubGeniusError::FileNotFound(path.display().to_string()))?;
        if !metadata.is_file() {
            return Err(SubGeniusError::FileNotFound(path.display().to_string()));
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| SubGeniusError::FileNotFound(path.display().to_string()))?;

        Ok(Self {
            path: path.to_path_buf(),
            name,
            mime: mime_for_path(path).to_string(),
            size: metadata.len(),
        })
    }

    pub fn is_accepted(&self) -> bool {
        ACCEPTED_MIME_TYPES.contains(&self.mime.as_str())
    }

    /// Size in whole megabytes, rounded.
    pub fn size_mb(&self) -> u64 {
        (self.size as f64 / 1024.0 / 1024.0).round() as u64
    }
}

/// Local state of the upload view: a selected file and a dismissible notice.
#[derive(Debug, Default)]
pub struct UploadPanel {
    selected: Option<UploadCandidate>,
    notice: Option<Notice>,
}

impl UploadPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handles both picker selection and drag-drop.
    pub fn select(&mut self, candidate: UploadCandidate) -> Result<()> {
        if !candidate.is_accepted() {
            warn!(
                "Rejected {} with MIME type {}",
                candidate.name, candidate.mime
            );
            self.notice = Some(Notice::dismissible(UPLOAD_TYPE_ERROR));
            return Err(SubGeniusError::InvalidFileType {
                name: candidate.name,
                mime: candidate.mime,
            });
        }

        info!("Selected {} ({} MB)", candidate.name, candidate.size_mb());
        self.selected = Some(candidate);
        self.notice = None;
        Ok(())
    }

    pub fn remove(&mut self) {
        self.selected = None;
        self.notice = None;
    }

    pub fn dismiss(&mut self) {
        self.notice = None;
    }

    pub fn selected(&self) -> Option<&UploadCandidate> {
        self.selected.as_ref()
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn can_confirm(&self) -> bool {
        self.selected.is_some()
    }

    /// Hands the selection upward, leaving the panel empty.
    pub fn confirm(&mut self) -> Option<UploadCandidate> {
        self.selected.take()
    }
}

/// The confirmed video together with its playable local reference.
#[derive(Debug)]
pub struct MediaAsset {
    pub path: PathBuf,
    pub name: String,
    pub mime: String,
    pub size: u64,
    preview: ObjectUrl,
}

impl MediaAsset {
    pub fn open(candidate: UploadCandidate, urls: &ObjectUrls) -> Self {
        let preview = urls.create_for_file(&candidate.path);
        Self {
            path: candidate.path,
            name: candidate.name,
            mime: candidate.mime,
            size: candidate.size,
            preview,
        }
    }

    pub fn preview_url(&self) -> &ObjectUrl {
        &self.preview
    }

    pub fn extension(&self) -> String {
        file_extension(&self.name)
    }
}
