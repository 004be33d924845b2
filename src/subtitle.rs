use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, info};

use crate::error::{Result, SubGeniusError};
use crate::object_url::{ObjectSource, ObjectUrl, ObjectUrls};
use crate::request::SubtitleFormat;

/// Subtitles returned by the backend, later changed only by user edits.
#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleResult {
    pub content: String,
    pub format: SubtitleFormat,
    /// Seconds of transcribed media.
    pub duration: f64,
    pub segments_count: u64,
}

impl SubtitleResult {
    /// Name used when exporting the text, e.g. `subtitles.srt`.
    pub fn export_file_name(&self) -> String {
        format!("subtitles.{}", self.format)
    }
}

/// Review and edit state for the subtitle text.
///
/// `saved` is the snapshot last committed to the workflow, `draft` what the
/// text area currently shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleEditor {
    saved: String,
    draft: String,
    editing: bool,
}

impl SubtitleEditor {
    pub fn new(content: impl Into<String>) -> Self {
        let content = content.into();
        Self {
            saved: content.clone(),
            draft: content,
            editing: false,
        }
    }

    pub fn is_editing(&self) -> bool {
        self.editing
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn saved(&self) -> &str {
        &self.saved
    }

    pub fn is_dirty(&self) -> bool {
        self.draft != self.saved
    }

    pub fn toggle_edit(&mut self) {
        self.editing = !self.editing;
    }

    /// Replace the draft. Read-only outside edit mode.
    pub fn set_draft(&mut self, text: impl Into<String>) -> Result<()> {
        if !self.editing {
            return Err(SubGeniusError::InvalidState(
                "Subtitle text is read-only until editing is enabled".to_string(),
            ));
        }
        self.draft = text.into();
        Ok(())
    }

    /// Leave edit mode and return the text to commit.
    pub fn save(&mut self) -> String {
        self.editing = false;
        self.draft.clone()
    }

    /// Revert the draft to the last saved snapshot.
    pub fn cancel(&mut self) {
        self.draft = self.saved.clone();
        self.editing = false;
    }

    /// Called when the committed content changes upstream.
    pub fn sync(&mut self, content: &str) {
        self.saved = content.to_string();
        self.draft = content.to_string();
    }
}

/// A downloadable blob held behind an object URL until it is dropped.
#[derive(Debug)]
pub struct Download {
    pub file_name: String,
    url: ObjectUrl,
    urls: ObjectUrls,
}

impl Download {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>, urls: &ObjectUrls) -> Self {
        Self {
            file_name: file_name.into(),
            url: urls.create_for_blob(bytes),
            urls: urls.clone(),
        }
    }

    pub fn url(&self) -> &ObjectUrl {
        &self.url
    }

    pub fn bytes(&self) -> Result<Vec<u8>> {
        match self.urls.resolve(&self.url)? {
            ObjectSource::Blob(bytes) => Ok(bytes.as_ref().clone()),
            ObjectSource::File(path) => Err(SubGeniusError::InvalidState(format!(
                "{} points at {} rather than a blob",
                self.url,
                path.display()
            ))),
        }
    }

    /// Write the blob into `dir` under its file name and release the URL.
    pub async fn save_into<P: AsRef<Path>>(self, dir: P) -> Result<PathBuf> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).await?;
        let target = dir.join(&self.file_name);
        let bytes = self.bytes()?;
        debug!("Writing {} bytes from {}", bytes.len(), self.url);
        fs::write(&target, bytes).await?;
        info!("Saved {}", target.display());
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_restores_saved_snapshot() {
        let mut editor = SubtitleEditor::new("1\n00:00:00,000 --> 00:00:01,000\nhi\n");
        assert!(editor.set_draft("nope").is_err());

        editor.toggle_edit();
        editor.set_draft("changed").unwrap();
        assert!(editor.is_dirty());

        editor.cancel();
        assert!(!editor.is_editing());
        assert_eq!(editor.draft(), editor.saved());
    }

    #[test]
    fn save_returns_draft_and_leaves_edit_mode() {
        let mut editor = SubtitleEditor::new("old");
        editor.toggle_edit();
        editor.set_draft("new").unwrap();
        assert_eq!(editor.save(), "new");
        assert!(!editor.is_editing());

        editor.sync("new");
        assert!(!editor.is_dirty());
    }

    #[test]
    fn export_name_follows_format() {
        let result = SubtitleResult {
            content: String::new(),
            format: SubtitleFormat::Vtt,
            duration: 0.0,
            segments_count: 0,
        };
        assert_eq!(result.export_file_name(), "subtitles.vtt");
    }

    #[tokio::test]
    async fn download_writes_exact_bytes_and_revokes() {
        let urls = ObjectUrls::new();
        let dir = tempfile::tempdir().unwrap();
        let bytes = "Привет\r\nworld\u{feff}".as_bytes().to_vec();

        let download = Download::new("subtitles.txt", bytes.clone(), &urls);
        assert_eq!(urls.live(), 1);

        let path = download.save_into(dir.path()).await.unwrap();
        assert_eq!(std::fs::read(path).unwrap(), bytes);
        assert_eq!(urls.live(), 0);
    }
}
