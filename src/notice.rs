//! User-facing messages and the banner that carries them.

use std::fmt;

use crate::error::SubGeniusError;

pub const UPLOAD_TYPE_ERROR: &str = "Please choose an MP4, AVI or MOV file";
pub const SAVE_SUCCESS: &str = "Changes saved successfully!";
pub const BACKEND_ERROR: &str = "Server-side error";
pub const PROCESSING_ERROR: &str = "Video processing error";
pub const DEFAULT_ERROR: &str = "An error occurred while processing the video.";
pub const GENERATING: &str = "Generating subtitles...";
pub const DOWNLOADING_VIDEO: &str = "Downloading video...";
pub const RESET_ACTION: &str = "New video";
pub const FORMATS_HINT: &str = "Formats: MP4, AVI, MOV";
pub const MAX_SIZE_HINT: &str = "Max size: 5 GB";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    /// Whether the banner offers the "New video" reset action.
    pub offers_reset: bool,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
            offers_reset: false,
        }
    }

    /// A warning that stays on the banner next to the reset action.
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
            offers_reset: true,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
            offers_reset: true,
        }
    }

    /// A validation error the user closes with "OK".
    pub fn dismissible(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
            offers_reset: false,
        }
    }

    pub fn from_error(err: &SubGeniusError) -> Self {
        let message = err.to_string();
        if message.trim().is_empty() {
            Self::error(DEFAULT_ERROR)
        } else {
            Self::error(message)
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.level {
            NoticeLevel::Info => "info",
            NoticeLevel::Warning => "warning",
            NoticeLevel::Error => "error",
        };
        if self.offers_reset {
            write!(f, "[{}] {} ({})", tag, self.message, RESET_ACTION)
        } else {
            write!(f, "[{}] {}", tag, self.message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_become_reset_banners() {
        let notice = Notice::from_error(&SubGeniusError::FileTooLarge);
        assert_eq!(notice.level, NoticeLevel::Error);
        assert!(notice.offers_reset);
        assert_eq!(notice.message, "File too large! Maximum size: 5 GB");
        assert_eq!(
            notice.to_string(),
            "[error] File too large! Maximum size: 5 GB (New video)"
        );
    }

    #[test]
    fn empty_backend_message_uses_default() {
        let notice = Notice::from_error(&SubGeniusError::Backend(String::new()));
        assert_eq!(notice.message, DEFAULT_ERROR);
    }
}
