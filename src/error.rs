use thiserror::Error;

#[derive(Error, Debug)]
pub enum SubGeniusError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unsupported file type '{mime}' for {name}")]
    InvalidFileType { name: String, mime: String },

    #[error("Unsupported format: .{0}")]
    UnsupportedExtension(String),

    #[error("File too large! Maximum size: 5 GB")]
    FileTooLarge,

    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    /// Non-success response from the backend, carrying its user-facing message.
    #[error("{0}")]
    Backend(String),

    /// The backend answered 2xx but without usable subtitles.
    #[error("{0}")]
    Processing(String),

    #[error("Upload a video to process")]
    NoMedia,

    #[error("Another request is already in progress")]
    Busy,

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File not found: {0}")]
    FileNotFound(String),
}

pub type Result<T> = std::result::Result<T, SubGeniusError>;
