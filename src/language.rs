//! Language codes accepted by the transcription backend.

use tracing::{debug, warn};

/// Codes known to the backend's Whisper model. `auto` is deliberately absent.
pub const SUPPORTED_LANGUAGES: &[&str] = &[
    "af", "ar", "hy", "az", "be", "bs", "bg", "ca", "zh", "hr", "cs", "da", "nl", "en", "et",
    "fi", "fr", "gl", "de", "el", "he", "hi", "hu", "is", "id", "it", "ja", "kn", "kk", "ko",
    "lv", "lt", "mk", "ms", "mr", "mi", "ne", "no", "fa", "pl", "pt", "ro", "ru", "sr", "sk",
    "sl", "es", "sw", "sv", "tl", "ta", "th", "tr", "uk", "ur", "vi", "cy",
];

/// Substituted for `auto` and for any unsupported code.
pub const FALLBACK_LANGUAGE: &str = "ru";

pub const AUTO_LANGUAGE: &str = "auto";

pub fn is_supported(code: &str) -> bool {
    SUPPORTED_LANGUAGES.contains(&code)
}

/// Outcome of mapping a requested language onto a code the backend accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageResolution {
    pub code: String,
    /// Set when the user asked for something we had to replace.
    pub warning: Option<String>,
}

pub fn resolve_language(requested: &str) -> LanguageResolution {
    if requested == AUTO_LANGUAGE {
        let code = if is_supported(AUTO_LANGUAGE) {
            AUTO_LANGUAGE
        } else {
            FALLBACK_LANGUAGE
        };
        debug!("Language auto-detection requested, sending '{}'", code);
        return LanguageResolution {
            code: code.to_string(),
            warning: None,
        };
    }

    if is_supported(requested) {
        return LanguageResolution {
            code: requested.to_string(),
            warning: None,
        };
    }

    warn!(
        "Language '{}' is not supported, falling back to '{}'",
        requested, FALLBACK_LANGUAGE
    );
    LanguageResolution {
        code: FALLBACK_LANGUAGE.to_string(),
        warning: Some(format!(
            "Language '{}' is not supported. Using Russian.",
            requested
        )),
    }
}
