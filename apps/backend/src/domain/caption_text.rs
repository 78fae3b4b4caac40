//! Caption and display-name text rules.

use lazy_regex::regex;
use unicode_normalization::UnicodeNormalization;

use crate::errors::domain::{DomainError, ValidationKind};

pub const MAX_CAPTION_CHARS: usize = 200;
pub const MAX_DISPLAY_NAME_CHARS: usize = 30;

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Canonical form used to compare judge-echoed captions with the originals:
/// NFKC, lowercase, punctuation removed, whitespace collapsed.
pub fn normalize(text: &str) -> String {
    let folded: String = text.nfkc().collect::<String>().to_lowercase();
    let stripped = regex!(r"[^\w\s]").replace_all(&folded, "");
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Trim and validate a caption; returns the text to store.
pub fn validate_caption(text: &str, max_words: usize) -> Result<String, DomainError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation(
            ValidationKind::EmptyCaption,
            "Caption must not be empty",
        ));
    }
    if trimmed.chars().count() > MAX_CAPTION_CHARS {
        return Err(DomainError::validation(
            ValidationKind::CaptionTooLong,
            format!("Caption exceeds {MAX_CAPTION_CHARS} characters"),
        ));
    }
    let words = word_count(trimmed);
    if words > max_words {
        return Err(DomainError::validation(
            ValidationKind::CaptionTooLong,
            format!("Caption exceeds {max_words} word limit ({words} words)"),
        ));
    }
    Ok(trimmed.to_string())
}

pub fn validate_display_name(name: &str) -> Result<String, DomainError> {
    let trimmed = name.trim();
    let len = trimmed.chars().count();
    if len == 0 || len > MAX_DISPLAY_NAME_CHARS {
        return Err(DomainError::validation(
            ValidationKind::InvalidDisplayName,
            format!("Display name must be 1-{MAX_DISPLAY_NAME_CHARS} characters"),
        ));
    }
    Ok(trimmed.to_string())
}
