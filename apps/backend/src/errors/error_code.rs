//! Error codes for the cagematch API.
//!
//! Add new codes here; never pass ad-hoc strings as error codes.
//! All codes are SCREAMING_SNAKE_CASE and map 1:1 to the strings
//! that appear in HTTP responses.

use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Authentication & Authorization
    /// Missing, malformed, or expired player token
    Unauthorized,
    /// Token is valid but names a player outside the session
    NotAMember,
    /// Operation is restricted to the session host
    NotHost,

    // Request Validation
    /// Caption text is empty after trimming
    EmptyCaption,
    /// Caption exceeds the word or character limit
    CaptionTooLong,
    /// Display name is empty or too long
    InvalidDisplayName,
    /// Session settings are out of range
    InvalidSettings,
    /// Session code is not 6 alphanumeric characters
    InvalidSessionCode,
    /// General validation error
    ValidationError,

    // Resource Not Found
    SessionNotFound,
    RoundNotFound,
    PlayerNotFound,
    NotFound,

    // Business Logic Conflicts
    /// Operation not legal in the session's current status
    IllegalTransition,
    /// Player already submitted a caption for this round
    DuplicateSubmission,
    /// All configured rounds have been played
    RoundsExhausted,
    /// Round is not the session's active round
    RoundMismatch,
    /// No free session code could be generated
    SessionCodeConflict,
    Conflict,

    // System Errors
    /// Judge or image source failure
    UpstreamUnavailable,
    DbError,
    DbUnavailable,
    DbTimeout,
    DataCorruption,
    Internal,
    ConfigError,
}

impl ErrorCode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unauthorized => "UNAUTHORIZED",
            Self::NotAMember => "NOT_A_MEMBER",
            Self::NotHost => "NOT_HOST",
            Self::EmptyCaption => "EMPTY_CAPTION",
            Self::CaptionTooLong => "CAPTION_TOO_LONG",
            Self::InvalidDisplayName => "INVALID_DISPLAY_NAME",
            Self::InvalidSettings => "INVALID_SETTINGS",
            Self::InvalidSessionCode => "INVALID_SESSION_CODE",
            Self::ValidationError => "VALIDATION_ERROR",
            Self::SessionNotFound => "SESSION_NOT_FOUND",
            Self::RoundNotFound => "ROUND_NOT_FOUND",
            Self::PlayerNotFound => "PLAYER_NOT_FOUND",
            Self::NotFound => "NOT_FOUND",
            Self::IllegalTransition => "ILLEGAL_TRANSITION",
            Self::DuplicateSubmission => "DUPLICATE_SUBMISSION",
            Self::RoundsExhausted => "ROUNDS_EXHAUSTED",
            Self::RoundMismatch => "ROUND_MISMATCH",
            Self::SessionCodeConflict => "SESSION_CODE_CONFLICT",
            Self::Conflict => "CONFLICT",
            Self::UpstreamUnavailable => "UPSTREAM_UNAVAILABLE",
            Self::DbError => "DB_ERROR",
            Self::DbUnavailable => "DB_UNAVAILABLE",
            Self::DbTimeout => "DB_TIMEOUT",
            Self::DataCorruption => "DATA_CORRUPTION",
            Self::Internal => "INTERNAL",
            Self::ConfigError => "CONFIG_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
