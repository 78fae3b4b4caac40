//! Caption judges. A judge sees the image and each caption's display name
//! and text, never player ids.

use async_trait::async_trait;
use thiserror::Error;

pub use crate::domain::reconcile::JudgedCaption;

pub mod chat;
pub mod fake;

pub use chat::ChatJudge;
pub use fake::FakeJudge;

/// What the judge is shown for one caption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptionForJudging {
    pub display_name: String,
    pub text: String,
}

#[derive(Debug, Error)]
pub enum JudgeError {
    #[error("judge request failed: {0}")]
    Transport(String),
    #[error("judge returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("judge response unparsable: {0}")]
    Parse(String),
}

#[async_trait]
pub trait Judge: Send + Sync {
    async fn judge(
        &self,
        image_url: &str,
        captions: &[CaptionForJudging],
    ) -> Result<Vec<JudgedCaption>, JudgeError>;
}
