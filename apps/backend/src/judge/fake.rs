use async_trait::async_trait;

use super::{CaptionForJudging, Judge, JudgeError, JudgedCaption};
use crate::domain::fallback_scorer::fallback_score;

/// Offline judge: echoes every caption back in order, scored by the
/// deterministic fallback scorer.
#[derive(Debug, Default, Clone)]
pub struct FakeJudge;

#[async_trait]
impl Judge for FakeJudge {
    async fn judge(
        &self,
        _image_url: &str,
        captions: &[CaptionForJudging],
    ) -> Result<Vec<JudgedCaption>, JudgeError> {
        Ok(captions
            .iter()
            .map(|c| {
                let score = fallback_score(&c.text);
                JudgedCaption {
                    display_name: c.display_name.clone(),
                    text: c.text.clone(),
                    humour: i64::from(score.humour),
                    relevance: i64::from(score.relevance),
                    roast: score.roast,
                }
            })
            .collect())
    }
}
