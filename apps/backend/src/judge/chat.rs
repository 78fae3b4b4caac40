//! Judge backed by an OpenAI-compatible chat completions endpoint.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::{CaptionForJudging, Judge, JudgeError, JudgedCaption};

const SYSTEM_PROMPT: &str = "You are a brutally honest but hilarious judge of cat meme captions. \
Rate each caption for HUMOUR (0-10) and RELEVANCE to the image (0-10). Be ruthless and avoid ties. \
Add a short snarky roast (1-2 sentences) for each caption.";

pub struct ChatJudge {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl ChatJudge {
    pub fn new(
        api_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, JudgeError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| JudgeError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            api_url: api_url.into(),
            api_key: api_key.into(),
            model: model.into(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.api_url.trim_end_matches('/'))
    }
}

pub(crate) fn build_prompt(image_url: &str, captions: &[CaptionForJudging]) -> String {
    let listing = captions
        .iter()
        .enumerate()
        .map(|(i, c)| {
            format!(
                "{}. Player: \"{}\" - Caption: \"{}\"",
                i + 1,
                c.display_name,
                c.text
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Image: {image_url}\n\nHere are the captions to judge:\n\n{listing}\n\n\
Respond with ONLY valid JSON in this exact format:\n\
{{\"results\": [{{\"player_name\": \"name exactly as given\", \"caption\": \"caption exactly as given\", \
\"humour\": 7, \"relevance\": 5, \"roast_comment\": \"...\"}}]}}\n\
Include ALL captions, in the same order as given."
    )
}

/// Strip a surrounding Markdown code fence, with or without a language tag.
pub(crate) fn strip_code_fence(raw: &str) -> &str {
    let mut text = raw.trim();
    if let Some(rest) = text.strip_prefix("```") {
        text = rest.strip_prefix("json").unwrap_or(rest);
    }
    if let Some(rest) = text.strip_suffix("```") {
        text = rest;
    }
    text.trim()
}

#[derive(Deserialize)]
struct ResultsEnvelope {
    results: Vec<RawResult>,
}

#[derive(Deserialize)]
struct RawResult {
    #[serde(default)]
    player_name: String,
    #[serde(default)]
    caption: String,
    humour: Option<f64>,
    relevance: Option<f64>,
    /// Single-score replies; applied to both components.
    score: Option<f64>,
    #[serde(default)]
    roast_comment: String,
}

pub(crate) fn parse_results(content: &str) -> Result<Vec<JudgedCaption>, JudgeError> {
    let envelope: ResultsEnvelope = serde_json::from_str(strip_code_fence(content))
        .map_err(|e| JudgeError::Parse(e.to_string()))?;

    Ok(envelope
        .results
        .into_iter()
        .map(|r| {
            let component = |v: Option<f64>| v.or(r.score).map_or(0, |n| n.round() as i64);
            JudgedCaption {
                humour: component(r.humour),
                relevance: component(r.relevance),
                display_name: r.player_name,
                text: r.caption,
                roast: r.roast_comment,
            }
        })
        .collect())
}

#[async_trait]
impl Judge for ChatJudge {
    async fn judge(
        &self,
        image_url: &str,
        captions: &[CaptionForJudging],
    ) -> Result<Vec<JudgedCaption>, JudgeError> {
        if captions.is_empty() {
            return Ok(Vec::new());
        }

        let body = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": build_prompt(image_url, captions)},
            ],
            "temperature": 0.7,
        });

        let resp = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| JudgeError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(JudgeError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let json: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| JudgeError::Parse(e.to_string()))?;
        let content = json
            .pointer("/choices/0/message/content")
            .and_then(|v| v.as_str())
            .ok_or_else(|| JudgeError::Parse("response missing message content".into()))?;

        let results = parse_results(content)?;
        debug!(
            submitted = captions.len(),
            returned = results.len(),
            "Judge responded"
        );
        Ok(results)
    }
}
