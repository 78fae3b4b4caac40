//! Re-attaching judge output to the players who wrote the captions.
//!
//! The judge only ever sees display names and caption text. It may reorder
//! results, paraphrase the text it echoes back, drop entries, or invent
//! extras, and display names are not unique within a session. Each judge
//! result walks a matching cascade, and each original submission is bound
//! at most once:
//!
//! 1. positional: result `i` and original `i` share a display name
//! 2. exact: an unbound original with the same (name, text)
//! 3. normalized: an unbound original with the same (name, normalized text)
//! 4. name only: the first unbound original with the same name
//!
//! Results that match nothing are dropped. Step 4 is a best-effort guess
//! when two players share a name and the judge rewrote both captions.
//! Originals left unbound are scored with [`fallback_score`], so the output
//! always has exactly one score per original submission.

use tracing::debug;

use crate::domain::caption_text::normalize;
use crate::domain::fallback_scorer::fallback_score;
use crate::domain::model::Score;

/// A caption as submitted, in submission order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub player_id: String,
    pub display_name: String,
    pub text: String,
}

/// One entry of raw judge output. Scores are unclamped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JudgedCaption {
    pub display_name: String,
    pub text: String,
    pub humour: i64,
    pub relevance: i64,
    pub roast: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStrategy {
    Positional,
    Exact,
    Normalized,
    NameOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreSource {
    Judge(MatchStrategy),
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciledScore {
    pub player_id: String,
    pub score: Score,
    pub source: ScoreSource,
}

/// Produce one score per submission, in submission order.
pub fn reconcile(submissions: &[Submission], judged: &[JudgedCaption]) -> Vec<ReconciledScore> {
    let normalized: Vec<String> = submissions.iter().map(|s| normalize(&s.text)).collect();
    let mut bound: Vec<Option<(Score, MatchStrategy)>> = vec![None; submissions.len()];

    for (i, result) in judged.iter().enumerate() {
        let Some((idx, strategy)) = find_match(submissions, &normalized, &bound, i, result) else {
            debug!(
                judge_index = i,
                display_name = %result.display_name,
                "Dropping judge result with no matching submission"
            );
            continue;
        };
        let score = Score::clamped(result.humour, result.relevance, result.roast.clone());
        bound[idx] = Some((score, strategy));
    }

    submissions
        .iter()
        .zip(bound)
        .map(|(submission, slot)| match slot {
            Some((score, strategy)) => ReconciledScore {
                player_id: submission.player_id.clone(),
                score,
                source: ScoreSource::Judge(strategy),
            },
            None => ReconciledScore {
                player_id: submission.player_id.clone(),
                score: fallback_score(&submission.text),
                source: ScoreSource::Fallback,
            },
        })
        .collect()
}

/// Score every submission with the fallback scorer.
pub fn fallback_all(submissions: &[Submission]) -> Vec<ReconciledScore> {
    reconcile(submissions, &[])
}

fn find_match(
    submissions: &[Submission],
    normalized: &[String],
    bound: &[Option<(Score, MatchStrategy)>],
    index: usize,
    result: &JudgedCaption,
) -> Option<(usize, MatchStrategy)> {
    let free = |j: &usize| bound[*j].is_none();
    let same_name = |j: &usize| submissions[*j].display_name == result.display_name;

    if index < submissions.len() && free(&index) && same_name(&index) {
        return Some((index, MatchStrategy::Positional));
    }

    let candidates = || (0..submissions.len()).filter(free).filter(same_name);

    if let Some(j) = candidates().find(|j| submissions[*j].text == result.text) {
        return Some((j, MatchStrategy::Exact));
    }

    let wanted = normalize(&result.text);
    if let Some(j) = candidates().find(|j| normalized[*j] == wanted) {
        return Some((j, MatchStrategy::Normalized));
    }

    candidates().next().map(|j| (j, MatchStrategy::NameOnly))
}
