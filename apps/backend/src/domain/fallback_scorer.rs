//! Deterministic caption scorer used whenever the judge cannot be trusted:
//! it is unreachable, times out, returns garbage, or drops a caption.
//!
//! Scores depend only on the caption text (BLAKE3 digest), so identical text
//! scores identically in every process.

use crate::domain::caption_text::word_count;
use crate::domain::model::Score;

const LOW_TIER: &[&str] = &[
    "This caption has the comedic timing of a hairball.",
    "Even the cat looked away.",
    "Did you type this with your paws?",
    "A litter box has more wit.",
    "This is why cats ignore us.",
];

const MID_TIER: &[&str] = &[
    "Purr-fectly average. The cat is unmoved.",
    "Some effort detected. Not much, but some.",
    "The cat blinked slowly. Take that as you will.",
    "It's giving participation ribbon.",
    "Mildly amusing, like a laser pointer with low batteries.",
];

const HIGH_TIER: &[&str] = &[
    "Okay, that one actually got a snort.",
    "The cat approves. Treat yourself.",
    "Certified internet-worthy. Well played.",
];

const HIGH_TIER_MIN_TOTAL: u8 = 14;
const MID_TIER_MIN_TOTAL: u8 = 8;
const SHORT_CAPTION_WORDS: usize = 3;
const LONG_CAPTION_WORDS: usize = 12;

pub fn fallback_score(text: &str) -> Score {
    let digest = blake3::hash(text.as_bytes());
    let bytes = digest.as_bytes();

    let mut humour = bytes[0] % 11;
    let relevance = bytes[1] % 11;

    let words = word_count(text);
    if words < SHORT_CAPTION_WORDS {
        humour = humour.saturating_sub(2);
    } else if words > LONG_CAPTION_WORDS {
        humour = humour.saturating_sub(1);
    }

    let total = humour + relevance;
    let pool = roast_pool(total);
    let roast = pool[usize::from(bytes[2]) % pool.len()];

    Score {
        humour,
        relevance,
        total,
        roast: roast.to_string(),
    }
}

fn roast_pool(total: u8) -> &'static [&'static str] {
    if total >= HIGH_TIER_MIN_TOTAL {
        HIGH_TIER
    } else if total >= MID_TIER_MIN_TOTAL {
        MID_TIER
    } else {
        LOW_TIER
    }
}
