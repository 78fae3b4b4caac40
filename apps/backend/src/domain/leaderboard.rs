//! Cumulative leaderboard, recomputed from stored captions on every read.

use std::collections::HashMap;

use crate::domain::model::{Caption, LeaderboardEntry, Player};

/// Rank players by the sum of their scored caption totals.
///
/// Higher totals rank first; ties keep join order, so the result is stable
/// across calls. Players without scored captions appear with 0. Captions
/// from unknown players are ignored.
pub fn compute_leaderboard(players: &[Player], captions: &[Caption]) -> Vec<LeaderboardEntry> {
    let mut totals: HashMap<&str, u32> = HashMap::with_capacity(players.len());
    for caption in captions {
        if let Some(score) = &caption.score {
            *totals.entry(caption.player_id.as_str()).or_default() += u32::from(score.total);
        }
    }

    let mut ordered: Vec<&Player> = players.iter().collect();
    ordered.sort_by_key(|p| p.join_order);

    let mut entries: Vec<LeaderboardEntry> = ordered
        .into_iter()
        .map(|p| LeaderboardEntry {
            player_id: p.id.clone(),
            display_name: p.display_name.clone(),
            total_score: totals.get(p.id.as_str()).copied().unwrap_or(0),
            rank: 0,
        })
        .collect();

    // sort_by is stable: equal totals stay in join order.
    entries.sort_by(|a, b| b.total_score.cmp(&a.total_score));
    for (idx, entry) in entries.iter_mut().enumerate() {
        entry.rank = idx as u32 + 1;
    }
    entries
}
