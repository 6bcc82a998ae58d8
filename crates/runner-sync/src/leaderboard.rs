//! Per-player leaderboard built from raw session boards.

use std::collections::HashMap;

use crate::model::SessionRecord;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LeaderboardEntry {
    /// 1-based position after aggregation.
    pub rank: u32,
    pub player: String,
    /// Empty until names are filled in.
    pub username: String,
    /// The player's best session.
    pub stage: u32,
    pub score: u64,
    pub coins_collected: u64,
    pub stage_completed: bool,
    pub timestamp: u64,
    /// Across every listed session of the player.
    pub total_coins: u64,
    pub total_games: u32,
}

/// Collapse sessions to one entry per player: the best session (higher
/// score, then more coins) plus game count and coin total, ordered by score
/// then coins of the best session, cut to `limit`.
pub fn aggregate_sessions(sessions: &[SessionRecord], limit: usize) -> Vec<LeaderboardEntry> {
    let mut by_player: HashMap<&str, LeaderboardEntry> = HashMap::new();
    // First-seen order keeps equal entries stable across calls.
    let mut order: Vec<&str> = Vec::new();

    for session in sessions {
        match by_player.get_mut(session.player.as_str()) {
            Some(entry) => {
                entry.total_games += 1;
                entry.total_coins = entry.total_coins.saturating_add(session.coins_collected);
                let better = session.score > entry.score
                    || (session.score == entry.score
                        && session.coins_collected > entry.coins_collected);
                if better {
                    entry.stage = session.stage;
                    entry.score = session.score;
                    entry.coins_collected = session.coins_collected;
                    entry.stage_completed = session.stage_completed;
                    entry.timestamp = session.timestamp;
                }
            }
            None => {
                order.push(session.player.as_str());
                by_player.insert(
                    session.player.as_str(),
                    LeaderboardEntry {
                        rank: 0,
                        player: session.player.clone(),
                        username: String::new(),
                        stage: session.stage,
                        score: session.score,
                        coins_collected: session.coins_collected,
                        stage_completed: session.stage_completed,
                        timestamp: session.timestamp,
                        total_coins: session.coins_collected,
                        total_games: 1,
                    },
                );
            }
        }
    }

    let mut entries: Vec<LeaderboardEntry> = order
        .into_iter()
        .filter_map(|player| by_player.remove(player))
        .collect();
    entries.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then(b.coins_collected.cmp(&a.coins_collected))
    });
    entries.truncate(limit);
    for (i, entry) in entries.iter_mut().enumerate() {
        entry.rank = i as u32 + 1;
    }
    entries
}

/// Name shown for a player: the registered username, or `Player ` plus the
/// last four characters of the address.
pub fn display_name(address: &str, username: &str) -> String {
    let trimmed = username.trim();
    if !trimmed.is_empty() {
        return trimmed.to_string();
    }
    let tail: String = {
        let chars: Vec<char> = address.chars().collect();
        chars[chars.len().saturating_sub(4)..].iter().collect()
    };
    format!("Player {tail}")
}
