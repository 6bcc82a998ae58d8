use std::time::Duration;

use mindora_runner::{STAGE_BADGE_NAMES, STAGE_TOKEN_REWARDS};

/// What completing a stage pays out on the reward service.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RewardTier {
    pub stage: u32,
    pub quest_tokens: u64,
    pub badge_name: String,
}

#[derive(Clone, Debug)]
pub struct SyncConfig {
    /// One tier per stage, stage 1 first.
    pub rewards: Vec<RewardTier>,
    /// How long a successful read is served from cache.
    pub cache_ttl: Duration,
    /// Mint and claim rewards right after a completing session is confirmed.
    pub auto_issue_rewards: bool,
    pub leaderboard_limit: u32,
}

impl Default for SyncConfig {
    fn default() -> Self {
        let rewards = STAGE_TOKEN_REWARDS
            .iter()
            .zip(STAGE_BADGE_NAMES.iter())
            .enumerate()
            .map(|(i, (tokens, badge))| RewardTier {
                stage: i as u32 + 1,
                quest_tokens: *tokens,
                badge_name: (*badge).to_string(),
            })
            .collect();

        Self {
            rewards,
            cache_ttl: Duration::from_secs(30),
            auto_issue_rewards: true,
            leaderboard_limit: 10,
        }
    }
}

impl SyncConfig {
    pub fn stage_count(&self) -> u32 {
        self.rewards.len() as u32
    }

    pub fn reward(&self, stage: u32) -> Option<&RewardTier> {
        self.rewards.iter().find(|tier| tier.stage == stage)
    }

    /// Running totals of `quest_tokens`: a player holding at least
    /// `thresholds[k]` earned tokens has (heuristically) cleared stage k + 1.
    pub fn cumulative_thresholds(&self) -> Vec<u64> {
        self.rewards
            .iter()
            .scan(0u64, |total, tier| {
                *total = total.saturating_add(tier.quest_tokens);
                Some(*total)
            })
            .collect()
    }
}
